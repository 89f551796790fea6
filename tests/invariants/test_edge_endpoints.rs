use std::collections::HashSet;

use codegraph_core::types::{NodeLabel, RelKind};

use crate::common::analyze_repo;

#[test]
fn test_defines_method_links_class_to_method() {
    let (_dir, graph) = analyze_repo(&[
        (
            "a.py",
            "class C:\n    def m(self): pass\n",
        ),
        (
            "s.lua",
            "local T = {}\nfunction T:go()\nend\n",
        ),
    ]);

    let method_edges = graph.sink.rels_of_kind(RelKind::DefinesMethod);
    assert!(!method_edges.is_empty());
    for edge in method_edges {
        assert_eq!(edge.source.label, NodeLabel::Class);
        assert_eq!(edge.target.label, NodeLabel::Method);
    }
}

#[test]
fn test_defines_source_is_module_or_class() {
    let (_dir, graph) = analyze_repo(&[(
        "a.py",
        "class C:\n    class Inner:\n        pass\ndef f():\n    def g(): pass\n",
    )]);

    for edge in graph.sink.rels_of_kind(RelKind::Defines) {
        assert!(
            matches!(edge.source.label, NodeLabel::Module | NodeLabel::Class),
            "DEFINES source {:?} is not Module/Class",
            edge.source
        );
    }
}

#[test]
fn test_calls_never_dangle() {
    let (_dir, graph) = analyze_repo(&[
        ("pkg/__init__.py", ""),
        ("pkg/a.py", "def hello(): pass\n"),
        (
            "pkg/b.py",
            "from .a import hello\ndef main():\n    hello()\n    unknown_fn()\n    obj.whatever()\n",
        ),
    ]);

    let node_ids: HashSet<(NodeLabel, &str)> = graph
        .sink
        .nodes
        .iter()
        .map(|n| (n.label, n.key.as_str()))
        .collect();

    let calls = graph.sink.rels_of_kind(RelKind::Calls);
    assert!(!calls.is_empty());
    for edge in &calls {
        assert!(
            node_ids.contains(&(edge.source.label, edge.source.key.as_str())),
            "dangling CALLS source {:?}",
            edge.source
        );
        assert!(
            node_ids.contains(&(edge.target.label, edge.target.key.as_str())),
            "dangling CALLS target {:?}",
            edge.target
        );
    }
    // The two unresolvable sites were dropped and counted.
    assert_eq!(graph.summary.unresolved_calls, 2);
}

#[test]
fn test_inheritance_cycle_rejected_at_emission() {
    let (_dir, graph) = analyze_repo(&[(
        "a.py",
        "class A(B):\n    pass\nclass B(A):\n    pass\n",
    )]);

    let inherits = graph.sink.rels_of_kind(RelKind::Inherits);
    assert_eq!(inherits.len(), 1, "cycle-closing edge must be refused");
}

#[test]
fn test_overrides_child_redeclaration() {
    let (_dir, graph) = analyze_repo(&[(
        "a.py",
        "class Base:\n    def run(self): pass\nclass Child(Base):\n    def run(self): pass\n",
    )]);

    assert!(graph.has_edge(RelKind::Overrides, "a.Child.run", "a.Base.run"));
}
