use std::collections::{HashMap, HashSet};

use codegraph_core::types::NodeLabel;

use crate::common::{analyze_repo, Graph};

fn mixed_repo() -> (tempfile::TempDir, Graph) {
    analyze_repo(&[
        ("pkg/__init__.py", ""),
        (
            "pkg/a.py",
            "class Base:\n    def run(self): pass\nclass Child(Base):\n    def run(self): pass\n",
        ),
        (
            "pkg/b.py",
            "from .a import Child\ndef main():\n    c = Child()\n    c.run()\n",
        ),
        ("tools/fmt.lua", "local M = {}\nfunction M:indent(s)\nend\nreturn M\n"),
        (
            "src/lib.rs",
            "struct S;\nimpl S {\n    fn go(&self) {}\n}\nfn start(s: &S) { s.go(); }\n",
        ),
    ])
}

#[test]
fn test_every_non_project_node_has_exactly_one_parent() {
    let (_dir, graph) = mixed_repo();

    // ExternalPackage hangs off DEPENDS_ON_EXTERNAL / IMPORTS, not the
    // containment chain.
    let containment: Vec<_> = graph
        .sink
        .relationships
        .iter()
        .filter(|r| r.kind.is_containment())
        .collect();

    for node in &graph.sink.nodes {
        if matches!(node.label, NodeLabel::Project | NodeLabel::ExternalPackage) {
            continue;
        }
        let parents = containment
            .iter()
            .filter(|r| r.target.label == node.label && r.target.key == node.key)
            .count();
        assert_eq!(
            parents, 1,
            "node {:?} {} has {} containment parents",
            node.label, node.key, parents
        );
    }
}

#[test]
fn test_parent_chains_terminate_at_the_project() {
    let (_dir, graph) = mixed_repo();

    let mut parent_of: HashMap<(NodeLabel, &str), (NodeLabel, &str)> = HashMap::new();
    for r in &graph.sink.relationships {
        if r.kind.is_containment() {
            parent_of.insert(
                (r.target.label, r.target.key.as_str()),
                (r.source.label, r.source.key.as_str()),
            );
        }
    }

    for node in &graph.sink.nodes {
        if matches!(node.label, NodeLabel::Project | NodeLabel::ExternalPackage) {
            continue;
        }
        let mut current = (node.label, node.key.as_str());
        let mut hops = 0;
        let mut seen = HashSet::new();
        while current.0 != NodeLabel::Project {
            assert!(seen.insert(current), "containment cycle at {current:?}");
            current = *parent_of
                .get(&current)
                .unwrap_or_else(|| panic!("no parent for {current:?}"));
            hops += 1;
            assert!(hops < 64, "runaway parent chain from {:?}", node.key);
        }
    }
}

#[test]
fn test_qualified_names_concatenate_along_the_chain() {
    let (_dir, graph) = mixed_repo();

    for r in &graph.sink.relationships {
        let joins = matches!(
            r.kind,
            codegraph_core::types::RelKind::Defines
                | codegraph_core::types::RelKind::DefinesMethod
                | codegraph_core::types::RelKind::ContainsSubpackage
        );
        if !joins {
            continue;
        }
        assert!(
            r.target.key.starts_with(&r.source.key),
            "{:?}: target {} does not extend source {}",
            r.kind,
            r.target.key,
            r.source.key
        );
        let tail = &r.target.key[r.source.key.len()..];
        assert!(
            tail.starts_with('.') || tail.starts_with(':'),
            "{:?}: {} is not a single-segment extension of {}",
            r.kind,
            r.target.key,
            r.source.key
        );
    }
}
