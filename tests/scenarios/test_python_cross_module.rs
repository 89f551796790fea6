use codegraph_core::types::{NodeLabel, RelKind};

use crate::common::analyze_repo;

#[test]
fn test_python_cross_module_call() {
    let (_dir, graph) = analyze_repo(&[
        ("pkg/__init__.py", ""),
        ("pkg/a.py", "def hello(): pass\n"),
        ("pkg/b.py", "from .a import hello\ndef main(): hello()\n"),
    ]);

    assert!(graph.has_edge(RelKind::Imports, "pkg.b", "pkg.a"));
    assert!(graph.has_edge(RelKind::Calls, "pkg.b.main", "pkg.a.hello"));
    assert!(graph.has_edge(RelKind::Defines, "pkg.a", "pkg.a.hello"));
    assert!(graph.has_edge(RelKind::Defines, "pkg.b", "pkg.b.main"));
    assert_eq!(graph.summary.unresolved_imports, 0);
}

#[test]
fn test_python_import_edge_carries_item() {
    let (_dir, graph) = analyze_repo(&[
        ("pkg/__init__.py", ""),
        ("pkg/a.py", "def hello(): pass\n"),
        ("pkg/b.py", "from .a import hello as hi\ndef main(): hi()\n"),
    ]);

    let import = graph
        .sink
        .rels_of_kind(RelKind::Imports)
        .into_iter()
        .find(|r| r.source.key.ends_with("pkg.b"))
        .expect("IMPORTS edge exists");
    assert_eq!(
        import.attrs["item"],
        codegraph_core::types::Value::Str("hello".into())
    );
    assert_eq!(
        import.attrs["alias"],
        codegraph_core::types::Value::Str("hi".into())
    );
    // The alias still resolves to the original function.
    assert!(graph.has_edge(RelKind::Calls, "pkg.b.main", "pkg.a.hello"));
}

#[test]
fn test_python_wildcard_deferred_lookup() {
    let (_dir, graph) = analyze_repo(&[
        ("m.py", "def helper(): pass\n"),
        ("u.py", "from m import *\ndef use(): helper()\n"),
    ]);

    assert!(graph.has_edge(RelKind::Calls, "u.use", "m.helper"));
}

#[test]
fn test_package_structure_nodes() {
    let (_dir, graph) = analyze_repo(&[
        ("pkg/__init__.py", ""),
        ("pkg/a.py", "def hello(): pass\n"),
    ]);

    assert!(graph.node_keys(NodeLabel::Package).contains(&"pkg".to_string()));
    assert!(graph.node_keys(NodeLabel::Module).contains(&"pkg.a".to_string()));
    assert!(graph
        .node_keys(NodeLabel::File)
        .contains(&"pkg/a.py".to_string()));
}
