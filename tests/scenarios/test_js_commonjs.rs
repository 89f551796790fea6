use codegraph_core::types::{RelKind, Value};

use crate::common::analyze_repo;

#[test]
fn test_commonjs_destructured_import() {
    let (_dir, graph) = analyze_repo(&[
        ("a.js", "exports.read = function(p) {};\n"),
        (
            "b.js",
            "const { read } = require('./a');\nfunction main(p) { read(p); }\n",
        ),
    ]);

    assert!(graph.has_edge(RelKind::Imports, "b", "a"));
    let import = graph
        .sink
        .rels_of_kind(RelKind::Imports)
        .into_iter()
        .find(|r| r.source.key.ends_with(".b"))
        .expect("IMPORTS edge");
    assert_eq!(import.attrs["item"], Value::Str("read".into()));
    assert!(graph.has_edge(RelKind::Calls, "b.main", "a.read"));
}

#[test]
fn test_esm_named_import_call() {
    let (_dir, graph) = analyze_repo(&[
        ("lib.js", "export function parse(s) { return s; }\n"),
        (
            "app.js",
            "import { parse } from './lib';\nfunction run(s) { parse(s); }\n",
        ),
    ]);

    assert!(graph.has_edge(RelKind::Imports, "app", "lib"));
    assert!(graph.has_edge(RelKind::Calls, "app.run", "lib.parse"));
}

#[test]
fn test_prototype_method_and_new_dispatch() {
    let (_dir, graph) = analyze_repo(&[(
        "store.js",
        "class Store {\n  save(k) {}\n}\nfunction main() {\n  const s = new Store();\n  s.save('k');\n}\n",
    )]);

    assert!(graph.has_edge(RelKind::DefinesMethod, "store.Store", "store.Store.save"));
    assert!(graph.has_edge(RelKind::Calls, "store.main", "store.Store.save"));
    // Constructor-less class: the `new` call targets the class itself.
    assert!(graph.has_edge(RelKind::Calls, "store.main", "store.Store"));
}
