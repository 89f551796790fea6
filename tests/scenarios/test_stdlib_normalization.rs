use codegraph_core::types::{NodeLabel, RelKind};

use crate::common::analyze_repo;

#[test]
fn test_rust_std_import_truncated_to_module() {
    let (_dir, graph) = analyze_repo(&[(
        "f.rs",
        "use std::collections::HashMap;\n\nfn f() {\n    let _m: HashMap<i32, i32> = HashMap::new();\n}\n",
    )]);

    let imports = graph.edges(RelKind::Imports);
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].1, "std.collections");
    let target = graph
        .sink
        .rels_of_kind(RelKind::Imports)[0]
        .target
        .clone();
    assert_eq!(target.label, NodeLabel::ExternalPackage);
    // External call: no CALLS edge asserted either way for HashMap::new.
    assert_eq!(graph.summary.unresolved_imports, 0);
}

#[test]
fn test_node_builtin_kept_at_root() {
    let (_dir, graph) = analyze_repo(&[(
        "io.js",
        "const fs = require('fs');\nfunction read(p) { fs.readFile(p); }\n",
    )]);

    let imports = graph.edges(RelKind::Imports);
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].1, "fs");
}

#[test]
fn test_lua_builtin_suffix_truncated() {
    let (_dir, graph) = analyze_repo(&[(
        "up.lua",
        "local upper = require('string.upper')\nlocal function shout(s)\n    return upper(s)\nend\n",
    )]);

    let imports = graph.edges(RelKind::Imports);
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].1, "string");
}

#[test]
fn test_java_util_wildcard_normalized() {
    let (_dir, graph) = analyze_repo(&[(
        "App.java",
        "import java.util.concurrent.Executors;\n\nclass App {\n    void run() {}\n}\n",
    )]);

    let imports = graph.edges(RelKind::Imports);
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].1, "java.util");
}

#[test]
fn test_no_imports_edge_target_carries_entity_suffix() {
    // Invariant: for every language, an IMPORTS target never ends in an
    // entity name (no trailing `.TypeName` past the stdlib module root).
    let (_dir, graph) = analyze_repo(&[
        ("a.rs", "use std::collections::HashMap;\nfn f() {}\n"),
        ("b.py", "import os.path\ndef g(): pass\n"),
        ("c.js", "const { join } = require('path');\nfunction h() {}\n"),
    ]);

    for (_, target) in graph.edges(RelKind::Imports) {
        let last = target.rsplit('.').next().unwrap();
        assert!(
            !last.chars().next().unwrap().is_ascii_uppercase(),
            "IMPORTS target {target} ends in an entity suffix"
        );
    }
}
