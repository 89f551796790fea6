use std::collections::BTreeSet;

use codegraph_core::config::AnalyzerConfig;
use codegraph_core::types::{NodeRecord, RelRecord};

use crate::common::{analyze_path_with, write_repo, Graph};

const FIXTURE: &[(&str, &str)] = &[
    ("pkg/__init__.py", ""),
    (
        "pkg/a.py",
        "class Base:\n    def run(self): pass\nclass Child(Base):\n    def run(self): pass\ndef hello(): pass\n",
    ),
    (
        "pkg/b.py",
        "from .a import hello, Child\ndef main():\n    hello()\n    c = Child()\n    c.run()\n",
    ),
    (
        "src/lib.rs",
        "struct S;\nimpl S {\n    fn go(&self) {}\n}\nfn start(s: &S) { s.go(); }\n",
    ),
    (
        "web/app.js",
        "const { hello } = require('./util');\nfunction main() { hello(); }\n",
    ),
    ("web/util.js", "exports.hello = function() {};\n"),
];

fn node_set(graph: &Graph) -> BTreeSet<String> {
    graph
        .sink
        .nodes
        .iter()
        .map(|n: &NodeRecord| format!("{}|{}", n.label, n.key))
        .collect()
}

fn edge_set(graph: &Graph) -> BTreeSet<String> {
    graph
        .sink
        .relationships
        .iter()
        .map(|r: &RelRecord| {
            format!(
                "{}|{}|{}|{}|{}",
                r.source.label, r.source.key, r.kind, r.target.label, r.target.key
            )
        })
        .collect()
}

#[test]
fn test_same_input_same_emission_set() {
    let dir = write_repo(FIXTURE);
    let first = analyze_path_with(dir.path(), AnalyzerConfig::default());
    let second = analyze_path_with(dir.path(), AnalyzerConfig::default());

    assert_eq!(node_set(&first), node_set(&second));
    assert_eq!(edge_set(&first), edge_set(&second));
    assert_eq!(
        first.summary.nodes_emitted_by_label,
        second.summary.nodes_emitted_by_label
    );
    assert_eq!(
        first.summary.edges_emitted_by_type,
        second.summary.edges_emitted_by_type
    );
}

#[test]
fn test_worker_count_does_not_change_emission_set() {
    let dir = write_repo(FIXTURE);
    let serial = {
        let mut config = AnalyzerConfig::default();
        config.worker_count = 1;
        analyze_path_with(dir.path(), config)
    };
    let parallel = {
        let mut config = AnalyzerConfig::default();
        config.worker_count = 4;
        analyze_path_with(dir.path(), config)
    };

    assert_eq!(node_set(&serial), node_set(&parallel));
    assert_eq!(edge_set(&serial), edge_set(&parallel));
}

#[test]
fn test_identifier_rename_preserves_edge_counts() {
    let dir = write_repo(FIXTURE);
    let original = analyze_path_with(dir.path(), AnalyzerConfig::default());

    let renamed_fixture: Vec<(String, String)> = FIXTURE
        .iter()
        .map(|(path, content)| {
            (
                path.to_string(),
                content.replace("hello", "greet").replace("run", "exec"),
            )
        })
        .collect();
    let renamed_refs: Vec<(&str, &str)> = renamed_fixture
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect();
    let dir2 = write_repo(&renamed_refs);
    let renamed = analyze_path_with(dir2.path(), AnalyzerConfig::default());

    assert_eq!(
        original.summary.edges_emitted_by_type,
        renamed.summary.edges_emitted_by_type
    );
    assert_eq!(
        original.summary.nodes_emitted_by_label,
        renamed.summary.nodes_emitted_by_label
    );
}

#[test]
fn test_small_batch_size_equivalent() {
    let dir = write_repo(FIXTURE);
    let default = analyze_path_with(dir.path(), AnalyzerConfig::default());
    let tiny = {
        let mut config = AnalyzerConfig::default();
        config.batch_size = 2;
        analyze_path_with(dir.path(), config)
    };

    assert_eq!(node_set(&default), node_set(&tiny));
    assert_eq!(edge_set(&default), edge_set(&tiny));
}
