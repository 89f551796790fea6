//! Shared test helpers for all codegraph integration tests.
//!
//! Import from any integration test file with:
//!   `#[path = "common/mod.rs"] mod common;`

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use codegraph_analyze::pipeline::Analyzer;
use codegraph_core::config::AnalyzerConfig;
use codegraph_core::sink::RecordingSink;
use codegraph_core::summary::RunSummary;
use codegraph_core::types::{NodeLabel, RelKind};

/// A finished analysis over a temp repo, with project-prefix stripping so
/// assertions read like the fixture layout.
pub struct Graph {
    pub summary: RunSummary,
    pub sink: RecordingSink,
    pub project: String,
}

impl Graph {
    fn strip(&self, qn: &str) -> String {
        let prefix = format!("{}.", self.project);
        match qn.strip_prefix(&prefix) {
            Some(rest) => rest.to_string(),
            None if qn == self.project => String::new(),
            None => qn.to_string(),
        }
    }

    /// `(source, target)` pairs for a relationship kind, project-stripped.
    pub fn edges(&self, kind: RelKind) -> Vec<(String, String)> {
        self.sink
            .rels_of_kind(kind)
            .into_iter()
            .map(|r| (self.strip(&r.source.key), self.strip(&r.target.key)))
            .collect()
    }

    #[allow(dead_code)]
    pub fn has_edge(&self, kind: RelKind, source: &str, target: &str) -> bool {
        self.edges(kind)
            .iter()
            .any(|(s, t)| s == source && t == target)
    }

    /// Keys of all nodes with the given label, project-stripped.
    #[allow(dead_code)]
    pub fn node_keys(&self, label: NodeLabel) -> Vec<String> {
        self.sink
            .nodes_with_label(label)
            .into_iter()
            .map(|n| self.strip(&n.key))
            .collect()
    }
}

/// Materializes a fixture repo on disk.
#[allow(dead_code)]
pub fn write_repo(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    dir
}

/// Runs the full pipeline over a repo path with default configuration.
#[allow(dead_code)]
pub fn analyze_path(repo: &Path) -> Graph {
    analyze_path_with(repo, AnalyzerConfig::default())
}

#[allow(dead_code)]
pub fn analyze_path_with(repo: &Path, config: AnalyzerConfig) -> Graph {
    let project = repo
        .canonicalize()
        .unwrap()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();
    let analyzer = Analyzer::new(config);
    let (summary, sink) = analyzer.run(repo, RecordingSink::new()).unwrap();
    Graph {
        summary,
        sink,
        project,
    }
}

/// Fixture + analysis in one step. Returns the TempDir to keep it alive.
#[allow(dead_code)]
pub fn analyze_repo(files: &[(&str, &str)]) -> (TempDir, Graph) {
    let dir = write_repo(files);
    let graph = analyze_path(dir.path());
    (dir, graph)
}
