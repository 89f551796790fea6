use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::buffer::EmissionCounts;

/// A file skipped during discovery or parsing, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Structured summary returned by a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub files_scanned: u64,
    pub files_parsed: u64,
    pub files_skipped: Vec<SkippedFile>,
    pub nodes_emitted_by_label: BTreeMap<String, u64>,
    pub edges_emitted_by_type: BTreeMap<String, u64>,
    pub unresolved_calls: u64,
    pub unresolved_imports: u64,
    pub duration_ms: u64,
    /// Files that never entered a phase because the run was cancelled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cancelled_files: Vec<String>,
}

impl RunSummary {
    pub fn record_skip(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.files_skipped.push(SkippedFile {
            path: path.into(),
            reason: reason.into(),
        });
    }

    pub fn absorb_counts(&mut self, counts: EmissionCounts) {
        self.nodes_emitted_by_label = counts.nodes_by_label;
        self.edges_emitted_by_type = counts.edges_by_type;
    }

    /// Total nodes emitted across all labels.
    pub fn total_nodes(&self) -> u64 {
        self.nodes_emitted_by_label.values().sum()
    }

    /// Total edges emitted across all types.
    pub fn total_edges(&self) -> u64 {
        self.edges_emitted_by_type.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes() {
        let mut summary = RunSummary::default();
        summary.files_scanned = 3;
        summary.files_parsed = 2;
        summary.record_skip("big.bin", "exceeds max_file_size");
        summary
            .nodes_emitted_by_label
            .insert("Module".to_string(), 2);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"files_scanned\":3"));
        assert!(json.contains("exceeds max_file_size"));
        let parsed: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, summary);
    }

    #[test]
    fn test_totals() {
        let mut summary = RunSummary::default();
        summary.nodes_emitted_by_label.insert("Module".into(), 2);
        summary.nodes_emitted_by_label.insert("Class".into(), 1);
        summary.edges_emitted_by_type.insert("CALLS".into(), 5);
        assert_eq!(summary.total_nodes(), 3);
        assert_eq!(summary.total_edges(), 5);
    }
}
