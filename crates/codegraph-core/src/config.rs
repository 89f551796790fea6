//! Configuration file loading for codegraph.
//!
//! Reads `.codegraph/codegraph.json` and provides typed access to all
//! settings. Falls back to sensible defaults when the config file is missing
//! or incomplete.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// User-supplied ignore globs, applied on top of the static ignore list.
    #[serde(default)]
    pub ignore_globs: Vec<String>,

    /// Files larger than this (bytes) are skipped.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Per-file parse timeout. Timed-out files are skipped with a diagnostic.
    #[serde(default = "default_parse_timeout_ms")]
    pub parse_timeout_ms: u64,

    /// Worker pool size for the parallel phases. 0 means one per core.
    #[serde(default)]
    pub worker_count: usize,

    /// Sink batch size in operations.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Which languages to analyze: the literal `"all"` or an explicit list.
    #[serde(default)]
    pub languages: LanguageFilter,
}

/// Language selection: `"all"` or an explicit list of language ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguageFilter {
    Keyword(String),
    List(Vec<String>),
}

impl Default for LanguageFilter {
    fn default() -> Self {
        LanguageFilter::Keyword("all".to_string())
    }
}

impl LanguageFilter {
    /// Whether the given language id is enabled under this filter.
    pub fn is_enabled(&self, language: &str) -> bool {
        match self {
            LanguageFilter::Keyword(kw) => kw == "all",
            LanguageFilter::List(list) => list.iter().any(|l| l == language),
        }
    }
}

fn default_max_file_size() -> u64 {
    1_048_576
}
fn default_parse_timeout_ms() -> u64 {
    30_000
}
fn default_batch_size() -> usize {
    1_000
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ignore_globs: vec![],
            max_file_size: default_max_file_size(),
            parse_timeout_ms: default_parse_timeout_ms(),
            worker_count: 0,
            batch_size: default_batch_size(),
            languages: LanguageFilter::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from `.codegraph/codegraph.json` under the repo
    /// root. Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load(repo_root: &Path) -> Self {
        let config_path = repo_root.join(".codegraph").join("codegraph.json");
        let content = match std::fs::read_to_string(&config_path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Self::default()
            }
        }
    }
}
