//! The codegraph analysis pipeline.
//!
//! Turns a repository into nodes and edges on a [`GraphSink`]:
//!
//! 1. [`structure`] — project/package/folder/file/module skeleton
//! 2. [`definitions`] — per-file outlines merged into the [`symbols`] table
//! 3. [`imports`] — local-name → qualified-name bindings per module
//! 4. [`hierarchy`] — inheritance resolution, override detection, cycle
//!    rejection
//! 5. [`calls`] — call-site resolution through the [`tracker`]
//!
//! [`pipeline::Analyzer`] sequences the phases; the definition phase
//! completes for every file before any call resolution starts.
//!
//! [`GraphSink`]: codegraph_core::sink::GraphSink

pub mod calls;
pub mod definitions;
pub mod dependencies;
pub mod hierarchy;
pub mod imports;
pub mod pipeline;
pub mod structure;
pub mod symbols;
pub mod tracker;

/// Errors surfaced by the pipeline. Everything except sink failures and an
/// unusable repo path is recovered per-file and reported in the summary.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("repository path is not a directory: {0}")]
    InvalidRepo(std::path::PathBuf),

    #[error(transparent)]
    Sink(#[from] codegraph_core::types::SinkError),
}
