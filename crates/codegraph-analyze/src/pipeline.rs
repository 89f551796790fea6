//! Pipeline orchestrator.
//!
//! `run(repo_path)` sequences: discovery → structure → parse-and-define
//! (parallel per file) → global import/inheritance fix-up → resolve-calls
//! (parallel per file) → flush. The definition phase completes for every
//! file before any call resolution starts; that barrier is the one
//! non-negotiable ordering constraint in the system.
//!
//! Workers produce into a bounded channel consumed by a single writer thread
//! that owns the buffered sink, so backpressure is natural and the sink's
//! buffers never see concurrent access.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use rayon::prelude::*;

use codegraph_core::buffer::BufferedSink;
use codegraph_core::config::AnalyzerConfig;
use codegraph_core::sink::GraphSink;
use codegraph_core::summary::RunSummary;
use codegraph_core::types::{NodeRecord, RelRecord, SinkError};
use codegraph_parsers::outline::FileOutline;
use codegraph_parsers::registry::ParserRegistry;
use codegraph_parsers::strategy::{all_strategies, LanguageStrategy};
use codegraph_parsers::walker::FileDiscoverer;

use crate::{calls, definitions, dependencies, hierarchy, imports, structure, symbols, AnalyzeError};

/// Cooperative cancellation: stops new files from entering each phase.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum Op {
    Node(NodeRecord),
    Rel(RelRecord),
}

pub struct Analyzer {
    config: AnalyzerConfig,
    registry: ParserRegistry,
    strategies: Vec<Box<dyn LanguageStrategy>>,
    include_globs: Vec<String>,
    cancel: CancellationToken,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let registry = ParserRegistry::load(&config.languages);
        Self {
            config,
            registry,
            strategies: all_strategies(),
            include_globs: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Narrow discovery to paths matching these globs (`--folder-filter`,
    /// `--file-pattern`).
    pub fn with_include_globs(mut self, globs: Vec<String>) -> Self {
        self.include_globs = globs;
        self
    }

    /// Token callers can use to cancel a running analysis.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn strategy(&self, language: &str) -> Option<&dyn LanguageStrategy> {
        self.strategies
            .iter()
            .find(|s| s.language() == language)
            .map(|s| s.as_ref())
    }

    /// Runs the full pipeline against `repo_path`, emitting into `sink`.
    /// Per-file errors land in the summary; only sink failures (and an
    /// unusable repo path) are returned as errors.
    pub fn run<S>(&self, repo_path: &Path, sink: S) -> Result<(RunSummary, S), AnalyzeError>
    where
        S: GraphSink + 'static,
    {
        let started = Instant::now();
        if !repo_path.is_dir() {
            return Err(AnalyzeError::InvalidRepo(repo_path.to_path_buf()));
        }
        let repo_root = repo_path
            .canonicalize()
            .map_err(|_| AnalyzeError::InvalidRepo(repo_path.to_path_buf()))?;
        let project = repo_root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());

        let mut summary = RunSummary::default();

        // Discovery.
        let discovery = FileDiscoverer::new(&repo_root)
            .with_max_file_size(self.config.max_file_size)
            .with_ignore_globs(&self.config.ignore_globs)
            .with_include_globs(&self.include_globs)
            .discover();
        summary.files_scanned = (discovery.files.len() + discovery.skipped.len()) as u64;
        for (path, reason) in &discovery.skipped {
            summary.record_skip(path.to_string_lossy(), reason.clone());
        }
        tracing::info!(
            files = discovery.files.len(),
            languages = ?self.registry.supported(),
            "discovery complete"
        );

        // Structure (no file contents read).
        let plan = structure::build(&project, &repo_root, &discovery, &self.strategies);
        let packages: HashSet<String> = plan
            .nodes
            .iter()
            .filter(|n| n.label == codegraph_core::types::NodeLabel::Package)
            .map(|n| n.key.clone())
            .collect();

        // External dependency manifests.
        let known_externals = dependencies::scan(&repo_root);
        let (dep_nodes, dep_rels) = dependencies::emit(&project, &known_externals);

        // Phase 1: parse and outline, parallel per file.
        enum FileResult {
            Parsed(String, FileOutline),
            Skipped(String, String),
            Cancelled(String),
        }
        let run_phase1 = || {
            plan.modules
                .par_iter()
                .map(|(rel_path, module_qn, language)| {
                    let display_path = rel_path.to_string_lossy().to_string();
                    if self.cancel.is_cancelled() {
                        return FileResult::Cancelled(display_path);
                    }
                    if !self.registry.is_supported(language) {
                        return FileResult::Skipped(
                            display_path,
                            format!("language not loaded: {language}"),
                        );
                    }
                    let Some(strategy) = self.strategy(language) else {
                        return FileResult::Skipped(
                            display_path,
                            format!("no strategy for language: {language}"),
                        );
                    };
                    let source = match std::fs::read_to_string(repo_root.join(rel_path)) {
                        Ok(s) => s,
                        Err(e) => return FileResult::Skipped(display_path, format!("read error: {e}")),
                    };
                    let Some(tree) =
                        self.registry
                            .parse(language, &source, self.config.parse_timeout_ms)
                    else {
                        return FileResult::Skipped(
                            display_path,
                            "parse failed or timed out".to_string(),
                        );
                    };
                    let entry = self.registry.get(language).expect("language is loaded");
                    let outline = strategy.outline(&tree, &source, rel_path, &entry.queries);
                    if outline.had_parse_errors {
                        tracing::debug!(file = %display_path, "partial parse, walking what remains");
                    }
                    FileResult::Parsed(module_qn.clone(), outline)
                })
                .collect::<Vec<_>>()
        };
        let phase1_results = match self.pool()? {
            Some(pool) => pool.install(run_phase1),
            None => run_phase1(),
        };

        let mut outlines: Vec<(String, FileOutline)> = Vec::new();
        for result in phase1_results {
            match result {
                FileResult::Parsed(module_qn, outline) => {
                    summary.files_parsed += 1;
                    outlines.push((module_qn, outline));
                }
                FileResult::Skipped(path, reason) => {
                    tracing::warn!(file = %path, reason = %reason, "file skipped");
                    summary.record_skip(path, reason);
                }
                FileResult::Cancelled(path) => summary.cancelled_files.push(path),
            }
        }

        // Merge definitions, then the global fix-ups. The symbol table is
        // complete and read-only after this block.
        let mut table = symbols::SymbolTable::new(&project);
        for (module_qn, outline) in &outlines {
            definitions::merge_outline(&mut table, module_qn, outline);
        }
        definitions::link_members(&mut table, &self.strategies);
        let import_resolution = imports::resolve_imports(
            &mut table,
            &outlines,
            &packages,
            &known_externals,
            &self.strategies,
        );
        summary.unresolved_imports = import_resolution.unresolved;
        let hierarchy_rels = hierarchy::resolve_hierarchy(&mut table);
        let (def_nodes, def_rels) = definitions::emit_definitions(&table);
        tracing::info!(
            modules = table.modules.len(),
            classes = table.classes.len(),
            "definition phase complete"
        );

        // Writer thread owns the buffered sink; workers feed it through a
        // bounded channel.
        let (tx, rx) = crossbeam_channel::bounded::<Op>(self.config.batch_size.max(1) * 2);
        let batch_size = self.config.batch_size;
        type WriterResult<S> = Result<(S, codegraph_core::buffer::EmissionCounts), SinkError>;
        let writer = std::thread::spawn(move || -> WriterResult<S> {
            let mut buffered = BufferedSink::new(sink, batch_size);
            for op in rx.iter() {
                let result = match op {
                    Op::Node(node) => buffered.ensure_node(node),
                    Op::Rel(rel) => buffered.ensure_relationship(rel),
                };
                if let Err(e) = result {
                    // Final diagnostic flush of whatever is still buffered,
                    // then drain so producers never block on a full channel.
                    buffered.diagnostic_flush();
                    for _ in rx.iter() {}
                    return Err(e);
                }
            }
            buffered.finish()
        });

        // Everything definitional is enqueued before any call resolution
        // starts; within the buffered sink this keeps DEFINES ahead of
        // CALLS for every module.
        let send = |op: Op| {
            // A send error means the writer hit a sink failure and exited;
            // it is surfaced on join.
            let _ = tx.send(op);
        };
        for node in plan.nodes {
            send(Op::Node(node));
        }
        for rel in plan.rels {
            send(Op::Rel(rel));
        }
        for node in dep_nodes {
            send(Op::Node(node));
        }
        for rel in dep_rels {
            send(Op::Rel(rel));
        }
        for node in def_nodes {
            send(Op::Node(node));
        }
        for node in import_resolution.nodes {
            send(Op::Node(node));
        }
        for rel in def_rels {
            send(Op::Rel(rel));
        }
        for rel in import_resolution.rels {
            send(Op::Rel(rel));
        }
        for rel in hierarchy_rels {
            send(Op::Rel(rel));
        }

        // Phase 2: call resolution, parallel per file, table read-only.
        let unresolved_calls = AtomicU64::new(0);
        let cancelled_phase2: Mutex<Vec<String>> = Mutex::new(Vec::new());
        let run_phase2 = || {
            outlines.par_iter().for_each_with(tx.clone(), |tx, (module_qn, outline)| {
                if self.cancel.is_cancelled() {
                    cancelled_phase2
                        .lock()
                        .expect("cancel list lock")
                        .push(outline.rel_path.to_string_lossy().to_string());
                    return;
                }
                let resolution = calls::resolve_calls(&table, module_qn, outline);
                unresolved_calls.fetch_add(resolution.unresolved, Ordering::Relaxed);
                for rel in resolution.rels {
                    let _ = tx.send(Op::Rel(rel));
                }
            });
        };
        match self.pool()? {
            Some(pool) => pool.install(run_phase2),
            None => run_phase2(),
        }
        drop(tx);

        let (sink, counts) = writer.join().expect("sink writer thread panicked")?;
        summary.absorb_counts(counts);
        summary.unresolved_calls = unresolved_calls.into_inner();
        summary
            .cancelled_files
            .extend(cancelled_phase2.into_inner().expect("cancel list lock"));
        summary.cancelled_files.sort();
        summary.cancelled_files.dedup();
        summary.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            nodes = summary.total_nodes(),
            edges = summary.total_edges(),
            unresolved_calls = summary.unresolved_calls,
            duration_ms = summary.duration_ms,
            "run complete"
        );

        Ok((summary, sink))
    }

    fn pool(&self) -> Result<Option<rayon::ThreadPool>, AnalyzeError> {
        if self.config.worker_count == 0 {
            return Ok(None);
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count)
            .build()
            .map(Some)
            .map_err(|e| {
                AnalyzeError::Sink(SinkError::Database(format!("worker pool: {e}")))
            })
    }
}
