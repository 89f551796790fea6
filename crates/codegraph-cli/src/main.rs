//! codegraph CLI — code knowledge graph extraction.
//!
//! `codegraph analyze <repo>` runs the full pipeline against a repository
//! and writes the graph into the bundled SQLite sink. Exit codes: 0 on
//! success, 1 on sink failure, 2 on invalid arguments.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use codegraph_analyze::pipeline::Analyzer;
use codegraph_analyze::AnalyzeError;
use codegraph_core::config::AnalyzerConfig;
use codegraph_core::sqlite::SqliteSink;
use codegraph_core::summary::RunSummary;

mod cli_args;

use cli_args::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("codegraph={default_level}"))),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Analyze {
            repo,
            clean,
            folder_filter,
            file_pattern,
            db,
        } => run_analyze(&repo, clean, folder_filter, file_pattern, &db, cli.json),
    };

    std::process::exit(exit_code);
}

fn run_analyze(
    repo: &std::path::Path,
    clean: bool,
    folder_filter: Vec<String>,
    file_pattern: Vec<String>,
    db: &std::path::Path,
    json: bool,
) -> i32 {
    let config = AnalyzerConfig::load(repo);

    // Folder filters become recursive include globs; file patterns pass
    // through as written.
    let mut include_globs: Vec<String> = folder_filter
        .into_iter()
        .map(|f| {
            let f = f.trim_end_matches('/');
            format!("{f}/**")
        })
        .collect();
    include_globs.extend(file_pattern);

    if clean {
        if let Err(e) = SqliteSink::clean(db) {
            eprintln!("codegraph: failed to clean {}: {e}", db.display());
            return 1;
        }
    }
    if let Some(parent) = db.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("codegraph: failed to create {}: {e}", parent.display());
                return 1;
            }
        }
    }
    let sink = match SqliteSink::open(db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("codegraph: failed to open sink {}: {e}", db.display());
            return 1;
        }
    };

    let analyzer = Analyzer::new(config).with_include_globs(include_globs);
    match analyzer.run(repo, sink) {
        Ok((summary, _)) => {
            print_summary(&summary, json);
            0
        }
        Err(AnalyzeError::InvalidRepo(path)) => {
            eprintln!("codegraph: not a repository directory: {}", path.display());
            2
        }
        Err(AnalyzeError::Sink(e)) => {
            eprintln!("codegraph: sink failure: {e}");
            1
        }
    }
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(out) => println!("{out}"),
            Err(e) => eprintln!("codegraph: summary serialization failed: {e}"),
        }
        return;
    }
    println!(
        "scanned {} files, parsed {}, skipped {}",
        summary.files_scanned,
        summary.files_parsed,
        summary.files_skipped.len()
    );
    for skip in &summary.files_skipped {
        println!("  skipped {} ({})", skip.path, skip.reason);
    }
    println!(
        "emitted {} nodes, {} edges in {} ms",
        summary.total_nodes(),
        summary.total_edges(),
        summary.duration_ms
    );
    for (label, count) in &summary.nodes_emitted_by_label {
        println!("  {label}: {count}");
    }
    for (kind, count) in &summary.edges_emitted_by_type {
        println!("  {kind}: {count}");
    }
    if summary.unresolved_calls > 0 || summary.unresolved_imports > 0 {
        println!(
            "unresolved: {} calls, {} imports",
            summary.unresolved_calls, summary.unresolved_imports
        );
    }
    if !summary.cancelled_files.is_empty() {
        println!("cancelled before completion: {} files", summary.cancelled_files.len());
    }
}
