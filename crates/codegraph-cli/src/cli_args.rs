use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "codegraph", version, about = "Code knowledge graph extraction")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging (debug-level diagnostics)
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Analyze a repository and emit its code knowledge graph
    Analyze {
        /// Repository root to analyze
        repo: PathBuf,

        /// Drop the previous snapshot before running
        #[arg(long)]
        clean: bool,

        /// Restrict analysis to folders matching this glob (repeatable)
        #[arg(long = "folder-filter")]
        folder_filter: Vec<String>,

        /// Restrict analysis to files matching this glob (repeatable)
        #[arg(long = "file-pattern")]
        file_pattern: Vec<String>,

        /// Path of the bundled sink database
        #[arg(long, default_value = ".codegraph/graph.db")]
        db: PathBuf,
    },
}
