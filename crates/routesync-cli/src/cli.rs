use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Route-based file sync between repositories
///
/// Map files from a source repository into a target repository with ordered
/// glob rules, preview the differences and apply them.
#[derive(Parser, Debug)]
#[command(name = "routesync")]
#[command(about, long_about = None, version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use specific config file
    #[arg(long, global = true, value_name = "PATH", env = "ROUTESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for sync records (default: <config dir>/.routesync/state)
    #[arg(long, global = true, value_name = "PATH")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured routes
    Routes,

    /// Show which source files map to which target paths
    Mapping {
        /// Route identifier
        route: String,
    },

    /// Show what applying a route would change
    Diff {
        /// Route identifier
        route: String,

        /// Print line hunks for modified text files
        #[arg(long)]
        hunks: bool,

        /// Include unchanged entries
        #[arg(long)]
        all: bool,
    },

    /// Apply a route to its target repository
    Apply {
        /// Route identifier
        route: String,

        /// Accept all entries without prompting
        #[arg(long)]
        yes_all: bool,

        /// Preview what would be applied without writing
        #[arg(long)]
        dry_run: bool,

        /// Apply only these target paths (repeatable)
        #[arg(long, value_name = "PATH")]
        only: Vec<String>,

        /// Apply even though several sources map to the same target
        #[arg(long)]
        ack_conflicts: bool,
    },

    /// List files in a repository matching a glob
    TestGlob {
        /// Repository identifier
        repo: String,

        /// Glob relative to the repository root
        pattern: String,
    },

    /// Explain which rule handles a source path
    Explain {
        /// Route identifier
        route: String,

        /// Source path relative to the source repository
        path: String,
    },
}
