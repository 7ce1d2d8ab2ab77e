mod cli;
mod commands;
mod config;
mod interactive;
mod logging;
mod state;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use commands::{ApplyOptions, GlobalOptions, Session};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\n\nInterrupted by user (Ctrl+C)");
        std::process::exit(130);
    })
    .context("Failed to set Ctrl+C handler")?;

    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let options = GlobalOptions::new(cli.verbose, cli.config.as_deref(), cli.state_dir.as_deref());
    let session = Session::open(&options).context("Failed to load configuration")?;

    match &cli.command {
        Commands::Routes => {
            commands::Routes::execute(&session, options.verbose)
                .context("Failed to execute routes command")?;
        }
        Commands::Mapping { route } => {
            commands::Mapping::execute(&session, route)
                .context("Failed to execute mapping command")?;
        }
        Commands::Diff { route, hunks, all } => {
            commands::Diff::execute(&session, route, *hunks, *all)
                .context("Failed to execute diff command")?;
        }
        Commands::Apply {
            route,
            yes_all,
            dry_run,
            only,
            ack_conflicts,
        } => {
            let apply_options = ApplyOptions {
                yes_all: *yes_all,
                dry_run: *dry_run,
                only,
                ack_conflicts: *ack_conflicts,
            };
            let success = commands::Apply::execute(&session, route, &apply_options)
                .context("Failed to execute apply command")?;
            if !success {
                std::process::exit(1);
            }
        }
        Commands::TestGlob { repo, pattern } => {
            commands::TestGlob::execute(&session, repo, pattern)
                .context("Failed to execute test-glob command")?;
        }
        Commands::Explain { route, path } => {
            commands::Explain::execute(&session, route, path)
                .context("Failed to execute explain command")?;
        }
    }

    Ok(())
}
