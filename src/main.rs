//! layerpak - Buildpack dependency and layer support
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use layerpak::cli::args::{ContributeArgs, FetchArgs, ResolveArgs};
use layerpak::cli::{commands, Cli, Commands};
use layerpak::context::BuildContext;
use layerpak::error::PakResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> PakResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("layerpak=warn"),
        1 => EnvFilter::new("layerpak=info"),
        _ => EnvFilter::new("layerpak=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let command = match cli.command {
        // update-dependency only edits a file and needs no build context
        Commands::UpdateDependency(args) => {
            return commands::update_dependency(args, &cli.buildpack);
        }
        Commands::Resolve(args) => ContextCommand::Resolve(args),
        Commands::Fetch(args) => ContextCommand::Fetch(args),
        Commands::Config => ContextCommand::Config,
        Commands::Contribute(args) => ContextCommand::Contribute(args),
    };

    debug!("Loading buildpack from {}", cli.buildpack.display());
    let context = BuildContext::new(&cli.buildpack, &cli.layers, &cli.platform, cli.stack)?;

    match command {
        ContextCommand::Resolve(args) => commands::resolve(args, &context),
        ContextCommand::Fetch(args) => commands::fetch(args, &context),
        ContextCommand::Config => commands::config(&context),
        ContextCommand::Contribute(args) => commands::contribute(args, &context),
    }
}

/// Subcommands that run against a loaded build context
enum ContextCommand {
    Resolve(ResolveArgs),
    Fetch(FetchArgs),
    Config,
    Contribute(ContributeArgs),
}
