use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sl_cli::commands::analyze::{self, AnalyzeOptions};
use sl_cli::commands::periods;
use sl_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so JSON output on stdout stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Analyze {
            sources,
            json,
            no_charts,
            out_dir,
        }) => {
            let config = load_config(&cli)?;
            let options = AnalyzeOptions {
                json: *json,
                no_charts: *no_charts,
                out_dir: out_dir.clone(),
            };
            analyze::run(&config, sources, &options)?;
        }
        Some(Commands::Periods { sources, json }) => {
            let config = load_config(&cli)?;
            periods::run(&config, sources, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}
