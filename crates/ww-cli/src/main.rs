use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ww_cli::commands::{run, show};
use ww_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so shell output stays readable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Run { resume }) => {
            let config = load_config(cli.config.as_deref())?;
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            run::run(stdin.lock(), &mut stdout, &config, *resume)?;
        }
        Some(Commands::Show { json }) => {
            let config = load_config(cli.config.as_deref())?;
            let mut stdout = std::io::stdout();
            show::run(&mut stdout, &config, *json)?;
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
