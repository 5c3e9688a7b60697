// src/main.rs

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use pkgtools::config::InstallerConfig;
use std::path::Path;

fn load_config(path: Option<&Path>) -> Result<InstallerConfig> {
    match path {
        Some(path) => InstallerConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(InstallerConfig::default()),
    }
}

fn init_tracing(config: &InstallerConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_directive())),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { target }) => {
            init_tracing(&InstallerConfig::default());
            commands::cmd_init(&target.db_path())
        }
        Some(Commands::Install {
            packages,
            target,
            config,
            verbose,
            debug,
        }) => {
            let mut config = load_config(config.as_deref())?;
            config.verbose |= verbose;
            config.debug = config.debug.max(debug);
            init_tracing(&config);
            commands::cmd_install(&packages, &target.root, &target.db_path(), &config)
        }
        Some(Commands::List { target }) => {
            init_tracing(&InstallerConfig::default());
            commands::cmd_list(&target.db_path())
        }
        Some(Commands::Files { name, target }) => {
            init_tracing(&InstallerConfig::default());
            commands::cmd_files(&name, &target.db_path())
        }
        None => {
            println!("pkgtools {}", env!("CARGO_PKG_VERSION"));
            println!("Run 'pkgtools --help' for usage information");
            Ok(())
        }
    }
}
