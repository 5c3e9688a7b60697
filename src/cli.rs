// src/cli.rs
//! CLI definitions for pkgtools
//!
//! Command implementations live in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pkgtools")]
#[command(version)]
#[command(about = "Install manifest-driven packages onto a system image", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Destination root and catalog location, shared by every command
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Installation root directory
    #[arg(short, long, default_value = "/")]
    pub root: PathBuf,

    /// Path to the catalog database (default: <root>/var/db/pkgtools/catalog.db)
    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

impl TargetArgs {
    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| pkgtools::db::paths::default_db_path(&self.root))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the package catalog
    Init {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Install package files, in the order given
    Install {
        /// Package files (.txz, .tgz, .tzst or .tar)
        #[arg(required = true)]
        packages: Vec<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,

        /// Installer configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Log each step of the install
        #[arg(short, long)]
        verbose: bool,

        /// Debug level; repeat for more detail
        #[arg(short, long, action = clap::ArgAction::Count)]
        debug: u8,
    },

    /// List installed packages
    List {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List the files recorded for an installed package
    Files {
        /// Package name
        name: String,

        #[command(flatten)]
        target: TargetArgs,
    },
}
