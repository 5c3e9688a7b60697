// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: catalog database path
fn db_path_arg() -> Arg {
    Arg::new("db_path")
        .long("db-path")
        .value_name("PATH")
        .help("Path to the catalog database (default: <root>/var/db/pkgtools/catalog.db)")
}

/// Common argument: install root directory
fn root_arg() -> Arg {
    Arg::new("root")
        .short('r')
        .long("root")
        .default_value("/")
        .help("Installation root directory")
}

fn build_cli() -> Command {
    Command::new("pkgtools")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Install manifest-driven packages onto a system image")
        .subcommand_required(false)
        .subcommand(
            Command::new("init")
                .about("Create the package catalog")
                .arg(root_arg())
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("install")
                .about("Install package files, in the order given")
                .arg(
                    Arg::new("packages")
                        .required(true)
                        .num_args(1..)
                        .help("Package files (.txz, .tgz, .tzst or .tar)"),
                )
                .arg(root_arg())
                .arg(db_path_arg())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Installer configuration file (TOML)"),
                )
                .arg(
                    Arg::new("verbose")
                        .short('v')
                        .long("verbose")
                        .action(ArgAction::SetTrue)
                        .help("Log each step of the install"),
                )
                .arg(
                    Arg::new("debug")
                        .short('d')
                        .long("debug")
                        .action(ArgAction::Count)
                        .help("Debug level; repeat for more detail"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List installed packages")
                .arg(root_arg())
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("files")
                .about("List the files recorded for an installed package")
                .arg(Arg::new("name").required(true).help("Package name"))
                .arg(root_arg())
                .arg(db_path_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("pkgtools.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
