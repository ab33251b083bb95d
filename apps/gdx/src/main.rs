#![warn(clippy::pedantic)]

//! # gdx
//!
//! Exports a Godot project for every preset in its `export_presets.cfg`
//! and packages each platform's output into a single artifact, ready to be
//! attached to a release.
//!
//! ## Subcommands
//!
//! - `export` - Prepare the runtime, export every preset, package the results
//! - `install` - Prepare the runtime and export templates only
//! - `presets` - List the export presets of a project
//! - `version` - Display version information
//!
//! ## Output
//!
//! `gdx export` prints the comma-separated artifact paths on stdout and
//! nothing else. Progress and the runtime's own output go to stderr.
//!
//! ## Examples
//!
//! Export with a downloaded runtime:
//! ```bash
//! gdx export --godot-version 4.2.1-stable
//! ```
//!
//! Export with a runtime that is already installed:
//! ```bash
//! gdx export path/to/project --godot /usr/local/bin/godot
//! ```

mod commands;
mod config;
mod errors;
mod export;
mod logging;
mod report;
mod toolchain;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{export as export_cmd, install, presets, version};

/// Godot export and packaging pipeline.
#[derive(Parser)]
#[command(
    name = "gdx",
    author,
    version,
    about = "Export a Godot project for every preset and package the results",
    after_help = "\
CONFIGURATION:
    Settings are taken from, in order of priority:
    1. Command line flags
    2. Environment variables
    3. gdx.toml in the project directory
    4. Built-in defaults

ENVIRONMENT VARIABLES:
    GDX_LOG                 Log filter (e.g. gdx=debug)
    GDX_GODOT_VERSION       Godot version to export with
    GDX_MONO                Use the mono runtime and templates
    GDX_PROJECT             Project directory
    GDX_WORK_DIR            Download and runtime directory (default: .gdx)
    GDX_TEMPLATES_DIR       Export templates directory
    GDX_RELEASE_API         Release API base URL (default: https://api.github.com)
    GODOT_PATH              Existing Godot executable; skips the download
    GITHUB_OUTPUT           File the artifact list is appended to"
)]
pub struct Cli {
    /// Increase log detail (-v debug, -vv trace).
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the gdx CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Export every preset and package the results.
    ///
    /// Prepares the runtime (unless --godot is given), runs one export per
    /// preset in file order, stops at the first failure, and prints the
    /// artifact paths.
    Export(export_cmd::ExportArgs),

    /// Prepare the runtime and export templates.
    ///
    /// Downloads and extracts the headless runtime and the export templates
    /// for a version, then prints the runtime path.
    Install(install::InstallArgs),

    /// List the export presets of a project.
    Presets(presets::PresetsArgs),

    /// Display version information.
    Version,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        std::process::exit(handle_error(&e));
    }
}

/// Prints the error chain and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Export(args) => export_cmd::execute(&args).await,
        Commands::Install(args) => install::execute(&args).await,
        Commands::Presets(args) => presets::execute(&args),
        Commands::Version => version::execute(cli.verbose > 0),
    }
}
