//! Presets command for the gdx CLI.
//!
//! Lists the export presets `gdx export` would process, in order, as
//! tab-separated `name`, `platform`, `export path` lines.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::config;
use crate::export::{ExportTarget, load_presets};

/// Arguments for the presets command.
#[derive(Args)]
pub struct PresetsArgs {
    /// Godot project directory containing export_presets.cfg.
    #[clap(default_value = ".", env = "GDX_PROJECT")]
    pub project: PathBuf,
}

/// Executes the presets command.
///
/// # Errors
///
/// Returns an error if the project directory or its export configuration
/// is missing or invalid.
pub fn execute(args: &PresetsArgs) -> Result<()> {
    let project = config::project_dir(&args.project)?;
    for target in load_presets(&project)? {
        println!("{}", format_target(&target));
    }
    Ok(())
}

fn format_target(target: &ExportTarget) -> String {
    format!(
        "{}\t{}\t{}",
        target.name,
        target.platform,
        target.export_path.display()
    )
}
