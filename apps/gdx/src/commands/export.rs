//! Export command for the gdx CLI.
//!
//! Runs the whole pipeline: prepare the runtime, export every preset in
//! `export_presets.cfg`, package each output directory, and print the
//! comma-separated artifact paths on stdout.
//!
//! ## Usage
//!
//! ```bash
//! gdx export --godot-version 4.2.1-stable
//! gdx export path/to/project --godot /usr/local/bin/godot --debug
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::install::obtain_runtime;
use crate::config::{self, ExportOptions, FileConfig, RuntimeArgs, RuntimeSource};
use crate::errors::GdxError;
use crate::export::{GodotRunner, Orchestrator, join_artifact_paths, load_presets};
use crate::report;

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Godot project directory containing export_presets.cfg.
    #[clap(default_value = ".", env = "GDX_PROJECT")]
    pub project: PathBuf,

    #[clap(flatten)]
    pub runtime: RuntimeArgs,

    /// Export with --export-debug instead of --export.
    #[clap(long)]
    pub debug: bool,

    /// Keep the exported files next to the archive built from them.
    #[clap(long)]
    pub keep_sources: bool,

    /// Append `artifacts=<list>` to this file.
    #[clap(long, env = "GITHUB_OUTPUT")]
    pub output_file: Option<PathBuf>,
}

/// Executes the export command.
///
/// # Process
///
/// 1. Resolve settings and read the export presets
/// 2. Locate or prepare the runtime
/// 3. Export and package each preset in order, stopping at the first failure
/// 4. Print the artifact list and append it to the output file, if any
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the runtime cannot be
/// prepared, or any preset fails. Artifacts packaged before a failure stay
/// on disk but are not reported on stdout.
pub async fn execute(args: &ExportArgs) -> Result<()> {
    let project = config::project_dir(&args.project)?;
    let file = FileConfig::load(&project)?;
    let base_dir = config::current_dir()?;
    let source = RuntimeSource::resolve(&args.runtime, &file, &base_dir)?;
    let options = ExportOptions::resolve(args.debug, args.keep_sources, &file);

    let targets = load_presets(&project)?;
    if targets.is_empty() {
        return Err(GdxError::config_error(format!(
            "{} defines no export presets",
            project.display()
        ))
        .into());
    }
    tracing::info!(project = %project.display(), presets = targets.len(), "loaded export presets");

    let runtime = obtain_runtime(&source).await?;
    let orchestrator = Orchestrator::new(
        project,
        GodotRunner::new(runtime, options.mode),
        options.cleanup,
    );

    let result = tokio::task::spawn_blocking(move || orchestrator.run(&targets))
        .await
        .context("Export task panicked")?;

    if let Some(failure) = &result.failure {
        for path in result.artifact_paths() {
            tracing::warn!(artifact = %path.display(), "packaged before the failure");
        }
        tracing::error!(
            preset = %failure.target.name,
            platform = %failure.target.platform,
            export_path = %failure.target.export_path.display(),
            "stopping after failed preset"
        );
    }
    let outcomes = result.into_result()?;

    let paths: Vec<&Path> = outcomes.iter().map(|o| o.artifact_path.as_path()).collect();
    let list = join_artifact_paths(&paths);
    println!("{list}");

    if let Some(output_file) = &args.output_file {
        report::append_output(output_file, &list)?;
        tracing::debug!(file = %output_file.display(), "wrote artifact list");
    }
    Ok(())
}
