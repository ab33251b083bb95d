//! Install command for the gdx CLI.
//!
//! Fetches and prepares the headless runtime and export templates for a
//! version without exporting anything. Useful for warming a CI cache.
//!
//! ## Usage
//!
//! ```bash
//! gdx install --godot-version 4.2.1-stable
//! gdx install --godot-version 4.2.1-stable --mono
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::config::{self, FileConfig, RuntimeArgs, RuntimeSource};
use crate::errors::GdxError;
use crate::toolchain::{RuntimeHandle, prepare_runtime};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Project directory whose gdx.toml supplies defaults.
    #[clap(default_value = ".", env = "GDX_PROJECT")]
    pub project: PathBuf,

    #[clap(flatten)]
    pub runtime: RuntimeArgs,
}

/// Executes the install command.
///
/// Prints the path of the runtime executable on stdout.
///
/// # Errors
///
/// Returns an error if the settings are invalid or any preparation step
/// fails.
pub async fn execute(args: &InstallArgs) -> Result<()> {
    let project = config::project_dir(&args.project)?;
    let file = FileConfig::load(&project)?;
    let base_dir = config::current_dir()?;
    let source = RuntimeSource::resolve(&args.runtime, &file, &base_dir)?;

    let handle = obtain_runtime(&source).await?;
    println!("{}", handle.executable.display());
    Ok(())
}

/// Returns a usable runtime, downloading it first if needed.
///
/// # Errors
///
/// Returns `GdxError::RuntimeNotFound` if an explicitly given executable
/// does not exist, or the error of the failing preparation step.
pub async fn obtain_runtime(source: &RuntimeSource) -> Result<RuntimeHandle, GdxError> {
    match source {
        RuntimeSource::Existing(path) => {
            if !path.is_file() {
                return Err(GdxError::runtime_not_found(path.clone()));
            }
            tracing::info!(executable = %path.display(), "using existing runtime");
            Ok(RuntimeHandle::new(path.clone()))
        }
        RuntimeSource::Release {
            assets,
            source,
            paths,
        } => prepare_runtime(paths, source, assets).await,
    }
}
