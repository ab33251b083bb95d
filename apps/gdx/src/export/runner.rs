//! Invoking the runtime for a single export preset.

use std::path::Path;
use std::process::{Command, Stdio};

use super::target::ExportTarget;
use crate::errors::GdxError;
use crate::toolchain::RuntimeHandle;

/// Runs one export to completion.
///
/// Implementations block until the export has finished and report failure
/// as `GdxError::ExportFailed`.
pub trait ExportRunner {
    /// Exports `target` from `project_dir` to `export_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the export could not be started or did not succeed.
    fn export(
        &self,
        project_dir: &Path,
        target: &ExportTarget,
        export_file: &Path,
    ) -> Result<(), GdxError>;
}

/// Which export flag the runtime receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// `--export`
    #[default]
    Release,
    /// `--export-debug`
    Debug,
}

impl ExportMode {
    /// Command line flag selecting this mode.
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Self::Release => "--export",
            Self::Debug => "--export-debug",
        }
    }
}

/// Runs exports with a headless Godot executable.
#[derive(Debug, Clone)]
pub struct GodotRunner {
    runtime: RuntimeHandle,
    mode: ExportMode,
}

impl GodotRunner {
    /// Creates a runner for the given runtime.
    #[must_use]
    pub fn new(runtime: RuntimeHandle, mode: ExportMode) -> Self {
        Self { runtime, mode }
    }

    /// Builds the runtime invocation for one export.
    ///
    /// The runtime's stdout is sent to our stderr so that stdout only ever
    /// carries the artifact list.
    #[must_use]
    pub fn command(&self, project_dir: &Path, target: &ExportTarget, export_file: &Path) -> Command {
        let mut cmd = Command::new(&self.runtime.executable);
        cmd.arg("--headless")
            .arg("--path")
            .arg(project_dir)
            .arg(self.mode.flag())
            .arg(&target.name)
            .arg(export_file)
            .stdin(Stdio::null())
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit());
        cmd
    }
}

impl ExportRunner for GodotRunner {
    fn export(
        &self,
        project_dir: &Path,
        target: &ExportTarget,
        export_file: &Path,
    ) -> Result<(), GdxError> {
        let mut cmd = self.command(project_dir, target, export_file);
        tracing::debug!(command = ?cmd, "invoking runtime");

        let status = cmd.status().map_err(|e| {
            GdxError::export_failed(
                &target.name,
                format!(
                    "cannot start runtime {}: {e}",
                    self.runtime.executable.display()
                ),
            )
        })?;

        if status.success() {
            Ok(())
        } else {
            let reason = match status.code() {
                Some(code) => format!("runtime exited with code {code}"),
                None => "runtime was terminated by a signal".to_string(),
            };
            Err(GdxError::export_failed(&target.name, reason))
        }
    }
}
