//! Sequential export of every preset, stopping at the first failure.

use std::path::{Path, PathBuf};

use super::packaging::{SourceCleanup, apply_packaging, discover_files, plan_packaging};
use super::runner::ExportRunner;
use super::target::{ExportFailure, ExportOutcome, ExportTarget, OrchestrationResult};
use crate::errors::GdxError;

/// Drives exports for one project, one target at a time.
pub struct Orchestrator<R> {
    project_dir: PathBuf,
    runner: R,
    cleanup: SourceCleanup,
}

impl<R: ExportRunner> Orchestrator<R> {
    /// Creates an orchestrator for the project at `project_dir`.
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>, runner: R, cleanup: SourceCleanup) -> Self {
        Self {
            project_dir: project_dir.into(),
            runner,
            cleanup,
        }
    }

    /// Exports and packages each target in order.
    ///
    /// Processing stops at the first target that fails; artifacts of the
    /// targets before it stay on disk and are listed in the result.
    pub fn run(&self, targets: &[ExportTarget]) -> OrchestrationResult {
        let mut result = OrchestrationResult::default();

        for (index, target) in targets.iter().enumerate() {
            tracing::info!(
                preset = %target.name,
                platform = %target.platform,
                "exporting {}/{}",
                index + 1,
                targets.len()
            );

            match self.process(target) {
                Ok(outcome) => {
                    tracing::info!(
                        preset = %target.name,
                        artifact = %outcome.artifact_path.display(),
                        files = outcome.produced_file_count,
                        "packaged"
                    );
                    result.outcomes.push(outcome);
                }
                Err(error) => {
                    tracing::error!(preset = %target.name, error = %error, "export failed");
                    result.failure = Some(ExportFailure {
                        target: target.clone(),
                        error,
                    });
                    break;
                }
            }
        }

        if result.is_success() {
            tracing::info!(count = result.outcomes.len(), "all presets exported");
        }
        result
    }

    fn process(&self, target: &ExportTarget) -> Result<ExportOutcome, GdxError> {
        let export_file = target.export_file(&self.project_dir);
        let output_dir = export_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.project_dir.clone());

        std::fs::create_dir_all(&output_dir).map_err(|e| {
            GdxError::io_error(format!("Failed to create {}", output_dir.display()), e)
        })?;

        self.runner.export(&self.project_dir, target, &export_file)?;

        let files = discover_files(&output_dir)?;
        tracing::debug!(preset = %target.name, count = files.len(), "export produced files");

        let plan = plan_packaging(target, &output_dir, &export_file, files)?;
        let produced_file_count = plan.produced_file_count();
        let artifact_path = plan.artifact_path().to_path_buf();
        tracing::debug!(
            preset = %target.name,
            artifact = %artifact_path.display(),
            "packaging export"
        );
        apply_packaging(plan, self.cleanup)?;

        if !artifact_path.is_file() {
            return Err(GdxError::export_failed(
                &target.name,
                format!("artifact {} is missing after packaging", artifact_path.display()),
            ));
        }

        Ok(ExportOutcome {
            target: target.clone(),
            artifact_path,
            produced_file_count,
        })
    }
}
