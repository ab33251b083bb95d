//! Records flowing through an export run.

use std::path::{Component, Path, PathBuf};

use crate::errors::GdxError;

/// One export preset from the project's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    /// Preset name passed to the runtime's `--export` flag.
    pub name: String,
    /// Output path, resolved against the project directory unless absolute.
    pub export_path: PathBuf,
    /// Platform the preset targets, as Godot names it (`Linux/X11`, `Mac OSX`, ...).
    pub platform: String,
}

impl ExportTarget {
    /// Creates an export target.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        export_path: impl Into<PathBuf>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            export_path: export_path.into(),
            platform: platform.into(),
        }
    }

    /// Output directory relative to the project: the parent of the export path.
    #[must_use]
    pub fn relative_output_dir(&self) -> &Path {
        self.export_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Where the runtime writes the export for a project in `project_dir`.
    #[must_use]
    pub fn export_file(&self, project_dir: &Path) -> PathBuf {
        normalize(&project_dir.join(&self.export_path))
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
///
/// A `..` that cannot cancel a preceding name is kept, except directly
/// after the root where it has nowhere to go.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The single artifact recorded for a successfully processed target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// The target that produced the artifact.
    pub target: ExportTarget,
    /// The archive or renamed file left in the output directory.
    pub artifact_path: PathBuf,
    /// How many files the export produced before packaging.
    pub produced_file_count: usize,
}

/// The target that stopped a run and why.
#[derive(Debug)]
pub struct ExportFailure {
    /// The failing target.
    pub target: ExportTarget,
    /// What went wrong.
    pub error: GdxError,
}

/// Outcomes of every target processed before the run finished or stopped.
#[derive(Debug, Default)]
pub struct OrchestrationResult {
    /// Outcomes in target order.
    pub outcomes: Vec<ExportOutcome>,
    /// The first failure, if the run stopped early.
    pub failure: Option<ExportFailure>,
}

impl OrchestrationResult {
    /// Returns `true` if every target produced an outcome.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Artifact paths in target order.
    #[must_use]
    pub fn artifact_paths(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .map(|o| o.artifact_path.as_path())
            .collect()
    }

    /// Converts into the outcome list, or the failure's error.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing target, if any.
    pub fn into_result(self) -> Result<Vec<ExportOutcome>, GdxError> {
        match self.failure {
            None => Ok(self.outcomes),
            Some(failure) => Err(failure.error),
        }
    }
}

/// Joins artifact paths into the comma-separated list reported to callers.
#[must_use]
pub fn join_artifact_paths<P: AsRef<Path>>(paths: &[P]) -> String {
    paths
        .iter()
        .map(|p| p.as_ref().display().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, artifact: &str) -> ExportOutcome {
        ExportOutcome {
            target: ExportTarget::new(name, format!("build/{name}/game"), "Linux/X11"),
            artifact_path: PathBuf::from(artifact),
            produced_file_count: 1,
        }
    }

    #[test]
    fn relative_output_dir_is_parent_of_export_path() {
        let target = ExportTarget::new("Linux", "build/linux/game.x86_64", "Linux/X11");
        assert_eq!(target.relative_output_dir(), Path::new("build/linux"));
    }

    #[test]
    fn export_file_resolves_parent_components() {
        let target = ExportTarget::new("Linux", "../dist/./linux/game.x86_64", "Linux/X11");
        assert_eq!(
            target.export_file(Path::new("/work/project")),
            Path::new("/work/dist/linux/game.x86_64")
        );
    }

    #[test]
    fn normalize_keeps_leading_parent_components() {
        assert_eq!(normalize(Path::new("./build/../../out")), Path::new("../out"));
        assert_eq!(normalize(Path::new("build/linux/..")), Path::new("build"));
        assert_eq!(normalize(Path::new("build/..")), Path::new(""));
        assert_eq!(normalize(Path::new("/../tmp")), Path::new("/tmp"));
    }

    #[test]
    fn join_artifact_paths_uses_commas() {
        let joined = join_artifact_paths(&["/p/build/linux/linux.zip", "/p/build/mac/mac.zip"]);
        assert_eq!(joined, "/p/build/linux/linux.zip,/p/build/mac/mac.zip");
    }

    #[test]
    fn join_artifact_paths_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(join_artifact_paths(&empty), "");
    }

    #[test]
    fn into_result_returns_outcomes_on_success() {
        let result = OrchestrationResult {
            outcomes: vec![outcome("a", "/a.zip"), outcome("b", "/b.zip")],
            failure: None,
        };
        assert!(result.is_success());
        assert_eq!(
            result.artifact_paths(),
            [Path::new("/a.zip"), Path::new("/b.zip")]
        );
        assert_eq!(result.into_result().unwrap().len(), 2);
    }

    #[test]
    fn into_result_surfaces_failure() {
        let result = OrchestrationResult {
            outcomes: vec![outcome("a", "/a.zip")],
            failure: Some(ExportFailure {
                target: ExportTarget::new("b", "build/b/game", "Linux/X11"),
                error: GdxError::export_failed("b", "runtime exited with code 1"),
            }),
        };
        assert!(!result.is_success());
        let err = result.into_result().unwrap_err();
        assert!(matches!(err, GdxError::ExportFailed { ref preset, .. } if preset == "b"));
    }
}
