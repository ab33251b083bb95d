//! Normalizing an export's output directory into a single artifact.
//!
//! Several produced files are compressed into `<dir>.zip` inside the output
//! directory, then removed. A single file, or the output of a platform that
//! already delivers a finished bundle, is renamed to `<dir><ext>` instead.
//! Both names come from the output directory, not from the preset.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::target::ExportTarget;
use crate::errors::GdxError;
use crate::toolchain::compress_files;

/// Platforms whose export output is delivered as-is, never re-archived.
///
/// Godot 3 calls the platform `Mac OSX`; Godot 4 renamed it to `macOS`.
pub const RAW_OUTPUT_PLATFORMS: &[&str] = &["mac osx", "macos"];

/// Returns `true` if the platform's output must not be archived.
#[must_use]
pub fn requires_raw_output(platform: &str) -> bool {
    let platform = platform.trim().to_ascii_lowercase();
    RAW_OUTPUT_PLATFORMS.contains(&platform.as_str())
}

/// What happens to the produced files once they have been archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceCleanup {
    /// Remove them, leaving only the archive.
    #[default]
    Delete,
    /// Leave them next to the archive.
    Keep,
}

/// How a target's output will be turned into its artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackagingPlan {
    /// Compress `files` into `archive`.
    Archive {
        /// Every file produced in the output directory.
        files: Vec<PathBuf>,
        /// Output directory the entry names are relative to.
        base_dir: PathBuf,
        /// Destination archive, inside `base_dir`.
        archive: PathBuf,
    },
    /// Rename `file` to `dest`.
    Rename {
        /// The produced file taken as the artifact.
        file: PathBuf,
        /// Its new name inside the output directory.
        dest: PathBuf,
        /// Total number of produced files, including ones left untouched.
        produced: usize,
    },
}

impl PackagingPlan {
    /// Number of files the export produced.
    #[must_use]
    pub fn produced_file_count(&self) -> usize {
        match self {
            Self::Archive { files, .. } => files.len(),
            Self::Rename { produced, .. } => *produced,
        }
    }

    /// Path of the artifact the plan will leave behind.
    #[must_use]
    pub fn artifact_path(&self) -> &Path {
        match self {
            Self::Archive { archive, .. } => archive,
            Self::Rename { dest, .. } => dest,
        }
    }
}

/// Lists every regular file below `dir`, sorted by path.
///
/// # Errors
///
/// Returns `GdxError::Io` if the directory cannot be walked.
pub fn discover_files(dir: &Path) -> Result<Vec<PathBuf>, GdxError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            GdxError::io_error(format!("Failed to scan {}", dir.display()), e.into())
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Decides how to package the files an export produced.
///
/// `export_file` is where the runtime was asked to write; for raw-output
/// platforms that produced several files it identifies the artifact.
///
/// # Errors
///
/// Returns `GdxError::ExportFailed` if no files were produced, or if a
/// raw-output platform produced several files and none at `export_file`.
pub fn plan_packaging(
    target: &ExportTarget,
    output_dir: &Path,
    export_file: &Path,
    files: Vec<PathBuf>,
) -> Result<PackagingPlan, GdxError> {
    let base_name = output_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            GdxError::export_failed(
                &target.name,
                format!("output directory {} has no name", output_dir.display()),
            )
        })?;

    let produced = files.len();
    if produced == 0 {
        return Err(GdxError::export_failed(
            &target.name,
            format!("export produced no files in {}", output_dir.display()),
        ));
    }

    if produced > 1 && !requires_raw_output(&target.platform) {
        return Ok(PackagingPlan::Archive {
            archive: output_dir.join(format!("{base_name}.zip")),
            base_dir: output_dir.to_path_buf(),
            files,
        });
    }

    let file = if produced == 1 {
        files.into_iter().next()
    } else {
        files.into_iter().find(|f| f == export_file)
    }
    .ok_or_else(|| {
        GdxError::export_failed(
            &target.name,
            format!(
                "export produced {produced} files but none at {}",
                export_file.display()
            ),
        )
    })?;

    let extension = file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    Ok(PackagingPlan::Rename {
        dest: output_dir.join(format!("{base_name}{extension}")),
        file,
        produced,
    })
}

/// Carries out a plan and returns the artifact path.
///
/// Archived files are only removed once the archive has been fully
/// written, and directories emptied by the removal are pruned.
///
/// # Errors
///
/// Returns `GdxError::Archive` if compression fails and `GdxError::Io` if
/// a file cannot be renamed or removed.
pub fn apply_packaging(plan: PackagingPlan, cleanup: SourceCleanup) -> Result<PathBuf, GdxError> {
    match plan {
        PackagingPlan::Archive {
            files,
            base_dir,
            archive,
        } => {
            compress_files(&base_dir, &files, &archive).map_err(|e| {
                GdxError::archive_error(format!("Failed to create {}", archive.display()), e)
            })?;

            if cleanup == SourceCleanup::Delete {
                for file in files.iter().filter(|f| **f != archive) {
                    std::fs::remove_file(file).map_err(|e| {
                        GdxError::io_error(format!("Failed to remove {}", file.display()), e)
                    })?;
                }
                prune_empty_dirs(&base_dir);
            }
            Ok(archive)
        }
        PackagingPlan::Rename { file, dest, .. } => {
            if file != dest {
                std::fs::rename(&file, &dest).map_err(|e| {
                    GdxError::io_error(
                        format!("Failed to rename {} to {}", file.display(), dest.display()),
                        e,
                    )
                })?;
            }
            Ok(dest)
        }
    }
}

/// Removes empty directories below `root`, deepest first. `root` itself stays.
fn prune_empty_dirs(root: &Path) {
    let dirs = WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir());

    for dir in dirs {
        // Fails on directories that still hold something; those are kept.
        let _ = std::fs::remove_dir(dir.path());
    }
}
