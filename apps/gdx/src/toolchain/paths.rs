//! Directory layout for a gdx run.
//!
//! Every location is derived from two explicit roots handed in by the
//! caller: the working directory holding downloads and the extracted
//! runtime, and the directory Godot scans for export templates.
//!
//! ```text
//! <work_dir>/                                   # default: ./.gdx
//!   downloads/                                  # archives while in flight
//!   Godot_v4.2.1_linux_headless_64/             # extracted runtime archive
//!     Godot_v4.2.1_linux_headless.64            # runtime executable
//! <templates_root>/                             # default: <data_dir>/godot/templates
//!   4.2.1/                                      # templates for the version
//!   4.2.1.mono/                                 # templates for the mono variant
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::runtime::{ReleaseAssets, template_dir_name};

/// Working directory used when none is configured.
pub const DEFAULT_WORK_DIR: &str = ".gdx";

/// Paths used while fetching and preparing a runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPaths {
    /// Root of the working directory.
    pub work_dir: PathBuf,
    /// Directory receiving downloaded archives.
    pub downloads: PathBuf,
    /// Directory under which export templates are filed by version.
    pub templates_root: PathBuf,
}

impl WorkPaths {
    /// Creates the layout for the given working and templates roots.
    #[must_use = "returns new paths instance without side effects"]
    pub fn new(work_dir: PathBuf, templates_root: PathBuf) -> Self {
        Self {
            downloads: work_dir.join("downloads"),
            work_dir,
            templates_root,
        }
    }

    /// Returns the platform-standard templates root, `<data_dir>/godot/templates`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    pub fn default_templates_root() -> Result<PathBuf> {
        Ok(dirs::data_dir()
            .context("Cannot determine the user data directory. Pass --templates-dir explicitly.")?
            .join("godot")
            .join("templates"))
    }

    /// Returns the path for a downloaded archive file.
    #[must_use = "returns the path without side effects"]
    pub fn download_path(&self, filename: &str) -> PathBuf {
        self.downloads.join(filename)
    }

    /// Returns the directory holding templates for a version and variant.
    #[must_use = "returns the path without side effects"]
    pub fn templates_dir(&self, version: &str, mono: bool) -> PathBuf {
        self.templates_root.join(template_dir_name(version, mono))
    }

    /// Checks whether both the runtime and its templates are already in place.
    #[must_use = "returns installation status without side effects"]
    pub fn is_prepared(&self, assets: &ReleaseAssets, executable: &Path) -> bool {
        executable.is_file() && self.templates_dir(&assets.version, assets.mono).is_dir()
    }

    /// Creates the working and download directories.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.work_dir, &self.downloads] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}
