//! Runtime asset naming and executable location.
//!
//! Godot publishes its headless Linux runtime as
//! `Godot_v<version>[_mono]_linux_headless_64.zip`. The archive holds a
//! single root folder named after the asset (minus `.zip`), and the
//! executable inside it uses the same stem with `.64` in place of
//! `_64.zip`:
//!
//! ```text
//! Godot_v4.2.1_mono_linux_headless_64.zip
//!   Godot_v4.2.1_mono_linux_headless_64/
//!     Godot_v4.2.1_mono_linux_headless.64
//! ```
//!
//! Nothing here touches the filesystem; a missing executable surfaces when
//! the runtime is first invoked.

use std::path::{Path, PathBuf};

/// Suffix of the runtime asset name.
const RUNTIME_ASSET_SUFFIX: &str = "_linux_headless_64.zip";

/// Suffix of the export templates asset name.
const TEMPLATES_ASSET_SUFFIX: &str = "_export_templates.tpz";

/// Returns `_mono` for the mono variant and nothing otherwise.
fn variant_suffix(mono: bool) -> &'static str {
    if mono { "_mono" } else { "" }
}

/// Returns the directory name Godot expects for a version's templates.
///
/// Dashes in the version become dots, and the mono variant appends `.mono`
/// (`3.2.3-stable` + mono becomes `3.2.3.stable.mono`).
#[must_use]
pub fn template_dir_name(version: &str, mono: bool) -> String {
    let dotted = version.replace('-', ".");
    if mono {
        format!("{dotted}.mono")
    } else {
        dotted
    }
}

/// The pair of release assets needed for one version and variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAssets {
    /// Release version tag, e.g. `4.2.1` or `3.2.3-stable`.
    pub version: String,
    /// Whether the mono (C#) variant is requested.
    pub mono: bool,
}

impl ReleaseAssets {
    /// Creates the asset set for a version and variant.
    #[must_use]
    pub fn new(version: impl Into<String>, mono: bool) -> Self {
        Self {
            version: version.into(),
            mono,
        }
    }

    /// Name of the headless runtime archive.
    #[must_use]
    pub fn runtime_asset(&self) -> String {
        format!(
            "Godot_v{}{}{RUNTIME_ASSET_SUFFIX}",
            self.version,
            variant_suffix(self.mono)
        )
    }

    /// Name of the export templates archive.
    #[must_use]
    pub fn templates_asset(&self) -> String {
        format!(
            "Godot_v{}{}{TEMPLATES_ASSET_SUFFIX}",
            self.version,
            variant_suffix(self.mono)
        )
    }

    /// Locates the runtime executable once the runtime archive has been
    /// extracted into `work_dir` with its root folder kept.
    #[must_use]
    pub fn locate_runtime(&self, work_dir: &Path) -> RuntimeHandle {
        RuntimeHandle::from_asset_name(&self.runtime_asset(), work_dir)
    }
}

/// Resolved path to the runtime executable, shared read-only by every export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeHandle {
    /// Path to the executable.
    pub executable: PathBuf,
}

impl RuntimeHandle {
    /// Wraps an executable that is already on disk.
    #[must_use]
    pub fn new(executable: PathBuf) -> Self {
        Self { executable }
    }

    /// Derives the executable path from a runtime asset name.
    ///
    /// Names that do not follow the `_64.zip` template fall back to the
    /// stem without `.zip` for both the folder and the executable.
    #[must_use]
    pub fn from_asset_name(asset_name: &str, work_dir: &Path) -> Self {
        let folder = asset_name.strip_suffix(".zip").unwrap_or(asset_name);
        let executable = match asset_name.strip_suffix("_64.zip") {
            Some(stem) => format!("{stem}.64"),
            None => folder.to_string(),
        };
        Self {
            executable: work_dir.join(folder).join(executable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_asset_for_standard_variant() {
        let assets = ReleaseAssets::new("4.2.1", false);
        assert_eq!(assets.runtime_asset(), "Godot_v4.2.1_linux_headless_64.zip");
        assert_eq!(
            assets.templates_asset(),
            "Godot_v4.2.1_export_templates.tpz"
        );
    }

    #[test]
    fn runtime_asset_for_mono_variant() {
        let assets = ReleaseAssets::new("3.2.3-stable", true);
        assert_eq!(
            assets.runtime_asset(),
            "Godot_v3.2.3-stable_mono_linux_headless_64.zip"
        );
        assert_eq!(
            assets.templates_asset(),
            "Godot_v3.2.3-stable_mono_export_templates.tpz"
        );
    }

    #[test]
    fn locate_runtime_nests_under_archive_folder() {
        let handle = ReleaseAssets::new("4.2.1", false).locate_runtime(Path::new("/work"));
        assert_eq!(
            handle.executable,
            PathBuf::from(
                "/work/Godot_v4.2.1_linux_headless_64/Godot_v4.2.1_linux_headless.64"
            )
        );
    }

    #[test]
    fn locate_runtime_for_mono_variant() {
        let handle = ReleaseAssets::new("3.2.3-stable", true).locate_runtime(Path::new("/work"));
        assert_eq!(
            handle.executable,
            PathBuf::from(
                "/work/Godot_v3.2.3-stable_mono_linux_headless_64/Godot_v3.2.3-stable_mono_linux_headless.64"
            )
        );
    }

    #[test]
    fn from_asset_name_without_template_suffix() {
        let handle = RuntimeHandle::from_asset_name("custom.zip", Path::new("/w"));
        assert_eq!(handle.executable, PathBuf::from("/w/custom/custom"));
    }

    #[test]
    fn template_dir_name_variants() {
        assert_eq!(template_dir_name("4.2.1", false), "4.2.1");
        assert_eq!(template_dir_name("4.2.1", true), "4.2.1.mono");
        assert_eq!(template_dir_name("3.2.3-stable", false), "3.2.3.stable");
    }
}
