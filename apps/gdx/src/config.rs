//! Run settings assembled from flags, environment and `gdx.toml`.
//!
//! Precedence, highest first: command line flags, environment variables
//! (read by clap), the project's `gdx.toml`, built-in defaults. Every path
//! is made absolute once here so later stages never depend on the current
//! directory.

use std::path::{Path, PathBuf};

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args};
use serde::Deserialize;

use crate::errors::GdxError;
use crate::export::{ExportMode, SourceCleanup};
use crate::toolchain::paths::DEFAULT_WORK_DIR;
use crate::toolchain::release::{DEFAULT_RELEASE_API, DEFAULT_RELEASE_REPO};
use crate::toolchain::{ReleaseAssets, ReleaseSource, WorkPaths};

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE: &str = "gdx.toml";

/// Contents of `gdx.toml`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub version: Option<String>,
    pub mono: Option<bool>,
    pub work_dir: Option<PathBuf>,
    pub templates_dir: Option<PathBuf>,
    pub release_api: Option<String>,
    pub release_repo: Option<String>,
    pub debug: Option<bool>,
    pub keep_sources: Option<bool>,
}

impl FileConfig {
    /// Reads `gdx.toml` from `project_dir`, or returns defaults if absent.
    ///
    /// Relative paths in the file are resolved against `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns `GdxError::Config` if the file exists but cannot be read or
    /// parsed.
    pub fn load(project_dir: &Path) -> Result<Self, GdxError> {
        let path = project_dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            GdxError::config_error(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|e| {
            GdxError::config_error(format!("Failed to parse {}: {e}", path.display()))
        })?;

        config.work_dir = config.work_dir.map(|p| project_dir.join(p));
        config.templates_dir = config.templates_dir.map(|p| project_dir.join(p));
        Ok(config)
    }
}

/// Flags selecting and locating the runtime, shared by `export` and `install`.
#[derive(Args, Debug, Clone, Default)]
pub struct RuntimeArgs {
    /// Godot version to export with (e.g. "4.2.1-stable").
    #[clap(long = "godot-version", env = "GDX_GODOT_VERSION")]
    pub godot_version: Option<String>,

    /// Use the .NET (mono) build of the runtime and templates.
    ///
    /// `GDX_MONO` accepts `1`/`0`, `yes`/`no`, `on`/`off` and `true`/`false`.
    #[clap(
        long,
        env = "GDX_MONO",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub mono: bool,

    /// Directory for downloads and the extracted runtime [default: .gdx]
    #[clap(long, env = "GDX_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Directory Godot reads export templates from.
    #[clap(long, env = "GDX_TEMPLATES_DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Use an existing Godot executable instead of downloading one.
    #[clap(long, env = "GODOT_PATH")]
    pub godot: Option<PathBuf>,

    /// Base URL of the release API.
    #[clap(long, env = "GDX_RELEASE_API")]
    pub release_api: Option<String>,

    /// Repository publishing Godot releases, as `owner/name`.
    #[clap(long)]
    pub release_repo: Option<String>,
}

/// Where the runtime comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeSource {
    /// An executable already present on disk.
    Existing(PathBuf),
    /// A release to fetch and prepare.
    Release {
        assets: ReleaseAssets,
        source: ReleaseSource,
        paths: WorkPaths,
    },
}

impl RuntimeSource {
    /// Resolves the runtime settings for a project.
    ///
    /// `base_dir` anchors relative flag values; usually the current directory.
    ///
    /// # Errors
    ///
    /// Returns `GdxError::InvalidArguments` if no version is configured and
    /// no executable was given, and `GdxError::Config` if the templates
    /// directory cannot be determined.
    pub fn resolve(
        args: &RuntimeArgs,
        file: &FileConfig,
        base_dir: &Path,
    ) -> Result<Self, GdxError> {
        if let Some(godot) = &args.godot {
            return Ok(Self::Existing(locate_executable(godot, base_dir)));
        }

        let version = args
            .godot_version
            .clone()
            .or_else(|| file.version.clone())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                GdxError::invalid_arguments(
                    "no Godot version given: pass --godot-version, set GDX_GODOT_VERSION, \
                     or add `version` to gdx.toml",
                )
            })?;
        let mono = args.mono || file.mono.unwrap_or(false);

        let work_dir = args
            .work_dir
            .as_ref()
            .map(|p| base_dir.join(p))
            .or_else(|| file.work_dir.clone())
            .unwrap_or_else(|| base_dir.join(DEFAULT_WORK_DIR));

        let templates_root = match args
            .templates_dir
            .as_ref()
            .map(|p| base_dir.join(p))
            .or_else(|| file.templates_dir.clone())
        {
            Some(dir) => dir,
            None => WorkPaths::default_templates_root()
                .map_err(|e| GdxError::config_error(format!("{e:#}")))?,
        };

        let api = args
            .release_api
            .as_deref()
            .or(file.release_api.as_deref())
            .unwrap_or(DEFAULT_RELEASE_API);
        let repo = args
            .release_repo
            .as_deref()
            .or(file.release_repo.as_deref())
            .unwrap_or(DEFAULT_RELEASE_REPO);

        Ok(Self::Release {
            assets: ReleaseAssets::new(version, mono),
            source: ReleaseSource::new(api, repo),
            paths: WorkPaths::new(work_dir, templates_root),
        })
    }
}

/// Resolves an executable given on the command line.
///
/// A bare name that is not a file in `base_dir` is looked up on `PATH`.
fn locate_executable(godot: &Path, base_dir: &Path) -> PathBuf {
    let local = base_dir.join(godot);
    if godot.components().count() == 1
        && !local.is_file()
        && let Ok(found) = which::which(godot)
    {
        return found;
    }
    local
}

/// Export behavior toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    pub mode: ExportMode,
    pub cleanup: SourceCleanup,
}

impl ExportOptions {
    /// Combines flag values with `gdx.toml`. A set flag always wins.
    #[must_use]
    pub fn resolve(debug: bool, keep_sources: bool, file: &FileConfig) -> Self {
        let mode = if debug || file.debug.unwrap_or(false) {
            ExportMode::Debug
        } else {
            ExportMode::Release
        };
        let cleanup = if keep_sources || file.keep_sources.unwrap_or(false) {
            SourceCleanup::Keep
        } else {
            SourceCleanup::Delete
        };
        Self { mode, cleanup }
    }
}

/// Makes `path` absolute against the current directory.
///
/// # Errors
///
/// Returns `GdxError::Io` if the current directory cannot be read.
pub fn absolute(path: &Path) -> Result<PathBuf, GdxError> {
    std::path::absolute(path)
        .map_err(|e| GdxError::io_error(format!("Failed to resolve {}", path.display()), e))
}

/// Returns the current directory, against which relative flags resolve.
///
/// # Errors
///
/// Returns `GdxError::Io` if the current directory cannot be read.
pub fn current_dir() -> Result<PathBuf, GdxError> {
    std::env::current_dir()
        .map_err(|e| GdxError::io_error("Failed to read the current directory", e))
}

/// Resolves the project directory and checks that it exists.
///
/// # Errors
///
/// Returns `GdxError::InvalidArguments` if the directory does not exist.
pub fn project_dir(path: &Path) -> Result<PathBuf, GdxError> {
    let dir = absolute(path)?;
    if !dir.is_dir() {
        return Err(GdxError::invalid_arguments(format!(
            "project directory {} does not exist",
            dir.display()
        )));
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with_version(version: &str) -> RuntimeArgs {
        RuntimeArgs {
            godot_version: Some(version.to_string()),
            templates_dir: Some(PathBuf::from("tpl")),
            ..RuntimeArgs::default()
        }
    }

    #[test]
    fn missing_file_config_is_default() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(FileConfig::load(temp.path()).unwrap(), FileConfig::default());
    }

    #[test]
    fn file_config_paths_are_relative_to_project() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "version = \"4.2.1\"\nmono = true\nwork_dir = \"cache\"\nkeep_sources = true\n",
        )
        .unwrap();

        let config = FileConfig::load(temp.path()).unwrap();

        assert_eq!(config.version.as_deref(), Some("4.2.1"));
        assert_eq!(config.mono, Some(true));
        assert_eq!(config.work_dir, Some(temp.path().join("cache")));
        assert_eq!(config.keep_sources, Some(true));
    }

    #[test]
    fn malformed_file_config_is_config_error() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "version = [").unwrap();

        let err = FileConfig::load(temp.path()).unwrap_err();

        assert!(matches!(err, GdxError::Config { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn unknown_key_is_config_error() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "verison = \"4.2\"").unwrap();
        assert!(matches!(
            FileConfig::load(temp.path()),
            Err(GdxError::Config { .. })
        ));
    }

    #[test]
    fn flags_override_file_values() {
        let file = FileConfig {
            version: Some("3.5".to_string()),
            work_dir: Some(PathBuf::from("/from/file")),
            release_repo: Some("fork/godot".to_string()),
            ..FileConfig::default()
        };
        let mut args = args_with_version("4.2.1");
        args.work_dir = Some(PathBuf::from("flag-work"));

        let resolved = RuntimeSource::resolve(&args, &file, Path::new("/base")).unwrap();

        let RuntimeSource::Release {
            assets,
            source,
            paths,
        } = resolved
        else {
            panic!("expected a release source");
        };
        assert_eq!(assets, ReleaseAssets::new("4.2.1", false));
        assert_eq!(paths.work_dir, PathBuf::from("/base/flag-work"));
        assert_eq!(paths.templates_root, PathBuf::from("/base/tpl"));
        assert_eq!(source.repository, "fork/godot");
        assert_eq!(source.api_base, DEFAULT_RELEASE_API);
    }

    #[test]
    fn file_values_fill_unset_flags() {
        let file = FileConfig {
            version: Some("4.1".to_string()),
            mono: Some(true),
            templates_dir: Some(PathBuf::from("/templates")),
            ..FileConfig::default()
        };

        let resolved =
            RuntimeSource::resolve(&RuntimeArgs::default(), &file, Path::new("/base")).unwrap();

        let RuntimeSource::Release { assets, paths, .. } = resolved else {
            panic!("expected a release source");
        };
        assert_eq!(assets, ReleaseAssets::new("4.1", true));
        assert_eq!(paths.work_dir, PathBuf::from("/base/.gdx"));
        assert_eq!(paths.templates_root, PathBuf::from("/templates"));
    }

    #[test]
    fn existing_runtime_skips_version_requirement() {
        let args = RuntimeArgs {
            godot: Some(PathBuf::from("bin/godot")),
            ..RuntimeArgs::default()
        };

        let resolved =
            RuntimeSource::resolve(&args, &FileConfig::default(), Path::new("/base")).unwrap();

        assert_eq!(
            resolved,
            RuntimeSource::Existing(PathBuf::from("/base/bin/godot"))
        );
    }

    #[test]
    fn bare_executable_name_is_found_on_path() {
        let Ok(sh) = which::which("sh") else {
            return;
        };
        let args = RuntimeArgs {
            godot: Some(PathBuf::from("sh")),
            ..RuntimeArgs::default()
        };

        let resolved =
            RuntimeSource::resolve(&args, &FileConfig::default(), Path::new("/nonexistent"))
                .unwrap();

        assert_eq!(resolved, RuntimeSource::Existing(sh));
    }

    #[test]
    fn missing_version_is_invalid_arguments() {
        let err = RuntimeSource::resolve(
            &RuntimeArgs::default(),
            &FileConfig::default(),
            Path::new("/base"),
        )
        .unwrap_err();
        assert!(matches!(err, GdxError::InvalidArguments { .. }));
    }

    #[test]
    fn blank_version_is_rejected() {
        let err = RuntimeSource::resolve(
            &args_with_version("  "),
            &FileConfig::default(),
            Path::new("/base"),
        )
        .unwrap_err();
        assert!(matches!(err, GdxError::InvalidArguments { .. }));
    }

    #[test]
    fn export_options_combine_flags_and_file() {
        let file = FileConfig {
            keep_sources: Some(true),
            ..FileConfig::default()
        };
        assert_eq!(
            ExportOptions::resolve(true, false, &file),
            ExportOptions {
                mode: ExportMode::Debug,
                cleanup: SourceCleanup::Keep,
            }
        );
        assert_eq!(
            ExportOptions::resolve(false, false, &FileConfig::default()),
            ExportOptions::default()
        );
    }

    #[test]
    fn project_dir_must_exist() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(project_dir(temp.path()).unwrap(), temp.path());
        assert!(matches!(
            project_dir(&temp.path().join("missing")),
            Err(GdxError::InvalidArguments { .. })
        ));
    }
}
