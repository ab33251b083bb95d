//! Error types for the gdx CLI.
//!
//! `GdxError` classifies every way a run can stop: release resolution,
//! downloads, archive handling, project configuration, and per-preset
//! exports. Adapters in [`crate::toolchain`] report failures as
//! `anyhow::Error` with context; the pipeline stages wrap those into the
//! matching variant so the top level can tell them apart.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed source error carried by adapter-backed variants.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Consolidated error type for gdx operations.
#[derive(Debug, Error)]
pub enum GdxError {
    /// The requested version or variant has no matching release or asset.
    #[error("release resolution failed: {message}")]
    Resolution {
        /// What could not be resolved.
        message: String,
    },

    /// A network transfer failed.
    #[error("download error: {message}")]
    Download {
        /// Description of the download error.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<BoxedSource>,
    },

    /// Extracting or creating an archive failed.
    #[error("archive error: {message}")]
    Archive {
        /// Description of the archive operation that failed.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<BoxedSource>,
    },

    /// The project or tool configuration is missing or malformed.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the problem, including the file and line when known.
        message: String,
    },

    /// A preset export did not produce a usable result.
    ///
    /// Covers a runtime that could not be started, a non-zero exit, and an
    /// export that left no files behind.
    #[error("export of preset '{preset}' failed: {reason}")]
    ExportFailed {
        /// Name of the failing export preset.
        preset: String,
        /// Why the export failed.
        reason: String,
    },

    /// Error reading or writing files.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid command line arguments.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// Description of what was invalid.
        message: String,
    },

    /// A runtime executable given on the command line does not exist.
    #[error("runtime not found: {}", path.display())]
    RuntimeNotFound {
        /// The path that was checked.
        path: PathBuf,
    },
}

impl GdxError {
    /// Creates a new `Resolution` error.
    #[must_use]
    pub fn resolution_error(message: impl Into<String>) -> Self {
        Self::Resolution {
            message: message.into(),
        }
    }

    /// Creates a new `Download` error without a source.
    #[must_use]
    pub fn download_error(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `Download` error wrapping an adapter failure.
    #[must_use]
    pub fn download_error_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Download {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a new `Archive` error wrapping an adapter failure.
    #[must_use]
    pub fn archive_error(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Archive {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a new `Config` error.
    #[must_use]
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new `ExportFailed` error.
    #[must_use]
    pub fn export_failed(preset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExportFailed {
            preset: preset.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `Io` error from an I/O error with context.
    #[must_use]
    pub fn io_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new `InvalidArguments` error.
    #[must_use]
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Creates a new `RuntimeNotFound` error.
    #[must_use]
    pub fn runtime_not_found(path: PathBuf) -> Self {
        Self::RuntimeNotFound { path }
    }
}
