//! Godot runtime acquisition for the gdx CLI.
//!
//! ## Module Structure
//!
//! - [`release`] - Release lookup and asset selection
//! - [`download`] - Streaming HTTP downloads with concurrent fan-out
//! - [`archive`] - ZIP extraction and creation
//! - [`paths`] - Working and templates directory layout
//! - [`runtime`] - Asset naming and runtime executable location
//! - [`install`] - The resolve / download / extract sequence

pub mod archive;
pub mod download;
pub mod install;
pub mod paths;
pub mod release;
pub mod runtime;

pub use archive::compress_files;
pub use install::prepare_runtime;
pub use paths::WorkPaths;
pub use release::ReleaseSource;
pub use runtime::{ReleaseAssets, RuntimeHandle};
