//! Command modules for the gdx CLI.
//!
//! - [`export`] - Export and package every preset of a project
//! - [`install`] - Prepare the runtime and export templates only
//! - [`presets`] - List a project's export presets
//! - [`version`] - Display version information

pub mod export;
pub mod install;
pub mod presets;
pub mod version;
