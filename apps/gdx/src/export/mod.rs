//! Exporting a Godot project and packaging the results.
//!
//! ## Module Structure
//!
//! - [`presets`] - Reading `export_presets.cfg` into export targets
//! - [`runner`] - Invoking the runtime for a single preset
//! - [`packaging`] - Turning an output directory into one artifact
//! - [`orchestrator`] - Fail-fast sequencing over all presets
//! - [`target`] - Targets, outcomes and the run result

pub mod orchestrator;
pub mod packaging;
pub mod presets;
pub mod runner;
pub mod target;

pub use orchestrator::Orchestrator;
pub use packaging::SourceCleanup;
pub use presets::load_presets;
pub use runner::{ExportMode, GodotRunner};
pub use target::{ExportTarget, join_artifact_paths};
