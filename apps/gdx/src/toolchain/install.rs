//! Runtime preparation: resolve, download, extract, locate.
//!
//! The two release assets are downloaded concurrently; everything after
//! the join runs one step at a time. A version whose executable and
//! templates directory are already on disk is reused without touching the
//! network.

use super::archive::{RootFolder, extract_zip, set_executable};
use super::download::{Download, download_all};
use super::paths::WorkPaths;
use super::release::{ReleaseSource, resolve_assets};
use super::runtime::{ReleaseAssets, RuntimeHandle};
use crate::errors::GdxError;

/// Ensures the runtime and export templates for `wanted` are installed.
///
/// # Process
///
/// 1. Return early if the runtime executable and templates already exist
/// 2. Resolve both asset URLs from the release registry
/// 3. Download both archives concurrently
/// 4. Extract the runtime into the working directory (root folder kept)
/// 5. Extract the templates into the versioned templates directory
/// 6. Mark the runtime executable and remove the downloaded archives
///
/// # Errors
///
/// Returns `Resolution`, `Download`, `Archive` or `Io` errors from the
/// failing step. Partially written state is left in place.
pub async fn prepare_runtime(
    paths: &WorkPaths,
    source: &ReleaseSource,
    wanted: &ReleaseAssets,
) -> Result<RuntimeHandle, GdxError> {
    let handle = wanted.locate_runtime(&paths.work_dir);
    if paths.is_prepared(wanted, &handle.executable) {
        tracing::info!(
            version = %wanted.version,
            mono = wanted.mono,
            executable = %handle.executable.display(),
            "runtime already installed"
        );
        return Ok(handle);
    }

    paths.ensure_directories().map_err(|e| {
        GdxError::config_error(format!(
            "working directory {} is not usable: {e:#}",
            paths.work_dir.display()
        ))
    })?;

    tracing::info!(version = %wanted.version, mono = wanted.mono, "resolving release assets");
    let resolved = resolve_assets(source, wanted).await?;

    let runtime_archive = paths.download_path(&resolved.runtime.name);
    let templates_archive = paths.download_path(&resolved.templates.name);

    tracing::info!(
        runtime = %resolved.runtime.name,
        templates = %resolved.templates.name,
        "downloading"
    );
    download_all(&[
        Download::new(&resolved.runtime.browser_download_url, &runtime_archive),
        Download::new(&resolved.templates.browser_download_url, &templates_archive),
    ])
    .await
    .map_err(|e| GdxError::download_error_with_source("Failed to download release assets", e))?;

    tracing::info!(dest = %paths.work_dir.display(), "extracting runtime");
    extract_zip(&runtime_archive, &paths.work_dir, RootFolder::Keep)
        .map_err(|e| GdxError::archive_error("Failed to extract runtime", e))?;

    let templates_dir = paths.templates_dir(&wanted.version, wanted.mono);
    tracing::info!(dest = %templates_dir.display(), "extracting export templates");
    extract_zip(&templates_archive, &templates_dir, RootFolder::Strip)
        .map_err(|e| GdxError::archive_error("Failed to extract export templates", e))?;

    if !handle.executable.is_file() {
        return Err(GdxError::runtime_not_found(handle.executable));
    }
    set_executable(&handle.executable)
        .map_err(|e| GdxError::archive_error("Failed to mark runtime executable", e))?;

    for archive in [&runtime_archive, &templates_archive] {
        if let Err(e) = std::fs::remove_file(archive) {
            tracing::warn!(path = %archive.display(), error = %e, "could not remove download");
        }
    }

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use zip::write::SimpleFileOptions;

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            for (name, contents) in entries {
                zip.start_file(*name, SimpleFileOptions::default())
                    .expect("Should start file");
                zip.write_all(contents).expect("Should write");
            }
            zip.finish().expect("Should finish");
        }
        cursor.into_inner()
    }

    fn release_json(base: &str) -> String {
        format!(
            r#"{{
                "tag_name": "4.2.1",
                "assets": [
                    {{ "name": "Godot_v4.2.1_linux_headless_64.zip",
                       "browser_download_url": "{base}/dl/runtime.zip" }},
                    {{ "name": "Godot_v4.2.1_export_templates.tpz",
                       "browser_download_url": "{base}/dl/templates.tpz" }}
                ]
            }}"#
        )
    }

    fn work_paths(root: &Path) -> WorkPaths {
        WorkPaths::new(root.join("work"), root.join("templates"))
    }

    #[tokio::test]
    async fn prepare_runtime_installs_runtime_and_templates() {
        let mut server = mockito::Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/godotengine/godot/releases/tags/4.2.1")
            .with_body(release_json(&server.url()))
            .create_async()
            .await;
        let _runtime = server
            .mock("GET", "/dl/runtime.zip")
            .with_body(zip_bytes(&[(
                "Godot_v4.2.1_linux_headless_64/Godot_v4.2.1_linux_headless.64",
                b"#!/bin/sh\n",
            )]))
            .create_async()
            .await;
        let _templates = server
            .mock("GET", "/dl/templates.tpz")
            .with_body(zip_bytes(&[("templates/version.txt", b"4.2.1.stable")]))
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let paths = work_paths(temp.path());
        let source = ReleaseSource::new(&server.url(), "godotengine/godot");
        let wanted = ReleaseAssets::new("4.2.1", false);

        let handle = prepare_runtime(&paths, &source, &wanted).await.unwrap();

        assert_eq!(handle, wanted.locate_runtime(&paths.work_dir));
        assert!(handle.executable.is_file());
        assert!(paths.templates_dir("4.2.1", false).join("version.txt").is_file());
        assert!(!paths.download_path("Godot_v4.2.1_linux_headless_64.zip").exists());
    }

    #[tokio::test]
    async fn prepare_runtime_reuses_existing_install() {
        let temp = tempfile::tempdir().unwrap();
        let paths = work_paths(temp.path());
        let wanted = ReleaseAssets::new("4.2.1", false);
        let expected = wanted.locate_runtime(&paths.work_dir);
        std::fs::create_dir_all(expected.executable.parent().unwrap()).unwrap();
        std::fs::write(&expected.executable, b"").unwrap();
        std::fs::create_dir_all(paths.templates_dir("4.2.1", false)).unwrap();

        // Unroutable source: any network access would fail the test.
        let source = ReleaseSource::new("http://127.0.0.1:9", "godotengine/godot");
        let handle = prepare_runtime(&paths, &source, &wanted).await.unwrap();

        assert_eq!(handle, expected);
    }

    #[tokio::test]
    async fn prepare_runtime_reports_download_failure() {
        let mut server = mockito::Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/godotengine/godot/releases/tags/4.2.1")
            .with_body(release_json(&server.url()))
            .create_async()
            .await;
        let _runtime = server
            .mock("GET", "/dl/runtime.zip")
            .with_status(503)
            .create_async()
            .await;
        let _templates = server
            .mock("GET", "/dl/templates.tpz")
            .with_body(zip_bytes(&[("templates/version.txt", b"x")]))
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let source = ReleaseSource::new(&server.url(), "godotengine/godot");
        let err = prepare_runtime(
            &work_paths(temp.path()),
            &source,
            &ReleaseAssets::new("4.2.1", false),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GdxError::Download { .. }));
    }
}
