//! HTTP downloads for release assets.
//!
//! Files are streamed to a `.tmp` sibling and renamed into place only once
//! the body has been fully written, so a destination path either holds a
//! complete download or nothing. Several downloads can run concurrently
//! through [`download_all`], which fails as soon as any of them fails.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use futures_util::future::try_join_all;
use tokio::io::AsyncWriteExt;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Minimum interval between progress log lines in milliseconds.
const PROGRESS_INTERVAL_MS: u128 = 250;

/// User-Agent header for HTTP requests.
pub const USER_AGENT: &str = concat!("gdx/", env!("CARGO_PKG_VERSION"));

/// A single URL to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Source URL.
    pub url: String,
    /// Destination file path.
    pub dest: PathBuf,
}

impl Download {
    /// Creates a download request.
    #[must_use]
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
        }
    }
}

/// Downloads every request concurrently and waits for all of them.
///
/// # Errors
///
/// Returns the first failure; the remaining transfers are dropped.
pub async fn download_all(downloads: &[Download]) -> Result<()> {
    try_join_all(
        downloads
            .iter()
            .map(|d| download_file(&d.url, &d.dest)),
    )
    .await?;
    Ok(())
}

/// Downloads a file from the given URL to the specified path.
///
/// # Errors
///
/// Returns an error if:
/// - The request fails or the server answers with a non-success status
/// - The destination file cannot be created or written
pub async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let temp_path = temp_path_for(dest);

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if let Err(e) = stream_to_file(url, &temp_path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, dest).await.with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            dest.display()
        )
    })?;

    tracing::info!(url, dest = %dest.display(), "download complete");
    Ok(())
}

/// Returns `<dest>.tmp`, keeping the full original file name.
fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Streams the response body of `url` into `dest`.
async fn stream_to_file(url: &str, dest: &Path) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to connect to {url}"))?;

    if !response.status().is_success() {
        bail!("HTTP error {}: {url}", response.status());
    }

    let total_size = response.content_length().unwrap_or(0);
    tracing::debug!(url, total = total_size, "download started");

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create file: {}", dest.display()))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let start_time = Instant::now();
    let mut last_update = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("Failed to read chunk from {url}"))?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write to {}", dest.display()))?;
        downloaded += chunk.len() as u64;

        if last_update.elapsed().as_millis() >= PROGRESS_INTERVAL_MS {
            tracing::debug!(
                url,
                progress = %format_progress(downloaded, total_size),
                elapsed_secs = start_time.elapsed().as_secs(),
                "downloading"
            );
            last_update = Instant::now();
        }
    }

    file.flush()
        .await
        .with_context(|| format!("Failed to flush {}", dest.display()))?;

    Ok(())
}

/// Formats a progress figure such as `1.50 MB/3.00 MB (50%)`.
#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn format_progress(downloaded: u64, total: u64) -> String {
    if total == 0 {
        return format_bytes(downloaded);
    }
    let percent = (downloaded as f64 / total as f64 * 100.0) as u8;
    format!(
        "{}/{} ({percent}%)",
        format_bytes(downloaded),
        format_bytes(total)
    )
}

/// Formats bytes into a human-readable string (KB, MB, GB).
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_to_full_file_name() {
        assert_eq!(
            temp_path_for(Path::new("/d/Godot_v4.2.1_export_templates.tpz")),
            PathBuf::from("/d/Godot_v4.2.1_export_templates.tpz.tmp")
        );
    }

    #[test]
    fn format_bytes_picks_unit() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn format_progress_without_total() {
        assert_eq!(format_progress(100, 0), "100 B");
        assert_eq!(format_progress(512, 1024), "512 B/1.00 KB (50%)");
    }

    #[tokio::test]
    async fn download_file_writes_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/runtime.zip")
            .with_status(200)
            .with_body("runtime bytes")
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("nested").join("runtime.zip");
        download_file(&format!("{}/runtime.zip", server.url()), &dest)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "runtime bytes");
        assert!(!temp_path_for(&dest).exists());
    }

    #[tokio::test]
    async fn download_file_fails_on_http_error_and_leaves_nothing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.zip")
            .with_status(404)
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("missing.zip");
        let err = download_file(&format!("{}/missing.zip", server.url()), &dest)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("404"));
        assert!(!dest.exists());
        assert!(!temp_path_for(&dest).exists());
    }

    #[tokio::test]
    async fn download_all_fetches_every_file() {
        let mut server = mockito::Server::new_async().await;
        let _a = server
            .mock("GET", "/a.zip")
            .with_body("a")
            .create_async()
            .await;
        let _b = server
            .mock("GET", "/b.tpz")
            .with_body("b")
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let downloads = [
            Download::new(format!("{}/a.zip", server.url()), temp.path().join("a.zip")),
            Download::new(format!("{}/b.tpz", server.url()), temp.path().join("b.tpz")),
        ];
        download_all(&downloads).await.unwrap();

        assert_eq!(std::fs::read_to_string(temp.path().join("a.zip")).unwrap(), "a");
        assert_eq!(std::fs::read_to_string(temp.path().join("b.tpz")).unwrap(), "b");
    }

    #[tokio::test]
    async fn download_all_fails_when_any_download_fails() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/ok.zip")
            .with_body("ok")
            .create_async()
            .await;
        let _bad = server
            .mock("GET", "/bad.tpz")
            .with_status(500)
            .create_async()
            .await;

        let temp = tempfile::tempdir().unwrap();
        let downloads = [
            Download::new(format!("{}/ok.zip", server.url()), temp.path().join("ok.zip")),
            Download::new(format!("{}/bad.tpz", server.url()), temp.path().join("bad.tpz")),
        ];

        assert!(download_all(&downloads).await.is_err());
        assert!(!temp.path().join("bad.tpz").exists());
    }
}
