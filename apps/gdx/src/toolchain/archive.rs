//! ZIP extraction and creation.
//!
//! Godot ships both its runtime (`.zip`) and its export templates (`.tpz`)
//! as ZIP archives, and multi-file exports are packaged back into a ZIP.
//! Extraction can keep or strip a root folder shared by all entries;
//! creation always finishes the archive under a temporary name before it
//! becomes visible at its final path.

use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// What to do with a folder shared by every archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootFolder {
    /// Extract entries with their root folder intact.
    Keep,
    /// Drop the shared root folder, so `templates/linux.x86_64` becomes `linux.x86_64`.
    Strip,
}

/// Extracts a ZIP archive to the destination directory.
///
/// Creates the destination directory if it does not exist. Unix permission
/// bits recorded in the archive are restored.
///
/// # Errors
///
/// Returns an error if:
/// - The archive cannot be opened or is not a valid ZIP file
/// - An entry points outside the destination directory
/// - Directory or file creation fails
pub fn extract_zip(archive_path: &Path, dest_dir: &Path, root: RootFolder) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;

    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {}", archive_path.display()))?;

    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let strip_prefix = match root {
        RootFolder::Keep => None,
        RootFolder::Strip => find_common_root_folder(&mut archive),
    };

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read archive entry {i}"))?;

        // `enclosed_name` rejects absolute and `..` entries.
        let entry_path = entry
            .enclosed_name()
            .with_context(|| format!("Refusing to extract unsafe entry path: {}", entry.name()))?;

        let Some(relative_path) = relative_to_root(&entry_path, strip_prefix.as_deref()) else {
            continue;
        };

        let output_path = dest_dir.join(&relative_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut outfile = std::fs::File::create(&output_path)
            .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to extract: {}", output_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode & 0o777))
                .with_context(|| format!("Failed to set permissions: {}", output_path.display()))?;
        }
    }

    Ok(())
}

/// Drops `root` from `entry_path` when present. Returns `None` for the root
/// folder entry itself.
fn relative_to_root(entry_path: &Path, root: Option<&Path>) -> Option<PathBuf> {
    match root.map(|prefix| entry_path.strip_prefix(prefix)) {
        Some(Ok(rest)) if rest.as_os_str().is_empty() => None,
        Some(Ok(rest)) => Some(rest.to_path_buf()),
        _ => Some(entry_path.to_path_buf()),
    }
}

/// Finds a common root folder shared by all archive entries.
///
/// Returns `Some(prefix)` only if all entries start with the same folder
/// name and at least one entry is nested below it, so a lone file at the
/// archive root is never mistaken for a folder.
fn find_common_root_folder<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Option<PathBuf> {
    if archive.is_empty() {
        return None;
    }

    let mut common_root: Option<PathBuf> = None;
    let mut has_nested_entries = false;

    for i in 0..archive.len() {
        let entry = archive.by_index(i).ok()?;
        let path = entry.enclosed_name()?;

        if path.components().count() > 1 {
            has_nested_entries = true;
        }

        let first_component = path.components().next()?;
        let root = PathBuf::from(first_component.as_os_str());

        match &common_root {
            None => common_root = Some(root),
            Some(existing) if existing != &root => return None,
            Some(_) => {}
        }
    }

    if has_nested_entries { common_root } else { None }
}

/// Compresses `files` into a deflate ZIP at `archive_path`.
///
/// Entry names are the files' paths relative to `base_dir`, joined with
/// `/`. The archive is written to `<archive_path>.partial` and only renamed
/// to `archive_path` after the central directory has been written and
/// flushed; on failure the partial file is removed and `archive_path` is
/// left untouched.
///
/// # Errors
///
/// Returns an error if a file lies outside `base_dir`, cannot be read, or
/// the archive cannot be written.
pub fn compress_files(base_dir: &Path, files: &[PathBuf], archive_path: &Path) -> Result<()> {
    let partial = partial_path_for(archive_path);

    if let Err(e) = write_zip(base_dir, files, &partial) {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }

    std::fs::rename(&partial, archive_path).with_context(|| {
        format!(
            "Failed to move {} to {}",
            partial.display(),
            archive_path.display()
        )
    })
}

/// Writes the archive body for [`compress_files`].
fn write_zip(base_dir: &Path, files: &[PathBuf], dest: &Path) -> Result<()> {
    let file = std::fs::File::create(dest)
        .with_context(|| format!("Failed to create archive: {}", dest.display()))?;
    let mut zip = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for path in files {
        let name = entry_name(base_dir, path)?;
        let options = match unix_mode(path) {
            Some(mode) => options.unix_permissions(mode),
            None => options,
        };
        zip.start_file(name.as_str(), options)
            .with_context(|| format!("Failed to add {name} to {}", dest.display()))?;
        let mut source = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        std::io::copy(&mut source, &mut zip)
            .with_context(|| format!("Failed to compress {}", path.display()))?;
    }

    let mut file = zip
        .finish()
        .with_context(|| format!("Failed to finalize archive: {}", dest.display()))?;
    file.flush()
        .with_context(|| format!("Failed to flush archive: {}", dest.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync archive: {}", dest.display()))?;
    Ok(())
}

/// Builds the `/`-separated entry name of `path` relative to `base_dir`.
fn entry_name(base_dir: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(base_dir).with_context(|| {
        format!(
            "{} is not inside {}",
            path.display(),
            base_dir.display()
        )
    })?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        bail!("Cannot archive the base directory itself: {}", base_dir.display());
    }
    Ok(parts.join("/"))
}

/// Returns `<archive_path>.partial`.
fn partial_path_for(archive_path: &Path) -> PathBuf {
    let mut name = archive_path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    archive_path.with_file_name(name)
}

#[cfg(unix)]
fn unix_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .ok()
        .map(|m| m.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn unix_mode(_path: &Path) -> Option<u32> {
    None
}

/// Marks a runtime executable as executable (0o755) on Unix.
///
/// # Errors
///
/// Returns an error if the file metadata cannot be read or updated.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .with_context(|| format!("Failed to get metadata: {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to set permissions: {}", path.display()))
}

/// Sets executable permissions (no-op on Windows).
#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
pub fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
