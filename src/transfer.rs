//! OPML upload and download between local files and the server.
//!
//! The server parses and produces the documents; this side only moves bytes
//! and makes sure an export never leaves a half-written file behind.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::ApiClient;

/// Largest file accepted for upload (10 MB).
pub const MAX_IMPORT_SIZE: u64 = 10 * 1024 * 1024;

/// Expand a leading `~/` to `$HOME`. Paths typed into the TUI prompt go
/// through here; the shell already did it for CLI arguments.
pub fn expand_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    match (trimmed.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(trimmed),
    }
}

/// Upload `path` to `POST /api/import_opml`. Returns the server's message.
pub async fn import_file(api: &ApiClient, path: &Path) -> Result<String> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve import file: {}", path.display()))?;

    let metadata = tokio::fs::metadata(&canonical)
        .await
        .with_context(|| format!("Failed to read {}", canonical.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("Import path must be a regular file");
    }
    if metadata.len() > MAX_IMPORT_SIZE {
        anyhow::bail!(
            "Import file is too large ({} bytes, max {})",
            metadata.len(),
            MAX_IMPORT_SIZE
        );
    }

    let bytes = tokio::fs::read(&canonical)
        .await
        .with_context(|| format!("Failed to read import file: {}", canonical.display()))?;
    let file_name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("feeds.opml")
        .to_string();

    tracing::info!(path = %canonical.display(), bytes = bytes.len(), "Uploading OPML");
    Ok(api.import_opml(&file_name, bytes).await?)
}

/// Download `GET /api/export_opml` into `path`. Returns the byte count.
pub async fn export_file(api: &ApiClient, path: &Path) -> Result<usize> {
    let bytes = api.export_opml().await?;
    let len = bytes.len();
    let dst = path.to_path_buf();
    tokio::task::spawn_blocking(move || atomic_write(&dst, &bytes))
        .await
        .context("Export writer task failed")??;
    tracing::info!(path = %path.display(), bytes = len, "Exported OPML");
    Ok(len)
}

/// Write `content` to `dst` through a temp file and rename, so `dst` is
/// either the old file or the complete new one.
pub fn atomic_write(dst: &Path, content: &[u8]) -> Result<()> {
    // Unpredictable temp name, created with create_new so a planted symlink fails.
    use std::time::{SystemTime, UNIX_EPOCH};
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut temp_file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| {
            format!(
                "Failed to create temporary file '{}': check directory permissions or disk space",
                temp_path.display()
            )
        })?;

    temp_file.write_all(content).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to write to temporary file '{}': disk may be full",
            temp_path.display()
        )
    })?;

    temp_file.sync_all().with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!("Failed to sync '{}' to disk", temp_path.display())
    })?;
    drop(temp_file);

    // Windows rename fails when the destination exists.
    #[cfg(windows)]
    if dst.exists() {
        std::fs::remove_file(dst).with_context(|| {
            let _ = std::fs::remove_file(&temp_path);
            format!("Failed to remove existing '{}'", dst.display())
        })?;
    }

    std::fs::rename(&temp_path, dst).with_context(|| {
        let _ = std::fs::remove_file(&temp_path);
        format!(
            "Failed to rename '{}' to '{}': check permissions",
            temp_path.display(),
            dst.display()
        )
    })?;

    Ok(())
}
