use std::path::Path;

use indicatif::ProgressBar;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::SyncError;
use super::paths;
use crate::api::ThingsApi;

/// A downloaded file at or below this size is treated as a failed transfer
/// and fetched again.
pub const MIN_COMPLETE_FILE_SIZE: u64 = 1000;

/// Result of mirroring a thing's attached files.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Write `bytes` to a `.part` sibling, then rename it over `path`.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let part = paths::part_path(path);
    let mut file = fs::File::create(&part).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);
    fs::rename(&part, path).await
}

/// Write a small text file unless it already exists.
pub async fn write_if_missing(path: &Path, contents: &str) -> std::io::Result<()> {
    if fs::try_exists(path).await? {
        return Ok(());
    }
    write_atomic(path, contents.as_bytes()).await
}

/// Whether a previously downloaded file looks like a finished transfer.
pub fn is_complete_download(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > MIN_COMPLETE_FILE_SIZE)
        .unwrap_or(false)
}

/// Download every file attached to `thing_id` into `files_dir`.
///
/// Files already present and larger than [`MIN_COMPLETE_FILE_SIZE`] are kept.
/// A failed listing is returned as an error; individual download failures are
/// counted and the remaining files are still attempted.
pub async fn download_attachments(
    api: &ThingsApi,
    thing_id: u64,
    files_dir: &Path,
    pb: &ProgressBar,
) -> Result<AttachmentReport, SyncError> {
    fs::create_dir_all(files_dir).await?;
    let files = api.files(thing_id).await?;

    let mut report = AttachmentReport::default();
    for file in &files {
        let name = paths::clean_filename(&file.name);
        let name = if name.is_empty() {
            format!("file-{}", file.id)
        } else {
            name
        };
        let path = files_dir.join(&name);

        if is_complete_download(&path) {
            tracing::debug!("Already have {}", path.display());
            report.skipped += 1;
            continue;
        }

        let bytes = match api.download_file(&file.download_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                pb.suspend(|| {
                    tracing::warn!("Unable to download file {} of thing {}: {}", file.id, thing_id, e)
                });
                report.failed += 1;
                continue;
            }
        };

        if let Some(expected) = file.size {
            if expected != bytes.len() as u64 {
                pb.suspend(|| {
                    tracing::warn!(
                        "{}: expected {} bytes, got {}",
                        path.display(),
                        expected,
                        bytes.len()
                    )
                });
            }
        }

        if let Err(e) = write_atomic(&path, &bytes).await {
            pb.suspend(|| tracing::warn!("Unable to write {}: {}", path.display(), e));
            report.failed += 1;
            continue;
        }
        tracing::debug!(size_bytes = bytes.len(), path = %path.display(), "downloaded");
        report.downloaded += 1;
    }

    Ok(report)
}
