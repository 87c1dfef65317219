use std::path::{Path, PathBuf};

use indicatif::ProgressBar;

use super::error::SyncError;
use super::file::write_atomic;
use super::paths::{clean_filename, filename_from_url, split_extension};
use crate::api::{ImageDescriptor, ThingsApi};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Downloaded(PathBuf),
    AlreadyPresent,
    /// The descriptor offers no display/large rendition.
    NoDisplayVariant,
}

/// Rename `name` so its extension matches the format sniffed from `bytes`.
///
/// Names whose extension already belongs to the sniffed format are kept, as
/// are names for bytes of an unrecognised format.
pub fn corrected_image_name(name: &str, bytes: &[u8]) -> String {
    let Ok(format) = image::guess_format(bytes) else {
        return name.to_string();
    };
    let extensions = format.extensions_str();
    let Some(canonical) = extensions.first() else {
        return name.to_string();
    };
    match split_extension(name) {
        (_, Some(ext)) if extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) => {
            name.to_string()
        }
        (stem, _) => format!("{}.{}", stem, canonical),
    }
}

/// `part.png` -> `part-{id}.png`, for a corrected name already taken by a
/// different image.
fn disambiguated_name(name: &str, image_id: u64) -> String {
    match split_extension(name) {
        (stem, Some(ext)) => format!("{}-{}.{}", stem, image_id, ext),
        (stem, None) => format!("{}-{}", stem, image_id),
    }
}

/// Whether `path` exists and holds something other than `bytes`.
async fn holds_other_content(path: &Path, bytes: &[u8]) -> bool {
    matches!(tokio::fs::read(path).await, Ok(existing) if existing != bytes)
}

/// Store `bytes` at `path` unless an identical copy is already there.
async fn store(path: PathBuf, bytes: &[u8]) -> Result<ImageOutcome, SyncError> {
    if let Ok(existing) = tokio::fs::read(&path).await {
        if existing == bytes {
            return Ok(ImageOutcome::AlreadyPresent);
        }
    }
    write_atomic(&path, bytes).await?;
    Ok(ImageOutcome::Downloaded(path))
}

/// Download the display/large rendition of `image` into `dir`.
///
/// An image stored under its own name is never fetched again. One whose
/// extension was corrected is fetched and compared against the corrected
/// file, so a second image sharing the stem is still stored.
pub async fn download_image(
    api: &ThingsApi,
    image: &ImageDescriptor,
    dir: &Path,
    pb: &ProgressBar,
) -> Result<ImageOutcome, SyncError> {
    let Some(variant) = image.display_large() else {
        pb.suspend(|| {
            tracing::warn!(
                "Image {:?} ({}) has no display/large rendition, skipping",
                image.name,
                image.id.map(|id| id.to_string()).unwrap_or_default()
            )
        });
        return Ok(ImageOutcome::NoDisplayVariant);
    };

    let name = match clean_filename(&image.name) {
        n if !n.is_empty() => n,
        _ => match clean_filename(filename_from_url(&variant.url)) {
            n if !n.is_empty() => n,
            _ => format!("image-{}", image.id.unwrap_or_default()),
        },
    };

    let requested = dir.join(&name);
    if requested.exists() {
        tracing::debug!("Already have image {}", requested.display());
        return Ok(ImageOutcome::AlreadyPresent);
    }

    tokio::fs::create_dir_all(dir).await?;
    let bytes = api.download_image(&variant.url).await?;

    let final_name = corrected_image_name(&name, &bytes);
    if final_name == name {
        return store(requested, &bytes).await;
    }

    tracing::debug!("Correcting image name {} -> {}", name, final_name);
    let corrected = dir.join(&final_name);
    let target = if holds_other_content(&corrected, &bytes).await {
        dir.join(disambiguated_name(&final_name, image.id.unwrap_or_default()))
    } else {
        corrected
    };
    store(target, &bytes).await
}
