//! Sync engine: walks a collection page by page and mirrors each thing into
//! `{directory}/{collection}/{thing}/`.
//!
//! Everything runs sequentially. A thing is skipped, with no network calls,
//! once the configured [`CompletionPolicy`] considers its directory complete;
//! anything missing from an incomplete directory is filled in on the next run.

pub mod error;
pub mod file;
pub mod paths;
pub mod preview;
pub mod status;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::api::{ThingSummary, ThingsApi};
use crate::types::{Collection, CompletionPolicy, COMPLETION_MARKER};

pub use error::SyncError;

/// Subset of application config consumed by the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub(crate) directory: PathBuf,
    pub(crate) completion: CompletionPolicy,
    pub(crate) dry_run: bool,
    pub(crate) no_progress_bar: bool,
}

/// What happened to a single thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThingOutcome {
    AlreadyComplete,
    /// Detail fetch failed; nothing was written and the next run retries it.
    Unavailable,
    Synced,
    /// Directory written but some downloads failed; no completion marker.
    Partial { failures: usize },
    /// The thing directory could not be created.
    Failed,
    DryRun,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub pages_fetched: u32,
    pub seen: usize,
    pub already_complete: usize,
    pub synced: usize,
    pub partial: usize,
    pub failed_steps: usize,
    pub unavailable: usize,
    pub failed: usize,
    pub dry_run: usize,
    pub interrupted: bool,
}

impl CollectionSummary {
    fn record(&mut self, outcome: ThingOutcome) {
        self.seen += 1;
        match outcome {
            ThingOutcome::AlreadyComplete => self.already_complete += 1,
            ThingOutcome::Unavailable => self.unavailable += 1,
            ThingOutcome::Synced => self.synced += 1,
            ThingOutcome::Partial { failures } => {
                self.partial += 1;
                self.failed_steps += failures;
            }
            ThingOutcome::Failed => self.failed += 1,
            ThingOutcome::DryRun => self.dry_run += 1,
        }
    }
}

/// Spinner for a collection walk; the total is unknown until the last page.
///
/// Hidden when disabled or when stdout is not a TTY.
fn create_spinner(no_progress_bar: bool, collection: &str) -> ProgressBar {
    if no_progress_bar || !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {prefix}: {pos} things {msg}")
            .expect("valid template"),
    );
    pb.set_prefix(collection.to_string());
    pb
}

/// Walk every page of `collection`, starting at page 1, until the server
/// returns an empty page.
///
/// A page that cannot be listed ends the walk with [`SyncError::Listing`].
/// Cancelling `shutdown` stops the walk at the next thing boundary.
pub async fn sync_collection(
    api: &ThingsApi,
    collection: &Collection,
    config: &SyncConfig,
    shutdown: &CancellationToken,
) -> Result<CollectionSummary, SyncError> {
    let collection_dir = config.directory.join(&collection.name);
    if !config.dry_run {
        tokio::fs::create_dir_all(&collection_dir).await?;
    }

    let pb = create_spinner(config.no_progress_bar, &collection.name);
    let mut summary = CollectionSummary::default();
    let mut page: u32 = 1;
    let mut index: usize = 1;

    loop {
        let things = api
            .collection_things(collection.id, page)
            .await
            .map_err(|source| SyncError::Listing {
                collection: collection.name.clone(),
                page,
                source,
            })?;
        summary.pages_fetched += 1;
        pb.suspend(|| tracing::info!("found {} things on page {}", things.len(), page));

        if things.is_empty() {
            break;
        }

        for thing in &things {
            if shutdown.is_cancelled() {
                pb.suspend(|| tracing::info!("Shutdown requested, stopping '{}'", collection.name));
                summary.interrupted = true;
                pb.finish_and_clear();
                return Ok(summary);
            }

            pb.set_message(thing.name.trim().to_string());
            pb.suspend(|| {
                tracing::info!("downloading {}. {} ({})", index, thing.name.trim(), thing.id)
            });
            let outcome = sync_thing(api, &collection_dir, thing, config, &pb).await;
            summary.record(outcome);
            index += 1;
            pb.inc(1);
        }

        page += 1;
    }

    pb.finish_and_clear();
    Ok(summary)
}

/// Mirror one thing into `collection_dir`.
///
/// Never fails the walk: every failure is logged and reported through the
/// returned [`ThingOutcome`].
async fn sync_thing(
    api: &ThingsApi,
    collection_dir: &Path,
    summary: &ThingSummary,
    config: &SyncConfig,
    pb: &ProgressBar,
) -> ThingOutcome {
    let thing_dir = collection_dir.join(paths::cleaned_folder_name(&summary.name, summary.id));

    if config.completion.is_complete(&thing_dir) {
        tracing::debug!("{} is complete, skipping", thing_dir.display());
        return ThingOutcome::AlreadyComplete;
    }

    if config.dry_run {
        pb.suspend(|| {
            tracing::info!("[DRY RUN] Would sync {} into {}", summary.id, thing_dir.display())
        });
        return ThingOutcome::DryRun;
    }

    let thing = match api.thing(summary.id).await {
        Ok(thing) => thing,
        Err(e) => {
            pb.suspend(|| tracing::warn!("Unable to fetch info for {}: {}", summary.id, e));
            return ThingOutcome::Unavailable;
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(&thing_dir).await {
        pb.suspend(|| tracing::error!("Unable to create {}: {}", thing_dir.display(), e));
        return ThingOutcome::Failed;
    }
    let id = thing.id;
    let mut failures = 0;

    failures += write_metadata(api, &thing, id, &thing_dir, pb).await;

    if let Some(default_image) = &thing.default_image {
        match preview::download_image(api, default_image, &thing_dir, pb).await {
            Ok(preview::ImageOutcome::Downloaded(path)) => {
                tracing::debug!("Saved default image {}", path.display())
            }
            Ok(_) => {}
            Err(e) => {
                pb.suspend(|| {
                    tracing::warn!("Unable to download default image of {}: {}", id, e)
                });
                failures += 1;
            }
        }
    }

    failures += download_gallery(api, id, &thing_dir.join("images"), pb).await;

    match file::download_attachments(api, id, &thing_dir.join("files"), pb).await {
        Ok(report) => {
            tracing::debug!(
                "files of {}: {} downloaded, {} already present, {} failed",
                id,
                report.downloaded,
                report.skipped,
                report.failed
            );
            failures += report.failed;
        }
        Err(e) => {
            pb.suspend(|| tracing::warn!("Unable to download files of {}: {}", id, e));
            failures += 1;
        }
    }

    if failures > 0 {
        pb.suspend(|| {
            tracing::warn!("{} incomplete: {} step(s) failed", thing_dir.display(), failures)
        });
        return ThingOutcome::Partial { failures };
    }

    if config.completion == CompletionPolicy::Marker {
        let stamp = chrono::Utc::now().to_rfc3339();
        if let Err(e) = file::write_atomic(&thing_dir.join(COMPLETION_MARKER), stamp.as_bytes()).await
        {
            pb.suspend(|| tracing::warn!("Unable to mark {} complete: {}", thing_dir.display(), e));
            return ThingOutcome::Partial { failures: 1 };
        }
    }

    ThingOutcome::Synced
}

/// Write description, id marker, shortcut and ancestors. Files that already
/// exist are left alone. Returns the number of failed steps.
async fn write_metadata(
    api: &ThingsApi,
    thing: &crate::api::Thing,
    id: u64,
    thing_dir: &Path,
    pb: &ProgressBar,
) -> usize {
    let mut failures = 0;

    let description = thing.description.as_deref().unwrap_or_default();
    let mut text_files = vec![
        (thing_dir.join("description.txt"), description.to_string()),
        (paths::id_file(thing_dir, id), id.to_string()),
    ];
    match &thing.public_url {
        Some(url) => text_files.push((paths::shortcut_file(thing_dir, id), paths::shortcut_contents(url))),
        None => pb.suspend(|| tracing::warn!("Thing {} has no public URL, skipping shortcut", id)),
    }

    for (path, contents) in &text_files {
        if let Err(e) = file::write_if_missing(path, contents).await {
            pb.suspend(|| tracing::warn!("Unable to write {}: {}", path.display(), e));
            failures += 1;
        }
    }

    let ancestors_path = paths::ancestors_file(thing_dir, id);
    if !ancestors_path.exists() {
        // Requested without a page number: the listing page a thing was found
        // on says nothing about its lineage.
        let written = match api.ancestors(id).await {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(pretty) => file::write_atomic(&ancestors_path, pretty.as_bytes())
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            },
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = written {
            pb.suspend(|| tracing::warn!("Unable to save ancestors of {}: {}", id, e));
            failures += 1;
        }
    }

    failures
}

/// Download every additional image of a thing. Returns the number of failures.
async fn download_gallery(
    api: &ThingsApi,
    thing_id: u64,
    images_dir: &Path,
    pb: &ProgressBar,
) -> usize {
    if let Err(e) = tokio::fs::create_dir_all(images_dir).await {
        pb.suspend(|| tracing::warn!("Unable to create {}: {}", images_dir.display(), e));
        return 1;
    }

    let images = match api.images(thing_id).await {
        Ok(images) => images,
        Err(e) => {
            pb.suspend(|| tracing::warn!("Unable to find {} images: {}", thing_id, e));
            return 1;
        }
    };

    let mut failures = 0;
    for img in &images {
        match preview::download_image(api, img, images_dir, pb).await {
            Ok(preview::ImageOutcome::Downloaded(path)) => {
                tracing::debug!("Saved image {}", path.display())
            }
            Ok(_) => {}
            Err(e) => {
                pb.suspend(|| {
                    tracing::warn!("Unable to download image {:?} of {}: {}", img.name, thing_id, e)
                });
                failures += 1;
            }
        }
    }
    failures
}
