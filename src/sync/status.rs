//! Offline report of what a previous sync left on disk.

use std::path::{Path, PathBuf};

use crate::types::COMPLETION_MARKER;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStatus {
    pub name: String,
    pub things: usize,
    pub complete: usize,
    pub incomplete: Vec<PathBuf>,
}

fn sorted_subdirs(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Scan `directory` for collection folders and count thing folders that carry
/// the completion marker.
pub fn scan(directory: &Path) -> std::io::Result<Vec<CollectionStatus>> {
    let mut statuses = Vec::new();
    for collection_dir in sorted_subdirs(directory)? {
        let name = collection_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut status = CollectionStatus {
            name,
            things: 0,
            complete: 0,
            incomplete: Vec::new(),
        };
        for thing_dir in sorted_subdirs(&collection_dir)? {
            status.things += 1;
            if thing_dir.join(COMPLETION_MARKER).is_file() {
                status.complete += 1;
            } else {
                status.incomplete.push(thing_dir);
            }
        }
        statuses.push(status);
    }
    Ok(statuses)
}
