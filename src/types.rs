use std::path::Path;

use serde::Deserialize;

/// A remote collection and the local directory name it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Collection {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// How a thing directory is recognised as fully synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CompletionPolicy {
    /// A `.complete` marker written after every download succeeded.
    Marker,
    /// The directory merely existing, even if an earlier run was interrupted.
    Directory,
}

/// Written last into a thing directory once everything in it is in place.
pub const COMPLETION_MARKER: &str = ".complete";

impl CompletionPolicy {
    pub fn is_complete(&self, thing_dir: &Path) -> bool {
        match self {
            CompletionPolicy::Marker => thing_dir.join(COMPLETION_MARKER).is_file(),
            CompletionPolicy::Directory => thing_dir.is_dir(),
        }
    }
}
