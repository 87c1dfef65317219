use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::api::DEFAULT_BASE_URL;
use crate::retry::RetryConfig;
use crate::types::{Collection, CompletionPolicy};

/// On-disk config file.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    collections: Vec<Collection>,
    #[serde(default)]
    base_url: Option<String>,
}

/// Application configuration: the config file merged with CLI overrides.
pub struct Config {
    pub token: String,
    pub base_url: String,
    pub directory: PathBuf,
    pub collections: Vec<Collection>,
    pub retry: RetryConfig,
    pub timeout_secs: u64,
    pub completion: CompletionPolicy,
    pub dry_run: bool,
    pub no_progress_bar: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("directory", &self.directory)
            .field("collections", &self.collections)
            .field("completion", &self.completion)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

fn load_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Reading config file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Parsing config file {}", path.display()))
}

/// Keep only the collections named on the command line, in command-line order.
fn select_collections(all: Vec<Collection>, names: &[String]) -> anyhow::Result<Vec<Collection>> {
    if names.is_empty() {
        return Ok(all);
    }
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match all.iter().find(|c| &c.name == name) {
            Some(c) => selected.push(c.clone()),
            None => {
                let available: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
                anyhow::bail!(
                    "Collection '{}' not found in config. Available collections: {:?}",
                    name,
                    available
                );
            }
        }
    }
    Ok(selected)
}

impl Config {
    pub fn from_cli(args: crate::cli::SyncArgs) -> anyhow::Result<Self> {
        let file = load_config_file(&expand_tilde(&args.config))?;

        let token = args
            .token
            .or(file.token)
            .filter(|t| !t.trim().is_empty())
            .context("No access token: set \"token\" in the config file or pass --token")?;

        let base_url = args
            .base_url
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let collections = select_collections(file.collections, &args.collections)?;
        if collections.is_empty() {
            tracing::warn!("No collections configured, nothing to sync");
        }

        Ok(Self {
            token,
            base_url,
            directory: expand_tilde(&args.directory),
            collections,
            retry: RetryConfig {
                max_attempts: args.max_attempts,
                base_delay_secs: args.retry_delay,
                max_delay_secs: args.max_retry_delay,
            },
            timeout_secs: args.timeout,
            completion: args.completion,
            dry_run: args.dry_run,
            no_progress_bar: args.no_progress_bar,
        })
    }
}
