//! Durable key/value store for system configuration.
//!
//! `serve` persists the ports it listens on here so other parts of the system
//! can find them without extra CLI plumbing, including across restarts.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use anyhow::Context;
use thiserror::Error;

use crate::lifecycle::Subsystem;

/// Keys written by the serve bootstrap
pub const HTTPS_PORT: &str = "https_port";
pub const HTTP_PORT: &str = "http_port";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("config store is not open")]
    NotOpen,

    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persistent config with a read-through cache
pub trait ConfigStore: Subsystem {
    /// Durably write `value` under `key`; the cache reflects it once this returns
    fn put_config(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Cached value for `key`
    fn config_cache(&self, key: &str) -> Option<String>;
}

#[derive(Default)]
struct StoreState {
    open: bool,
    values: BTreeMap<String, String>,
}

/// Config store backed by a single JSON document
pub struct FileConfigStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl FileConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: RwLock::new(StoreState::default()),
        }
    }

    fn write_document(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(values)?;
        let tmp_path = self.path.with_extension("json.tmp");

        std::fs::write(&tmp_path, contents)
            .and_then(|()| std::fs::rename(&tmp_path, &self.path))
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

impl Subsystem for FileConfigStore {
    fn name(&self) -> &'static str {
        "config-store"
    }

    fn init(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }

        let values = if self.path.exists() {
            let contents =
                std::fs::read_to_string(&self.path).context("Failed to read config store")?;
            serde_json::from_str(&contents).context("Failed to parse config store")?
        } else {
            BTreeMap::new()
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.values = values;
        state.open = true;
        Ok(())
    }

    fn close(&self) -> anyhow::Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.open = false;
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn put_config(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.open {
            return Err(StoreError::NotOpen);
        }

        let mut values = state.values.clone();
        values.insert(key.to_string(), value.to_string());
        self.write_document(&values)?;

        state.values = values;
        tracing::debug!(key, value, "Persisted config");
        Ok(())
    }

    fn config_cache(&self, key: &str) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values
            .get(key)
            .cloned()
    }
}
