//! Lazily-loaded settings store, one per window.
//!
//! The settings file is opened through the host bridge on first use and the
//! handle is reused for the window's lifetime. A failed load stores nothing,
//! so the next access retries.

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::host::{HostBridge, SettingsStore};
use crate::Result;

pub struct SettingsHandle {
    host: Arc<dyn HostBridge>,
    file: String,
    auto_save_ms: u64,
    cell: OnceCell<Arc<dyn SettingsStore>>,
}

impl SettingsHandle {
    pub fn new(host: Arc<dyn HostBridge>, file: &str, auto_save_ms: u64) -> Self {
        Self {
            host,
            file: file.to_string(),
            auto_save_ms,
            cell: OnceCell::new(),
        }
    }

    /// The settings store, loading it on first call. Concurrent first calls
    /// result in a single load.
    pub async fn get(&self) -> Result<Arc<dyn SettingsStore>> {
        let store = self
            .cell
            .get_or_try_init(|| async {
                log::info!(
                    "[settings] Loading {} (autosave every {} ms)",
                    self.file,
                    self.auto_save_ms
                );
                self.host.load_settings(&self.file, self.auto_save_ms).await
            })
            .await?;
        Ok(Arc::clone(store))
    }
}
