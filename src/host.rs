//! Native host seam.
//!
//! Window title, clipboard, the settings file, and native events (focus,
//! blur, menu picks) all live behind [`HostBridge`]. The production
//! implementation binds the desktop shell; tests use an in-memory fake.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::Result;

/// An event pushed by the native shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The window gained focus.
    WindowFocus,
    /// The window lost focus.
    WindowBlur,
    /// The user picked a native menu item.
    Menu { id: String },
}

/// Access to the native shell hosting the window.
#[async_trait]
pub trait HostBridge: Send + Sync {
    async fn set_window_title(&self, title: &str) -> Result<()>;

    async fn write_clipboard_text(&self, text: &str) -> Result<()>;

    /// Open the named settings file, autosaving dirty values every
    /// `auto_save_ms` milliseconds. Called once per window; see
    /// [`crate::settings::SettingsHandle`].
    async fn load_settings(&self, file: &str, auto_save_ms: u64) -> Result<Arc<dyn SettingsStore>>;

    /// Stream of host events. Each subscriber gets every event from the
    /// point of subscription on; dropping the receiver unsubscribes.
    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent>;
}

/// A loaded settings file, keyed JSON values with host-side autosave.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Flush to disk now instead of waiting for autosave.
    async fn save(&self) -> Result<()>;
}
