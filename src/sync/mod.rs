//! Window synchronization context.
//!
//! One [`AppContext`] serves one window for the window's lifetime. It owns
//! the reactive [`PageStore`](crate::store::PageStore), the two external
//! seams (database gateway, host bridge), and every background task spawned
//! on the window's behalf.
//!
//! Flow overview:
//! - `boot` brings the window from launch parameters to a usable page
//! - `sync_tags` pulls one page's tags into the store
//! - `copy_link_to_page` puts a `[[<id>]]` link on the clipboard
//! - `start` spawns the reactive watchers and wires the native menu
//! - `shutdown` stops everything `start` and `boot` left running

pub(crate) mod watchers;

use std::sync::Arc;

use crate::gateway::DatabaseGateway;
use crate::host::HostBridge;
use crate::menu::MenuListeners;
use crate::page::PageId;
use crate::settings::SettingsHandle;
use crate::store::PageStore;
use crate::tasks::TaskTracker;
use crate::toast::ToastState;
use crate::{Result, SyncError};

/// Menu id the copy-link flow is registered under.
pub const MENU_COPY_LINK_TO_PAGE: &str = "copy_link_to_page";

/// Tunables for one window's synchronization layer.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Show `#<id> New page` as the window title when the booted page id has
    /// no database record yet.
    pub placeholder_title_on_missing_page: bool,
    /// Settings file name passed to the host bridge.
    pub settings_file: String,
    /// Host-side autosave interval for the settings file, in milliseconds.
    pub settings_auto_save_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            placeholder_title_on_missing_page: true,
            settings_file: "settings.json".to_string(),
            settings_auto_save_ms: 2000,
        }
    }
}

/// Everything one window needs to keep itself in sync.
pub struct AppContext {
    store: Arc<PageStore>,
    gateway: Arc<dyn DatabaseGateway>,
    host: Arc<dyn HostBridge>,
    tasks: Arc<TaskTracker>,
    settings: Arc<SettingsHandle>,
    menus: MenuListeners,
    config: SyncConfig,
}

impl AppContext {
    /// Build a context. Nothing runs until [`start`](Self::start) and
    /// [`boot`](Self::boot) are called.
    pub fn new(
        gateway: Arc<dyn DatabaseGateway>,
        host: Arc<dyn HostBridge>,
        config: SyncConfig,
    ) -> Self {
        let store = Arc::new(PageStore::new());
        let settings = Arc::new(SettingsHandle::new(
            Arc::clone(&host),
            &config.settings_file,
            config.settings_auto_save_ms,
        ));
        let menus = MenuListeners::new(Arc::clone(&host), Arc::clone(&store));
        Self {
            store,
            gateway,
            host,
            tasks: Arc::new(TaskTracker::new()),
            settings,
            menus,
            config,
        }
    }

    pub fn store(&self) -> &Arc<PageStore> {
        &self.store
    }

    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    pub fn menus(&self) -> &MenuListeners {
        &self.menus
    }

    pub fn settings(&self) -> &Arc<SettingsHandle> {
        &self.settings
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Spawn the reactive watchers and register the native menu handlers.
    /// Called once, before or after [`boot`](Self::boot); the watchers pick
    /// up whatever state is already in the store.
    pub fn start(&self) {
        watchers::spawn_all(self);

        let store = Arc::clone(&self.store);
        let host = Arc::clone(&self.host);
        let tasks = Arc::clone(&self.tasks);
        self.menus.listen(MENU_COPY_LINK_TO_PAGE, move || {
            let store = Arc::clone(&store);
            let host = Arc::clone(&host);
            tasks.spawn("copy_link", async move {
                copy_link_flow(&store, host.as_ref()).await.map(|_| ())
            });
        });

        log::info!("[sync] Watchers and menu handlers started");
    }

    /// Bring the window from launch parameters to a usable page.
    ///
    /// The active page id must already be seeded into the store from the
    /// window's launch parameters. Called at most once per window; a
    /// connection failure leaves the window unbooted.
    pub async fn boot(&self) -> Result<()> {
        self.gateway.connect().await?;

        let page_id = match self.store.active_page_id.get().id {
            Some(id) => id,
            None => return Err(SyncError::MissingPageId),
        };
        log::info!("[boot] Database connected, loading page {}", page_id);

        match self.gateway.fetch_page(page_id).await? {
            Some(page) => {
                self.store.active_page.set(Some(page));

                let store = Arc::clone(&self.store);
                let gateway = Arc::clone(&self.gateway);
                self.tasks.spawn("sync_tags", async move {
                    load_page_tags(&store, gateway.as_ref(), page_id).await
                });
            }
            None => {
                log::warn!("[boot] Page {} has no database record", page_id);
                if self.config.placeholder_title_on_missing_page {
                    let title = format!("#{} New page", page_id);
                    if let Err(e) = self.host.set_window_title(&title).await {
                        log::warn!("[boot] Failed to set placeholder title: {}", e);
                    }
                }
            }
        }

        self.store.is_booted.set(true);
        log::info!("[boot] Complete");
        Ok(())
    }

    /// Pull `page_id`'s tags from the database into the tag cache. When the
    /// page is still the active one afterwards, its tags also become the
    /// active tags baseline.
    pub async fn sync_tags(&self, page_id: PageId) -> Result<()> {
        load_page_tags(&self.store, self.gateway.as_ref(), page_id).await
    }

    /// Copy a `[[<id>]]` link to the active page onto the clipboard.
    ///
    /// Returns `Ok(false)` when no page is active (nothing is copied, no
    /// toast is shown). A clipboard failure surfaces an error toast and
    /// propagates.
    pub async fn copy_link_to_page(&self) -> Result<bool> {
        copy_link_flow(&self.store, self.host.as_ref()).await
    }

    /// Stop every watcher, menu listener, and in-flight background task.
    pub fn shutdown(&self) {
        self.menus.abort_all();
        self.tasks.abort_all();
        log::info!("[sync] Shut down");
    }
}

/// Tag sync flow. The epoch is captured before the gateway call; a commit to
/// the baseline only happens when no navigation intervened and `page_id` is
/// still the active page.
async fn load_page_tags(
    store: &PageStore,
    gateway: &dyn DatabaseGateway,
    page_id: PageId,
) -> Result<()> {
    let started = store.active_page_id.get();
    let tags = gateway.page_tags(page_id).await?;

    store.merge_tags(page_id, tags.clone());
    if store.commit_baseline_if_active(page_id, started.epoch, tags) {
        log::debug!("[sync_tags] Baseline set from page {}", page_id);
    } else {
        log::debug!("[sync_tags] Page {} not active anymore, baseline untouched", page_id);
    }
    Ok(())
}

/// Copy-link flow, shared by the public method and the menu handler.
async fn copy_link_flow(store: &PageStore, host: &dyn HostBridge) -> Result<bool> {
    let page_id = match store.active_page_id.get().id {
        Some(id) => id,
        None => {
            log::debug!("[copy_link] No active page, nothing copied");
            return Ok(false);
        }
    };

    match host.write_clipboard_text(&format!("[[{}]]", page_id)).await {
        Ok(()) => {
            store.show_toast(ToastState::background("Success", "Link copied to clipboard"));
            Ok(true)
        }
        Err(e) => {
            log::warn!("[copy_link] Clipboard write failed: {}", e);
            store.show_toast(ToastState::foreground("Error", "Could not copy link to clipboard"));
            Err(e)
        }
    }
}
