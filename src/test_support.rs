//! In-memory fakes of the database gateway and host bridge, plus small
//! helpers shared by the test modules.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::gateway::DatabaseGateway;
use crate::host::{HostBridge, HostEvent, SettingsStore};
use crate::page::{PageData, PageId, RelatedPage};
use crate::{Result, SyncError};

/// Page record fixture.
pub fn page(id: PageId, title: &str) -> PageData {
    PageData {
        id,
        title: title.to_string(),
        filename: format!("{}.md", id),
        markdown_text: format!("# {}", title),
        view_count: 0,
        last_viewed_at: None,
        created_at: Some(Utc::now()),
        archived_at: None,
    }
}

pub fn tags(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Let spawned tasks and watcher loops process everything already queued.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Poll `pred` until it holds, panicking after two seconds.
pub async fn wait_until(what: &str, pred: impl Fn() -> bool) {
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while !pred() {
        if std::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

// ===== Database gateway fake =====

/// Gateway backed by hash maps, with injectable failures, an optional
/// artificial latency, and a call log.
#[derive(Default)]
pub struct MockGateway {
    pages: Mutex<HashMap<PageId, PageData>>,
    tags: Mutex<HashMap<PageId, Vec<String>>>,
    related: Mutex<HashMap<PageId, Vec<RelatedPage>>>,
    delay: Mutex<Duration>,
    fail_connect: AtomicBool,
    fail_fetch_page: AtomicBool,
    fail_page_tags: AtomicBool,
    fail_related: AtomicBool,
    fail_set_tags: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_page(&self, page: PageData) {
        self.pages.lock().unwrap().insert(page.id, page);
    }

    pub fn seed_tags(&self, page_id: PageId, tags: Vec<String>) {
        self.tags.lock().unwrap().insert(page_id, tags);
    }

    pub fn seed_related(&self, page_id: PageId, related: Vec<RelatedPage>) {
        self.related.lock().unwrap().insert(page_id, related);
    }

    /// Tags currently persisted for a page, as the database sees them.
    pub fn stored_tags(&self, page_id: PageId) -> Option<Vec<String>> {
        self.tags.lock().unwrap().get(&page_id).cloned()
    }

    /// Sleep this long inside every gateway call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_fetch_page(&self, fail: bool) {
        self.fail_fetch_page.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_page_tags(&self, fail: bool) {
        self.fail_page_tags.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_related(&self, fail: bool) {
        self.fail_related.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_set_tags(&self, fail: bool) {
        self.fail_set_tags.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of logged calls starting with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    async fn enter(&self, call: String, fail: &AtomicBool) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fail.load(Ordering::SeqCst) {
            return Err(SyncError::Gateway("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseGateway for MockGateway {
    async fn connect(&self) -> Result<()> {
        self.enter("connect".to_string(), &self.fail_connect).await
    }

    async fn fetch_page(&self, page_id: PageId) -> Result<Option<PageData>> {
        self.enter(format!("fetch_page({})", page_id), &self.fail_fetch_page)
            .await?;
        Ok(self.pages.lock().unwrap().get(&page_id).cloned())
    }

    async fn page_tags(&self, page_id: PageId) -> Result<Vec<String>> {
        self.enter(format!("page_tags({})", page_id), &self.fail_page_tags)
            .await?;
        Ok(self.tags.lock().unwrap().get(&page_id).cloned().unwrap_or_default())
    }

    async fn related_pages(&self, page_id: PageId) -> Result<Vec<RelatedPage>> {
        self.enter(format!("related_pages({})", page_id), &self.fail_related)
            .await?;
        Ok(self.related.lock().unwrap().get(&page_id).cloned().unwrap_or_default())
    }

    async fn set_page_tags(&self, page_id: PageId, tags: &[String]) -> Result<()> {
        self.enter(format!("set_page_tags({})", page_id), &self.fail_set_tags)
            .await?;
        self.tags.lock().unwrap().insert(page_id, tags.to_vec());
        Ok(())
    }
}

// ===== Host bridge fake =====

/// Settings store backed by a hash map.
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, Value>>,
    saves: AtomicUsize,
    fail_set: AtomicBool,
}

impl MemorySettings {
    pub fn seed(&self, key: &str, value: Value) {
        self.values.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn set_fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(SyncError::Host("injected failure".to_string()));
        }
        self.values.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Host bridge recording titles and clipboard writes, with an event channel
/// tests push into.
pub struct MockHost {
    titles: Mutex<Vec<String>>,
    clipboard: Mutex<Vec<String>>,
    fail_title: AtomicBool,
    fail_clipboard: AtomicBool,
    fail_settings: AtomicBool,
    events: broadcast::Sender<HostEvent>,
    settings: Arc<MemorySettings>,
    settings_loads: AtomicUsize,
}

impl MockHost {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            titles: Mutex::new(Vec::new()),
            clipboard: Mutex::new(Vec::new()),
            fail_title: AtomicBool::new(false),
            fail_clipboard: AtomicBool::new(false),
            fail_settings: AtomicBool::new(false),
            events,
            settings: Arc::new(MemorySettings::default()),
            settings_loads: AtomicUsize::new(0),
        }
    }

    /// Push a host event to every subscriber.
    pub fn emit(&self, event: HostEvent) {
        let _ = self.events.send(event);
    }

    pub fn titles(&self) -> Vec<String> {
        self.titles.lock().unwrap().clone()
    }

    pub fn last_title(&self) -> Option<String> {
        self.titles.lock().unwrap().last().cloned()
    }

    pub fn clipboard(&self) -> Vec<String> {
        self.clipboard.lock().unwrap().clone()
    }

    pub fn settings_store(&self) -> Arc<MemorySettings> {
        Arc::clone(&self.settings)
    }

    pub fn settings_loads(&self) -> usize {
        self.settings_loads.load(Ordering::SeqCst)
    }

    pub fn set_fail_title(&self, fail: bool) {
        self.fail_title.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_clipboard(&self, fail: bool) {
        self.fail_clipboard.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_settings(&self, fail: bool) {
        self.fail_settings.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostBridge for MockHost {
    async fn set_window_title(&self, title: &str) -> Result<()> {
        if self.fail_title.load(Ordering::SeqCst) {
            return Err(SyncError::Host("injected failure".to_string()));
        }
        self.titles.lock().unwrap().push(title.to_string());
        Ok(())
    }

    async fn write_clipboard_text(&self, text: &str) -> Result<()> {
        if self.fail_clipboard.load(Ordering::SeqCst) {
            return Err(SyncError::Host("injected failure".to_string()));
        }
        self.clipboard.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn load_settings(&self, _file: &str, _auto_save_ms: u64) -> Result<Arc<dyn SettingsStore>> {
        // Stay in flight briefly so concurrent first loads overlap
        tokio::time::sleep(Duration::from_millis(2)).await;
        if self.fail_settings.load(Ordering::SeqCst) {
            return Err(SyncError::Host("injected failure".to_string()));
        }
        self.settings_loads.fetch_add(1, Ordering::SeqCst);
        let store: Arc<dyn SettingsStore> = self.settings.clone();
        Ok(store)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }
}
