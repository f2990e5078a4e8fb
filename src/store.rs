//! Reactive store for a single window.
//!
//! Every piece of window state lives in a [`Cell`]: a current value that can
//! be read, replaced, and subscribed to. Writes deduplicate by value, so
//! rewriting an equal value never wakes subscribers and never re-triggers a
//! downstream flow.
//!
//! Key cells:
//! - Active page id (with its change epoch) and the active page record
//! - Tag cache and the active-page tags baseline
//! - Window focus flag and the dirty page ids it produces
//! - Loaded page / tag caches for pages referenced by the UI
//! - Toast slot and sidebar section collapse state

use std::collections::{BTreeSet, HashMap};
use tokio::sync::watch;

use crate::page::{PageData, PageId, RelatedPage};
use crate::toast::ToastState;

/// A single observable value.
///
/// Built on a watch channel: the store owns the sender, subscribers hold
/// receivers. A write only notifies when the value actually changed.
pub struct Cell<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone + PartialEq> Cell<T> {
    fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value. Equal values are dropped without notifying.
    pub fn set(&self, value: T) {
        self.tx.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Mutate the value in place. Subscribers are notified only when the
    /// closure left the value different from before.
    pub fn update<F: FnOnce(&mut T)>(&self, f: F) -> bool {
        self.tx.send_if_modified(|current| {
            let before = current.clone();
            f(current);
            *current != before
        })
    }

    /// Receiver that wakes on every subsequent change of this cell.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

/// Active page id together with its change epoch.
///
/// The epoch increments exactly when the id changes value. Flows capture it
/// before a gateway call and compare it afterwards; a moved epoch means the
/// user navigated while the call was in flight and the result is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivePageId {
    pub id: Option<PageId>,
    pub epoch: u64,
}

/// All reactive state of one window.
pub struct PageStore {
    /// Which page the window is on. Seeded from launch parameters before boot.
    pub active_page_id: Cell<ActivePageId>,
    /// Full record of the active page, replaced wholesale.
    pub active_page: Cell<Option<PageData>>,
    /// Set once at the end of a successful boot. Edit flows hold off until then.
    pub is_booted: Cell<bool>,
    /// Tags per page id, merged one page at a time.
    pub tag_cache: Cell<HashMap<PageId, Vec<String>>>,
    /// Last tag set known to be persisted for the active page.
    pub active_tags_baseline: Cell<Vec<String>>,
    /// Pages sharing tags with the active one.
    pub related_pages: Cell<Vec<RelatedPage>>,
    /// Whether the window currently has focus.
    pub is_window_focused: Cell<bool>,
    /// Pages whose cached records may be out of date, published on focus.
    pub dirty_page_ids: Cell<Vec<PageId>>,
    /// Pages the presentation layer has asked to have loaded.
    pub requested_page_ids: Cell<BTreeSet<PageId>>,
    /// Cache of page records referenced by the UI.
    pub loaded_pages: Cell<HashMap<PageId, PageData>>,
    /// Cache of tags for the loaded pages.
    pub loaded_page_tags: Cell<HashMap<PageId, Vec<String>>>,
    /// Single toast slot.
    pub toast: Cell<ToastState>,
    /// Collapse state per sidebar section id, persisted via settings.
    pub sidebar_sections: Cell<HashMap<String, bool>>,
}

impl PageStore {
    pub fn new() -> Self {
        Self {
            active_page_id: Cell::new(ActivePageId::default()),
            active_page: Cell::new(None),
            is_booted: Cell::new(false),
            tag_cache: Cell::new(HashMap::new()),
            active_tags_baseline: Cell::new(Vec::new()),
            related_pages: Cell::new(Vec::new()),
            is_window_focused: Cell::new(true),
            dirty_page_ids: Cell::new(Vec::new()),
            requested_page_ids: Cell::new(BTreeSet::new()),
            loaded_pages: Cell::new(HashMap::new()),
            loaded_page_tags: Cell::new(HashMap::new()),
            toast: Cell::new(ToastState::default()),
            sidebar_sections: Cell::new(HashMap::new()),
        }
    }

    /// Change the active page id, bumping the epoch when the id actually
    /// changes. Rewriting the current id leaves the epoch alone and wakes
    /// nobody.
    pub fn set_active_page_id(&self, id: Option<PageId>) {
        self.active_page_id.update(|state| {
            if state.id != id {
                state.id = id;
                state.epoch += 1;
            }
        });
    }

    /// Overwrite the cached tags for one page. Other entries are untouched.
    pub fn merge_tags(&self, page_id: PageId, tags: Vec<String>) {
        self.tag_cache.update(|cache| {
            cache.insert(page_id, tags);
        });
    }

    /// Commit `tags` as the active-page baseline, but only if `page_id` is
    /// still the active page and no navigation happened since `started_epoch`
    /// was captured. Returns whether the commit happened.
    pub fn commit_baseline_if_active(
        &self,
        page_id: PageId,
        started_epoch: u64,
        tags: Vec<String>,
    ) -> bool {
        let current = self.active_page_id.get();
        if current.epoch != started_epoch || current.id != Some(page_id) {
            return false;
        }
        self.active_tags_baseline.set(tags);
        true
    }

    /// Ids of all currently loaded pages, ascending.
    pub fn snapshot_loaded_ids(&self) -> Vec<PageId> {
        let mut ids: Vec<PageId> = self.loaded_pages.get().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Record that the UI references `page_id` and wants it loaded.
    pub fn mark_page_requested(&self, page_id: PageId) {
        self.requested_page_ids.update(|set| {
            set.insert(page_id);
        });
    }

    pub fn clear_dirty_pages(&self) {
        self.dirty_page_ids.set(Vec::new());
    }

    pub fn merge_loaded_page(&self, page: PageData) {
        self.loaded_pages.update(|pages| {
            pages.insert(page.id, page);
        });
    }

    pub fn merge_loaded_page_tags(&self, page_id: PageId, tags: Vec<String>) {
        self.loaded_page_tags.update(|map| {
            map.insert(page_id, tags);
        });
    }

    pub fn show_toast(&self, toast: ToastState) {
        self.toast.set(toast);
    }

    pub fn dismiss_toast(&self) {
        self.toast.update(|toast| {
            toast.open = false;
        });
    }

    pub fn set_sidebar_section(&self, section_id: &str, collapsed: bool) {
        self.sidebar_sections.update(|sections| {
            sections.insert(section_id.to_string(), collapsed);
        });
    }
}

impl Default for PageStore {
    fn default() -> Self {
        Self::new()
    }
}
