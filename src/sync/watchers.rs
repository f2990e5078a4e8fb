//! Long-lived reactive watcher tasks.
//!
//! Each watcher subscribes to the store cells it depends on, reacts to the
//! current state, then sleeps until one of them changes. Cell writes
//! deduplicate by value, so a watcher only wakes for real changes. Watchers
//! run until the window shuts down; per-iteration failures are logged and
//! the loop keeps going.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use crate::gateway::DatabaseGateway;
use crate::host::{HostBridge, HostEvent};
use crate::page::PageId;
use crate::settings::SettingsHandle;
use crate::store::PageStore;
use crate::Result;

use super::AppContext;

/// Settings key holding the sidebar collapse state.
const SIDEBAR_SECTIONS_KEY: &str = "sidebar_section_collapsed_state";

/// Spawn the full watcher set for one window.
pub(crate) fn spawn_all(ctx: &AppContext) {
    ctx.tasks.spawn(
        "related_pages",
        related_pages(Arc::clone(&ctx.store), Arc::clone(&ctx.gateway)),
    );
    ctx.tasks.spawn(
        "title_sync",
        title_sync(Arc::clone(&ctx.store), Arc::clone(&ctx.host)),
    );
    ctx.tasks.spawn(
        "window_focus",
        window_focus(Arc::clone(&ctx.store), Arc::clone(&ctx.host)),
    );
    ctx.tasks.spawn(
        "page_refresh",
        page_refresh(Arc::clone(&ctx.store), Arc::clone(&ctx.gateway)),
    );
    ctx.tasks.spawn(
        "tag_persist",
        tag_persist(Arc::clone(&ctx.store), Arc::clone(&ctx.gateway)),
    );
    ctx.tasks.spawn(
        "sidebar",
        sidebar_sections(Arc::clone(&ctx.store), Arc::clone(&ctx.settings)),
    );
}

/// Keeps the related-pages list in step with the active page and its tags
/// baseline. A response that lands after a navigation is dropped.
pub(crate) async fn related_pages(store: Arc<PageStore>, gateway: Arc<dyn DatabaseGateway>) -> Result<()> {
    let mut id_rx = store.active_page_id.subscribe();
    let mut baseline_rx = store.active_tags_baseline.subscribe();

    loop {
        id_rx.borrow_and_update();
        baseline_rx.borrow_and_update();

        let started = store.active_page_id.get();
        if let Some(page_id) = started.id {
            match gateway.related_pages(page_id).await {
                Ok(related) => {
                    if store.active_page_id.get().epoch == started.epoch {
                        store.related_pages.set(related);
                    } else {
                        log::debug!("[related_pages] Dropping stale result for page {}", page_id);
                    }
                }
                Err(e) => {
                    log::warn!("[related_pages] Failed to load for page {}: {}", page_id, e);
                }
            }
        }

        tokio::select! {
            changed = id_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = baseline_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Mirrors the active page record into the window title as `#<id> <title>`.
pub(crate) async fn title_sync(store: Arc<PageStore>, host: Arc<dyn HostBridge>) -> Result<()> {
    let mut page_rx = store.active_page.subscribe();

    loop {
        let page = page_rx.borrow_and_update().clone();
        if let Some(page) = page {
            if let Err(e) = host.set_window_title(&page.window_title()).await {
                log::warn!("[title_sync] Failed to set window title: {}", e);
            }
        }

        if page_rx.changed().await.is_err() {
            break;
        }
    }
    Ok(())
}

/// Tracks window focus. Regaining focus marks every loaded page dirty, since
/// another window may have edited them while this one was in the background.
pub(crate) async fn window_focus(store: Arc<PageStore>, host: Arc<dyn HostBridge>) -> Result<()> {
    let mut events = host.subscribe_events();

    loop {
        match events.recv().await {
            Ok(HostEvent::WindowFocus) => {
                store.is_window_focused.set(true);
                let ids = store.snapshot_loaded_ids();
                log::debug!("[window_focus] Focused, {} page(s) marked dirty", ids.len());
                store.dirty_page_ids.set(ids);
            }
            Ok(HostEvent::WindowBlur) => {
                store.is_window_focused.set(false);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("[window_focus] Lagged, {} event(s) skipped", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
    Ok(())
}

/// Loads pages the UI references but the cache is missing, plus everything
/// marked dirty. The dirty list is cleared as soon as a batch is picked up;
/// a failed id is logged and skipped, not retried.
pub(crate) async fn page_refresh(store: Arc<PageStore>, gateway: Arc<dyn DatabaseGateway>) -> Result<()> {
    let mut dirty_rx = store.dirty_page_ids.subscribe();
    let mut requested_rx = store.requested_page_ids.subscribe();
    let mut loaded_rx = store.loaded_pages.subscribe();

    loop {
        dirty_rx.borrow_and_update();
        requested_rx.borrow_and_update();
        loaded_rx.borrow_and_update();

        let loaded = store.loaded_pages.get();
        let mut need: BTreeSet<PageId> = store
            .requested_page_ids
            .get()
            .into_iter()
            .filter(|id| !loaded.contains_key(id))
            .collect();
        need.extend(store.dirty_page_ids.get());

        if !need.is_empty() {
            store.clear_dirty_pages();
            log::debug!("[page_refresh] Loading {} page(s)", need.len());

            for page_id in need {
                match gateway.fetch_page(page_id).await {
                    Ok(Some(page)) => store.merge_loaded_page(page),
                    Ok(None) => log::debug!("[page_refresh] Page {} has no record", page_id),
                    Err(e) => {
                        log::warn!("[page_refresh] Failed to fetch page {}: {}", page_id, e);
                        continue;
                    }
                }
                match gateway.page_tags(page_id).await {
                    Ok(tags) => store.merge_loaded_page_tags(page_id, tags),
                    Err(e) => {
                        log::warn!("[page_refresh] Failed to fetch tags for page {}: {}", page_id, e);
                    }
                }
            }
        }

        tokio::select! {
            changed = dirty_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = requested_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = loaded_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Writes edited tags of the active page back to the database, then advances
/// the baseline. Holds off until boot finished; skips when the cached tags
/// already match the baseline. A write that finishes after a navigation
/// leaves the baseline alone.
pub(crate) async fn tag_persist(store: Arc<PageStore>, gateway: Arc<dyn DatabaseGateway>) -> Result<()> {
    let mut cache_rx = store.tag_cache.subscribe();
    let mut baseline_rx = store.active_tags_baseline.subscribe();
    let mut booted_rx = store.is_booted.subscribe();

    loop {
        cache_rx.borrow_and_update();
        baseline_rx.borrow_and_update();
        booted_rx.borrow_and_update();

        if store.is_booted.get() {
            let started = store.active_page_id.get();
            if let Some(page_id) = started.id {
                let tags = store.tag_cache.get().get(&page_id).cloned();
                if let Some(tags) = tags {
                    if tags != store.active_tags_baseline.get() {
                        match gateway.set_page_tags(page_id, &tags).await {
                            Ok(()) => {
                                let count = tags.len();
                                if store.commit_baseline_if_active(page_id, started.epoch, tags) {
                                    log::debug!(
                                        "[tag_persist] Saved {} tag(s) for page {}",
                                        count,
                                        page_id
                                    );
                                } else {
                                    log::debug!(
                                        "[tag_persist] Page {} changed mid-save, baseline untouched",
                                        page_id
                                    );
                                }
                            }
                            Err(e) => {
                                log::warn!(
                                    "[tag_persist] Failed to save tags for page {}: {}",
                                    page_id,
                                    e
                                );
                            }
                        }
                    }
                }
            }
        }

        tokio::select! {
            changed = cache_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = baseline_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = booted_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Restores the sidebar collapse state from settings, then persists every
/// non-empty change back. Settings failures are logged and skipped; the
/// collapse state is cosmetic.
pub(crate) async fn sidebar_sections(store: Arc<PageStore>, settings: Arc<SettingsHandle>) -> Result<()> {
    match settings.get().await {
        Ok(file) => {
            if let Some(value) = file.get(SIDEBAR_SECTIONS_KEY).await {
                match serde_json::from_value::<HashMap<String, bool>>(value) {
                    Ok(saved) if !saved.is_empty() => {
                        log::debug!("[sidebar] Restored {} section(s)", saved.len());
                        store.sidebar_sections.set(saved);
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("[sidebar] Ignoring malformed saved state: {}", e),
                }
            }
        }
        Err(e) => log::warn!("[sidebar] Settings unavailable, state not restored: {}", e),
    }

    let mut rx = store.sidebar_sections.subscribe();
    loop {
        if rx.changed().await.is_err() {
            break;
        }
        let sections = rx.borrow_and_update().clone();
        if sections.is_empty() {
            continue;
        }

        let file = match settings.get().await {
            Ok(file) => file,
            Err(e) => {
                log::warn!("[sidebar] Settings unavailable, state not saved: {}", e);
                continue;
            }
        };
        match serde_json::to_value(&sections) {
            Ok(value) => {
                if let Err(e) = file.set(SIDEBAR_SECTIONS_KEY, value).await {
                    log::warn!("[sidebar] Failed to save state: {}", e);
                }
            }
            Err(e) => log::warn!("[sidebar] Failed to encode state: {}", e),
        }
    }
    Ok(())
}
