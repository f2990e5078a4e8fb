//! Native menu dispatch.
//!
//! One listener task per menu id, fed from the host event stream. A menu
//! pick only dispatches while the window is focused, so a shortcut shared by
//! several windows runs in exactly the one the user is looking at.
//! Registering an id again replaces the previous listener.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::host::{HostBridge, HostEvent};
use crate::store::PageStore;

pub struct MenuListeners {
    host: Arc<dyn HostBridge>,
    store: Arc<PageStore>,
    listeners: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl MenuListeners {
    pub fn new(host: Arc<dyn HostBridge>, store: Arc<PageStore>) -> Self {
        Self {
            host,
            store,
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Dispatch `handler` whenever `menu_id` is picked while the window is
    /// focused. A previous listener for the same id is stopped first.
    pub fn listen<F>(&self, menu_id: &str, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut events = self.host.subscribe_events();
        let store = Arc::clone(&self.store);
        let id = menu_id.to_string();

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(HostEvent::Menu { id: picked }) if picked == id => {
                        if store.is_window_focused.get() {
                            handler();
                        } else {
                            log::debug!("[menu] Dropping '{}' pick, window unfocused", id);
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("[menu] Listener '{}' lagged, {} event(s) skipped", id, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        if let Ok(mut listeners) = self.listeners.lock() {
            if let Some(old) = listeners.insert(menu_id.to_string(), handle) {
                old.abort();
                log::debug!("[menu] Replaced listener for '{}'", menu_id);
            }
        }
    }

    /// Stop the listener for `menu_id`, if any.
    pub fn unlisten(&self, menu_id: &str) {
        if let Ok(mut listeners) = self.listeners.lock() {
            if let Some(handle) = listeners.remove(menu_id) {
                handle.abort();
            }
        }
    }

    /// Stop every listener. Used at window shutdown.
    pub fn abort_all(&self) {
        if let Ok(mut listeners) = self.listeners.lock() {
            for (_, handle) in listeners.drain() {
                handle.abort();
            }
        }
    }
}
