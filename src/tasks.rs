//! Tracked background tasks.
//!
//! Every detached task in the synchronization layer is spawned through
//! [`TaskTracker`], so nothing runs that cannot be shut down, and no task
//! failure disappears silently: a task resolving to `Err` is logged with the
//! label it was spawned under.

use std::future::Future;
use std::sync::Mutex;
use tokio::task::JoinHandle;

use crate::Result;

/// Registry of the detached tasks spawned for one window.
pub struct TaskTracker {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn a tracked task. An `Err` outcome is logged under `label`,
    /// never propagated.
    pub fn spawn<F>(&self, label: &'static str, fut: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if let Err(e) = fut.await {
                log::error!("[{}] Background task failed: {}", label, e);
            }
        });

        if let Ok(mut handles) = self.handles.lock() {
            handles.retain(|h| !h.is_finished());
            handles.push(handle);
        }
    }

    /// Number of tracked tasks still running.
    pub fn active_count(&self) -> usize {
        match self.handles.lock() {
            Ok(handles) => handles.iter().filter(|h| !h.is_finished()).count(),
            Err(_) => 0,
        }
    }

    /// Abort everything still running. Used at window shutdown.
    pub fn abort_all(&self) {
        let drained: Vec<JoinHandle<()>> = match self.handles.lock() {
            Ok(mut handles) => handles.drain(..).collect(),
            Err(_) => return,
        };
        for handle in &drained {
            handle.abort();
        }
        if !drained.is_empty() {
            log::info!("[tasks] Aborted {} background task(s)", drained.len());
        }
    }
}

impl Default for TaskTracker {
    fn default() -> Self {
        Self::new()
    }
}
