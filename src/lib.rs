pub mod gateway;
pub mod host;
pub mod menu;
pub mod page;
pub mod settings;
pub mod store;
pub mod sync;
pub mod tasks;
pub mod toast;

#[cfg(test)]
mod test_support;




use thiserror::Error;

/// Errors surfaced by the synchronization layer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The database gateway failed: connection refused, query failed.
    #[error("database gateway error: {0}")]
    Gateway(String),

    /// The native host bridge failed: title, clipboard, or settings call.
    #[error("host bridge error: {0}")]
    Host(String),

    /// Boot ran before an active page id was seeded from the window's
    /// launch parameters.
    #[error("no active page id set at boot")]
    MissingPageId,
}

pub type Result<T> = std::result::Result<T, SyncError>;

pub use gateway::DatabaseGateway;
pub use host::{HostBridge, HostEvent, SettingsStore};
pub use page::{PageData, PageId, RelatedPage};
pub use store::{ActivePageId, Cell, PageStore};
pub use sync::{AppContext, SyncConfig, MENU_COPY_LINK_TO_PAGE};
pub use toast::{ToastKind, ToastState};
