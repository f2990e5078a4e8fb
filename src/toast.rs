//! Notification (toast) state published to the presentation layer.

use serde::{Deserialize, Serialize};

/// How assertively the presentation layer should announce a toast.
///
/// Background toasts are passive confirmations (copy succeeded); foreground
/// toasts interrupt (something the user asked for failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Foreground,
    Background,
}

/// Current toast, a single slot. Showing a new toast replaces the previous
/// one outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastState {
    pub open: bool,
    pub title: String,
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl Default for ToastState {
    fn default() -> Self {
        Self {
            open: false,
            title: "Notification".to_string(),
            message: String::new(),
            kind: ToastKind::Foreground,
            duration_ms: 3000,
        }
    }
}

impl ToastState {
    /// A passive success confirmation.
    pub fn background(title: &str, message: &str) -> Self {
        Self {
            open: true,
            title: title.to_string(),
            message: message.to_string(),
            kind: ToastKind::Background,
            ..Self::default()
        }
    }

    /// An interrupting error notice.
    pub fn foreground(title: &str, message: &str) -> Self {
        Self {
            open: true,
            title: title.to_string(),
            message: message.to_string(),
            kind: ToastKind::Foreground,
            ..Self::default()
        }
    }
}
