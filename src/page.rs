//! Page records exchanged with the database layer and the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database row id of a page. 0 is a valid id.
pub type PageId = i64;

/// A full page record as stored in the database.
///
/// Records are replaced wholesale; no field-level merging happens anywhere
/// in the synchronization layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub id: PageId,
    pub title: String,
    pub filename: String,
    pub markdown_text: String,
    pub view_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_viewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

/// A page related to the active one, with the tags they share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPage {
    pub id: PageId,
    pub shared_tags: Vec<String>,
}

impl PageData {
    /// Window title for this page, `#<id> <title>`.
    pub fn window_title(&self) -> String {
        format!("#{} {}", self.id, self.title)
    }
}
