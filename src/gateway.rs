//! Database seam.
//!
//! The synchronization layer never touches storage directly; everything goes
//! through [`DatabaseGateway`]. The production implementation wraps the app's
//! database process, tests use an in-memory fake.

use async_trait::async_trait;

use crate::page::{PageData, PageId, RelatedPage};
use crate::Result;

/// Read/write access to the page database.
///
/// A page that does not exist is `Ok(None)` from [`fetch_page`], not an
/// error. Errors mean the gateway itself failed (connection lost, query
/// refused) and carry the underlying message.
///
/// [`fetch_page`]: DatabaseGateway::fetch_page
#[async_trait]
pub trait DatabaseGateway: Send + Sync {
    /// Resolves once the database is ready to serve queries. Boot awaits
    /// this before anything else; a failure here is fatal to boot.
    async fn connect(&self) -> Result<()>;

    /// Load one page record.
    async fn fetch_page(&self, page_id: PageId) -> Result<Option<PageData>>;

    /// Tags of one page. A page without tags yields an empty list.
    async fn page_tags(&self, page_id: PageId) -> Result<Vec<String>>;

    /// Pages sharing at least one tag with `page_id`.
    async fn related_pages(&self, page_id: PageId) -> Result<Vec<RelatedPage>>;

    /// Persist the full tag set of one page, replacing the previous set.
    async fn set_page_tags(&self, page_id: PageId, tags: &[String]) -> Result<()>;
}
