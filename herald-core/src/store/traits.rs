use crate::types::{NewReport, PublishedReport};

/// The report store: a repository whose releases hold published reports,
/// keyed by tag name.
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    /// Look up a report by tag. A missing tag is `Ok(None)`, never an error.
    async fn find_by_tag(&self, tag: &str) -> crate::error::Result<Option<PublishedReport>>;

    /// Create a report entry.
    async fn create(&self, report: &NewReport) -> crate::error::Result<PublishedReport>;

    /// Flip a draft entry to published.
    async fn publish_draft(&self, id: u64) -> crate::error::Result<PublishedReport>;
}
