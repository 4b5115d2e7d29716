// Publisher: idempotent report creation on top of a tag-keyed report store.

use tracing::{info, instrument, warn};

use crate::config::PublishMode;
use crate::store::ReportStore;
use crate::types::{NewReport, PublishedReport, ReportDocument};

/// Result of a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new, non-draft report was created.
    Created(PublishedReport),
    /// A report with the same tag already existed; nothing was written.
    AlreadyExists(PublishedReport),
}

/// Writes reports to a [`ReportStore`], at most once per tag.
#[derive(Clone, Copy)]
pub struct Publisher<'a> {
    store: &'a dyn ReportStore,
    mode: PublishMode,
}

impl std::fmt::Debug for Publisher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").field("mode", &self.mode).finish()
    }
}

impl<'a> Publisher<'a> {
    pub fn new(store: &'a dyn ReportStore, mode: PublishMode) -> Self {
        Self { store, mode }
    }

    /// Existing report under `tag`, if any. Lookup failures propagate.
    pub async fn find_existing(&self, tag: &str) -> crate::error::Result<Option<PublishedReport>> {
        self.store.find_by_tag(tag).await
    }

    /// Check for an existing report, then create one if the tag is free.
    #[instrument(skip_all, fields(tag = %doc.names.tag_name))]
    pub async fn publish(&self, doc: &ReportDocument) -> crate::error::Result<PublishOutcome> {
        if let Some(existing) = self.find_existing(&doc.names.tag_name).await? {
            info!(id = existing.id, "Report already published, skipping");
            return Ok(PublishOutcome::AlreadyExists(existing));
        }
        self.create_and_finalize(doc).await.map(PublishOutcome::Created)
    }

    /// Create the report without a prior existence check. In draft-promote
    /// mode a failed promotion leaves the draft behind and is an error.
    pub async fn create_and_finalize(
        &self,
        doc: &ReportDocument,
    ) -> crate::error::Result<PublishedReport> {
        let request = NewReport {
            tag_name: doc.names.tag_name.clone(),
            name: doc.names.release_name.clone(),
            body: doc.body.clone(),
            draft: self.mode == PublishMode::DraftPromote,
        };

        let created = self.store.create(&request).await?;
        if !created.draft {
            info!(id = created.id, "Report published");
            return Ok(created);
        }

        match self.store.publish_draft(created.id).await {
            Ok(published) => {
                info!(id = published.id, "Draft report promoted");
                Ok(published)
            }
            Err(e) => {
                warn!(draft_id = created.id, error = %e, "Draft left unpublished");
                Err(e)
            }
        }
    }
}
