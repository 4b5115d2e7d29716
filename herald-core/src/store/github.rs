// Report store backed by the releases of a GitHub repository.

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::PublishError;
use crate::extract::github::{GhRelease, GitHubClient};
use crate::types::{NewReport, PublishedReport, RepoId};

use super::traits::ReportStore;

/// Releases of `owner/repo` used as a tag-keyed report store.
#[derive(Debug)]
pub struct GitHubReleaseStore {
    client: GitHubClient,
    repo: RepoId,
}

impl GitHubReleaseStore {
    pub fn new(client: GitHubClient, repo: RepoId) -> Self {
        Self { client, repo }
    }

    fn releases_path(&self) -> String {
        format!("/repos/{}/{}/releases", self.repo.owner, self.repo.name)
    }
}

#[derive(Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
}

#[derive(Serialize)]
struct UpdateRelease {
    draft: bool,
}

#[async_trait::async_trait]
impl ReportStore for GitHubReleaseStore {
    #[instrument(skip(self))]
    async fn find_by_tag(&self, tag: &str) -> crate::error::Result<Option<PublishedReport>> {
        let release = self
            .client
            .api_get_optional::<GhRelease>(&format!("{}/tags/{tag}", self.releases_path()))
            .await
            .map_err(|source| PublishError::Lookup {
                tag: tag.to_string(),
                source,
            })?;
        Ok(release.map(GhRelease::into_published))
    }

    #[instrument(skip_all, fields(tag = %report.tag_name, draft = report.draft))]
    async fn create(&self, report: &NewReport) -> crate::error::Result<PublishedReport> {
        let body = CreateRelease {
            tag_name: &report.tag_name,
            name: &report.name,
            body: &report.body,
            draft: report.draft,
        };
        let release: GhRelease = self
            .client
            .api_post(&self.releases_path(), &body)
            .await
            .map_err(|source| PublishError::Create {
                tag: report.tag_name.clone(),
                source,
            })?;
        let published = release.into_published();
        info!(id = published.id, repo = %self.repo, "Release created");
        Ok(published)
    }

    #[instrument(skip(self))]
    async fn publish_draft(&self, id: u64) -> crate::error::Result<PublishedReport> {
        let release: GhRelease = self
            .client
            .api_patch(
                &format!("{}/{id}", self.releases_path()),
                &UpdateRelease { draft: false },
            )
            .await
            .map_err(|source| PublishError::Promote { id, source })?;
        Ok(release.into_published())
    }
}
