// GitHub client: commits, PRs and diffs via the REST API, plus the release
// endpoints used by the report store.

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::ForgeError;
use crate::http::http_client;
use crate::types::{ChangeSet, CommitRef, DiffText, PublishedReport, RepoId};

use super::traits::SourceControl;

const DEFAULT_API_BASE: &str = "https://api.github.com";
/// Warn once remaining calls in the rate-limit window drop below this.
const RATE_LIMIT_WARN_THRESHOLD: u32 = 10;

/// GitHub REST API client.
///
/// Requests are issued once; failures surface to the caller without retry.
#[derive(Debug)]
pub struct GitHubClient {
    token: Option<String>,
    client: Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            client: http_client(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, url: String) -> Self {
        self.api_base = url.trim_end_matches('/').to_string();
        self
    }

    fn request(&self, builder: RequestBuilder, accept: &str) -> RequestBuilder {
        let builder = builder
            .header("Accept", accept)
            .header("User-Agent", concat!("herald/", env!("CARGO_PKG_VERSION")));
        match &self.token {
            Some(token) => builder.header("Authorization", format!("token {token}")),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ForgeError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| ForgeError::Network(e.to_string()))?;
        warn_on_low_rate_limit(&resp);
        Ok(resp)
    }

    async fn error_for(resp: Response) -> ForgeError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        ForgeError::Api { status, body }
    }

    pub(crate) async fn api_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ForgeError> {
        let url = format!("{}{path}", self.api_base);
        debug!(url = %url, "GitHub API request");
        let resp = self
            .send(self.request(self.client.get(&url), "application/vnd.github+json"))
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }
        resp.json()
            .await
            .map_err(|e| ForgeError::Parse(e.to_string()))
    }

    /// GET that maps 404 to `None`.
    pub(crate) async fn api_get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ForgeError> {
        let url = format!("{}{path}", self.api_base);
        debug!(url = %url, "GitHub API request");
        let resp = self
            .send(self.request(self.client.get(&url), "application/vnd.github+json"))
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }
        resp.json()
            .await
            .map(Some)
            .map_err(|e| ForgeError::Parse(e.to_string()))
    }

    async fn api_get_text(&self, path: &str, accept: &str) -> Result<String, ForgeError> {
        let url = format!("{}{path}", self.api_base);
        debug!(url = %url, accept, "GitHub API request");
        let resp = self
            .send(self.request(self.client.get(&url), accept))
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }
        resp.text()
            .await
            .map_err(|e| ForgeError::Parse(e.to_string()))
    }

    pub(crate) async fn api_post<B, T>(&self, path: &str, body: &B) -> Result<T, ForgeError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.api_base);
        debug!(url = %url, "GitHub API POST");
        let resp = self
            .send(
                self.request(self.client.post(&url), "application/vnd.github+json")
                    .json(body),
            )
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }
        resp.json()
            .await
            .map_err(|e| ForgeError::Parse(e.to_string()))
    }

    pub(crate) async fn api_patch<B, T>(&self, path: &str, body: &B) -> Result<T, ForgeError>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.api_base);
        debug!(url = %url, "GitHub API PATCH");
        let resp = self
            .send(
                self.request(self.client.patch(&url), "application/vnd.github+json")
                    .json(body),
            )
            .await?;
        if !resp.status().is_success() {
            return Err(Self::error_for(resp).await);
        }
        resp.json()
            .await
            .map_err(|e| ForgeError::Parse(e.to_string()))
    }
}

/// Warn when the rate-limit window is nearly spent.
fn warn_on_low_rate_limit(resp: &Response) {
    if let Some(remaining) = resp
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&remaining| remaining < RATE_LIMIT_WARN_THRESHOLD)
    {
        warn!(remaining, "GitHub API rate limit low");
    }
}

#[async_trait::async_trait]
impl SourceControl for GitHubClient {
    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn list_commits(
        &self,
        repo: &RepoId,
        branch: &str,
        per_page: u32,
    ) -> crate::error::Result<Vec<CommitRef>> {
        let commits = self
            .api_get::<Vec<GhCommit>>(&format!(
                "/repos/{}/{}/commits?sha={branch}&per_page={per_page}",
                repo.owner, repo.name
            ))
            .await?;
        Ok(commits.into_iter().map(GhCommit::into_commit_ref).collect())
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn change_sets_for_commit(
        &self,
        repo: &RepoId,
        sha: &str,
    ) -> crate::error::Result<Vec<ChangeSet>> {
        let prs = self
            .api_get::<Vec<GhPullRequest>>(&format!(
                "/repos/{}/{}/commits/{sha}/pulls",
                repo.owner, repo.name
            ))
            .await?;
        Ok(prs.into_iter().map(GhPullRequest::into_change_set).collect())
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn change_set_commits(
        &self,
        repo: &RepoId,
        number: u64,
    ) -> crate::error::Result<Vec<CommitRef>> {
        let commits = self
            .api_get::<Vec<GhCommit>>(&format!(
                "/repos/{}/{}/pulls/{number}/commits?per_page=100",
                repo.owner, repo.name
            ))
            .await?;
        Ok(commits.into_iter().map(GhCommit::into_commit_ref).collect())
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn change_set_diff(&self, repo: &RepoId, number: u64) -> crate::error::Result<DiffText> {
        let diff = self
            .api_get_text(
                &format!("/repos/{}/{}/pulls/{number}", repo.owner, repo.name),
                "application/vnd.github.v3.diff",
            )
            .await?;
        Ok(diff)
    }
}

// ── GitHub API Types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GhCommit {
    sha: String,
    commit: GhCommitDetail,
}

#[derive(Debug, Deserialize)]
struct GhCommitDetail {
    message: String,
    author: Option<GhGitAuthor>,
}

#[derive(Debug, Deserialize)]
struct GhGitAuthor {
    name: String,
    email: String,
    date: DateTime<Utc>,
}

impl GhCommit {
    fn into_commit_ref(self) -> CommitRef {
        let (author_name, author_email, author_date) = match self.commit.author {
            Some(a) => (a.name, a.email, a.date),
            None => (String::new(), String::new(), DateTime::<Utc>::default()),
        };
        CommitRef {
            sha: self.sha,
            author_name,
            author_email,
            author_date,
            message: self.commit.message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhPullRequest {
    number: u64,
    title: String,
    body: Option<String>,
    merged_at: Option<DateTime<Utc>>,
    merge_commit_sha: Option<String>,
    user: Option<GhUser>,
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

impl GhPullRequest {
    fn into_change_set(self) -> ChangeSet {
        ChangeSet {
            number: self.number,
            title: self.title,
            author_login: self.user.map_or_else(|| "unknown".to_string(), |u| u.login),
            merged_at: self.merged_at,
            body: self.body,
            merge_commit_sha: self.merge_commit_sha,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhRelease {
    id: u64,
    tag_name: String,
    name: Option<String>,
    #[serde(default)]
    draft: bool,
}

impl GhRelease {
    pub(crate) fn into_published(self) -> PublishedReport {
        PublishedReport {
            id: self.id,
            name: self.name.unwrap_or_else(|| self.tag_name.clone()),
            tag_name: self.tag_name,
            draft: self.draft,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
