use crate::types::{ChangeSet, CommitRef, DiffText, RepoId};

/// Source-control query service. All pipeline reads of commit and PR data go
/// through this trait.
#[async_trait::async_trait]
pub trait SourceControl: Send + Sync {
    /// List commits reachable from `branch`, newest first, at most `per_page`.
    async fn list_commits(
        &self,
        repo: &RepoId,
        branch: &str,
        per_page: u32,
    ) -> crate::error::Result<Vec<CommitRef>>;

    /// List the change-sets that contain the given commit, in forge order.
    async fn change_sets_for_commit(
        &self,
        repo: &RepoId,
        sha: &str,
    ) -> crate::error::Result<Vec<ChangeSet>>;

    /// List the commits of a change-set in their original order.
    async fn change_set_commits(
        &self,
        repo: &RepoId,
        number: u64,
    ) -> crate::error::Result<Vec<CommitRef>>;

    /// Fetch the raw patch text of a change-set.
    async fn change_set_diff(&self, repo: &RepoId, number: u64) -> crate::error::Result<DiffText>;
}
