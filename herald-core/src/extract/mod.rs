//! Source-control side of the pipeline: locate the latest commit, resolve the
//! change-set it belongs to, and gather that change-set's content.

pub mod forge_common;
pub mod github;
pub mod traits;

use std::fmt::Write as _;

use tracing::{info, instrument, warn};

use crate::error::ForgeError;
use crate::types::{ChangeSet, CommitRef, DiffText, RepoId};

pub use traits::SourceControl;

/// Everything the report needs about one change-set.
#[derive(Debug, Clone)]
pub struct ChangeSetContent {
    pub change_set: ChangeSet,
    /// Constituent commits in original order.
    pub commits: Vec<CommitRef>,
    /// Empty when the diff could not be fetched.
    pub diff: DiffText,
}

impl ChangeSetContent {
    /// Commit messages as a markdown bullet list, one `- ` line per commit.
    pub fn commit_messages(&self) -> String {
        commit_message_list(&self.commits)
    }
}

/// Latest commit on `branch`. Listing errors and empty listings are fatal for
/// the repository.
#[instrument(skip(source, repo), fields(repo = %repo))]
pub async fn locate_latest_commit(
    source: &dyn SourceControl,
    repo: &RepoId,
    branch: &str,
) -> crate::error::Result<CommitRef> {
    let commits = source.list_commits(repo, branch, 1).await?;
    let latest = commits.into_iter().next().ok_or_else(|| ForgeError::NoCommits {
        repo: repo.to_string(),
        branch: branch.to_string(),
    })?;
    info!(sha = %latest.sha, "Latest commit located");
    Ok(latest)
}

/// First change-set containing `sha`, or `None`. Lookup failures are logged
/// and treated as "no change-set".
#[instrument(skip(source, repo), fields(repo = %repo))]
pub async fn resolve_change_set(
    source: &dyn SourceControl,
    repo: &RepoId,
    sha: &str,
) -> Option<ChangeSet> {
    match source.change_sets_for_commit(repo, sha).await {
        Ok(change_sets) => {
            if change_sets.len() > 1 {
                info!(
                    count = change_sets.len(),
                    "Commit belongs to several change-sets, using the first"
                );
            }
            change_sets.into_iter().next()
        }
        Err(e) => {
            warn!(error = %e, "Change-set lookup failed, treating commit as standalone");
            None
        }
    }
}

/// Fetch commits and diff for a change-set. A commit listing failure is
/// fatal; a diff failure degrades to an empty diff.
#[instrument(skip_all, fields(repo = %repo, pr = change_set.number))]
pub async fn gather_change_set(
    source: &dyn SourceControl,
    repo: &RepoId,
    change_set: ChangeSet,
) -> crate::error::Result<ChangeSetContent> {
    let commits = source.change_set_commits(repo, change_set.number).await?;
    let diff = match source.change_set_diff(repo, change_set.number).await {
        Ok(diff) => diff,
        Err(e) => {
            warn!(error = %e, "Diff fetch failed, continuing without diff");
            String::new()
        }
    };
    info!(
        commits = commits.len(),
        diff_bytes = diff.len(),
        "Change-set content gathered"
    );
    Ok(ChangeSetContent {
        change_set,
        commits,
        diff,
    })
}

/// Render commit messages as `- <message>` lines, preserving order.
pub fn commit_message_list(commits: &[CommitRef]) -> String {
    let mut out = String::new();
    for (i, commit) in commits.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "- {}", commit.message);
    }
    out
}
