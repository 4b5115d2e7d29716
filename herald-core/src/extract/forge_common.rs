// Shared helpers for forge access: repository slugs and issue references.

use crate::types::RepoId;

/// Parse a repository entry from config.
///
/// Accepts a bare name (owned by `default_owner`), `owner/name`, or a GitHub
/// URL in SSH or HTTPS form.
pub fn parse_repo(entry: &str, default_owner: &str) -> Option<RepoId> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    // SSH: git@github.com:owner/repo.git
    if let Some(rest) = entry.strip_prefix("git@github.com:") {
        return split_slug(rest);
    }

    // HTTPS: https://github.com/owner/repo.git
    if let Some((_, after)) = entry.split_once("github.com/") {
        return split_slug(after);
    }

    if entry.contains('/') {
        return split_slug(entry);
    }

    Some(RepoId::new(default_owner, entry))
}

fn split_slug(slug: &str) -> Option<RepoId> {
    let slug = slug.strip_suffix(".git").unwrap_or(slug);
    let slug = slug.trim_end_matches('/');
    let (owner, name) = slug.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(RepoId::new(owner, name))
}

/// First `#<digits>` reference in a PR description, if any.
pub fn first_issue_ref(text: &str) -> Option<u64> {
    text.match_indices('#')
        .find_map(|(pos, _)| issue_number(&text[pos + 1..]))
}

/// Leading run of digits, as an issue number.
fn issue_number(text: &str) -> Option<u64> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text[..end].parse().ok()
}
