use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Repository identity ────────────────────────────────────────────

/// A source repository, `owner/name` on the forge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ── Source-control records ─────────────────────────────────────────

/// A single revision on the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
    pub author_name: String,
    pub author_email: String,
    pub author_date: DateTime<Utc>,
    pub message: String,
}

/// A merged pull request: a batch of commits integrated together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub number: u64,
    pub title: String,
    pub author_login: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub body: Option<String>,
    /// GitHub reports `null` for unmerged or still-computing PRs.
    pub merge_commit_sha: Option<String>,
}

/// Raw patch text of one change-set.
pub type DiffText = String;

// ── Narrative ──────────────────────────────────────────────────────

pub const OVERVIEW_PLACEHOLDER: &str = "No information available.";
pub const HIGHLIGHTS_PLACEHOLDER: &str = "No specific highlights noted.";
pub const ARCHITECTURE_PLACEHOLDER: &str = "No architectural changes introduced.";
pub const DIFF_ANALYSIS_PLACEHOLDER: &str = "No code analysis available.";
pub const TESTING_PLACEHOLDER: &str = "No testing updates provided.";

/// Model-written prose for a change-set, one block per report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeSections {
    pub overview: String,
    pub highlights: String,
    pub architecture_changes: String,
    pub diff_analysis: String,
    pub testing: String,
}

impl Default for NarrativeSections {
    fn default() -> Self {
        Self {
            overview: OVERVIEW_PLACEHOLDER.to_string(),
            highlights: HIGHLIGHTS_PLACEHOLDER.to_string(),
            architecture_changes: ARCHITECTURE_PLACEHOLDER.to_string(),
            diff_analysis: DIFF_ANALYSIS_PLACEHOLDER.to_string(),
            testing: TESTING_PLACEHOLDER.to_string(),
        }
    }
}

/// Output of the narrative synthesizer in either of its modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Narrative {
    Structured(NarrativeSections),
    Freeform(String),
}

// ── Report records ─────────────────────────────────────────────────

/// Tag and display name of a report, derived together from repo + sha.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseNames {
    pub tag_name: String,
    pub release_name: String,
}

/// A fully formatted report ready to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub names: ReleaseNames,
    pub body: String,
}

/// A report entry as stored in the report repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedReport {
    pub id: u64,
    pub tag_name: String,
    pub name: String,
    pub draft: bool,
}

/// Request to create a report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReport {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_id_display() {
        assert_eq!(
            RepoId::new("rainlanguage", "rain.orderbook").to_string(),
            "rainlanguage/rain.orderbook"
        );
    }

    #[test]
    fn narrative_defaults_are_placeholders() {
        let sections = NarrativeSections::default();
        assert_eq!(sections.overview, "No information available.");
        assert_eq!(sections.highlights, "No specific highlights noted.");
        assert_eq!(
            sections.architecture_changes,
            "No architectural changes introduced."
        );
        assert_eq!(sections.diff_analysis, "No code analysis available.");
        assert_eq!(sections.testing, "No testing updates provided.");
    }

    #[test]
    fn change_set_accepts_missing_optionals() {
        let json = r#"{
            "number": 7,
            "title": "Fix",
            "author_login": "dev",
            "merged_at": null,
            "body": null,
            "merge_commit_sha": null
        }"#;
        let cs: ChangeSet = serde_json::from_str(json).unwrap();
        assert_eq!(cs.number, 7);
        assert!(cs.merged_at.is_none());
        assert!(cs.merge_commit_sha.is_none());
    }
}
