// Markdown report templates: structured and freeform change-set reports,
// standalone commit reports, and the multi-repository aggregate.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::extract::ChangeSetContent;
use crate::extract::forge_common::first_issue_ref;
use crate::types::{
    ARCHITECTURE_PLACEHOLDER, CommitRef, DIFF_ANALYSIS_PLACEHOLDER, HIGHLIGHTS_PLACEHOLDER,
    NarrativeSections, OVERVIEW_PLACEHOLDER, ReleaseNames, RepoId, TESTING_PLACEHOLDER,
};

const NO_DESCRIPTION: &str = "No additional details provided.";
const NO_LINKED_ISSUE: &str = "No linked issue.";
const NO_SOLUTION: &str = "No solution provided.";
const CHECKS_HEADING: &str = "## Checks";

/// Merge times younger than this render as "N hours ago".
const RELATIVE_HOURS: i64 = 72;

/// Human-facing merge time relative to `now`.
pub fn format_merge_time(merged_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(merged_at) = merged_at else {
        return "Unknown".to_string();
    };
    // Nearest hour, halves rounding up.
    let hours = ((now - merged_at).num_seconds() + 1800).div_euclid(3600);
    if (0..RELATIVE_HOURS).contains(&hours) {
        format!("{hours} hours ago")
    } else {
        long_date(merged_at)
    }
}

/// `Month D, YYYY`.
pub fn long_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = text.trim();
    if trimmed.is_empty() { placeholder } else { trimmed }
}

/// Prefix every line with `> `.
fn blockquote(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn app_release(out: &mut String, link: &str) {
    let _ = writeln!(out, "### 🌐 App Release");
    let _ = writeln!(out, "[View Release on GitHub]({link})");
}

/// Inputs shared by the structured change-set template.
#[derive(Debug, Clone, Copy)]
pub struct StructuredReport<'a> {
    pub title: &'a str,
    pub names: &'a ReleaseNames,
    pub content: &'a ChangeSetContent,
    pub sections: &'a NarrativeSections,
    pub release_link: Option<&'a str>,
    pub now: DateTime<Utc>,
}

impl StructuredReport<'_> {
    pub fn render(&self) -> String {
        let cs = &self.content.change_set;
        let s = self.sections;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "# {} Release Notes - {}\n",
            self.title,
            long_date(self.now)
        );
        let _ = writeln!(out, "## Release: {}\n", self.names.release_name);

        let _ = writeln!(out, "### ⬆️ Overview");
        let _ = writeln!(
            out,
            "{}\n",
            blockquote(or_placeholder(&s.overview, OVERVIEW_PLACEHOLDER))
        );
        let _ = writeln!(out, "- **PR Summary**: {}", cs.title);
        let _ = writeln!(out, "  - **Author**: {}", cs.author_login);
        let _ = writeln!(
            out,
            "  - **Merged At**: {}\n",
            format_merge_time(cs.merged_at, self.now)
        );
        let _ = writeln!(out, "---\n");

        for (heading, body, placeholder) in [
            ("🎯 Highlights", &s.highlights, HIGHLIGHTS_PLACEHOLDER),
            (
                "🏗️ Architecture Changes",
                &s.architecture_changes,
                ARCHITECTURE_PLACEHOLDER,
            ),
            (
                "🔍 Code Diff Analysis",
                &s.diff_analysis,
                DIFF_ANALYSIS_PLACEHOLDER,
            ),
            ("🧪 Tests", &s.testing, TESTING_PLACEHOLDER),
        ] {
            let _ = writeln!(out, "### {heading}");
            let _ = writeln!(out, "{}\n", or_placeholder(body, placeholder));
        }

        if let Some(link) = self.release_link {
            app_release(&mut out, link);
            out.push('\n');
        }

        let _ = writeln!(out, "---\n");
        let _ = writeln!(out, "### 📜 Full PR Description");
        let description = cs.body.as_deref().unwrap_or_default();
        let _ = writeln!(
            out,
            "{}\n",
            blockquote(or_placeholder(description, NO_DESCRIPTION))
        );
        let _ = writeln!(out, "---\n");
        let _ = writeln!(out, "### 📄 Detailed Commit Messages");
        out.push_str(&self.content.commit_messages());
        out
    }
}

/// Freeform change-set template: one summary paragraph, the linked issue and
/// the description's solution text.
pub fn render_freeform(repo: &RepoId, content: &ChangeSetContent, summary: &str) -> String {
    let body = content.change_set.body.as_deref().unwrap_or_default();
    let issue = first_issue_ref(body).map_or_else(
        || NO_LINKED_ISSUE.to_string(),
        |n| {
            format!(
                "See issue: [#{n}](https://github.com/{}/{}/issues/{n})",
                repo.owner, repo.name
            )
        },
    );
    let solution = body
        .find(CHECKS_HEADING)
        .map_or(body, |pos| &body[..pos]);

    let mut out = String::new();
    let _ = writeln!(out, "### Overview");
    let _ = writeln!(out, "{}\n", or_placeholder(summary, OVERVIEW_PLACEHOLDER));
    let _ = writeln!(out, "---\n");
    let _ = writeln!(out, "### 📜 Full PR Description");
    let _ = writeln!(out, "{issue}\n");
    let _ = writeln!(out, "## Solution");
    let _ = writeln!(out, "{}\n", or_placeholder(solution, NO_SOLUTION));
    let _ = writeln!(out, "---\n");
    let _ = writeln!(out, "### 📄 Detailed Commit Messages");
    out.push_str(&content.commit_messages());
    out
}

/// Report for a commit that belongs to no change-set.
pub fn render_commit(commit: &CommitRef, release_link: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Report for Commit {}\n", commit.sha);
    let _ = writeln!(out, "### Author");
    let _ = writeln!(out, "{} ({})\n", commit.author_name, commit.author_email);
    let _ = writeln!(out, "### Date");
    let _ = writeln!(out, "{}\n", commit.author_date.to_rfc3339());
    let _ = writeln!(out, "### Commit Message");
    out.push_str(commit.message.trim_end());
    if let Some(link) = release_link {
        out.push_str("\n\n");
        app_release(&mut out, link);
        out.truncate(out.trim_end().len());
    }
    out
}

/// Accumulates per-repository reports into one aggregate body, in the order
/// they were added.
#[derive(Debug, Default, Clone)]
pub struct AggregateReport {
    body: String,
    repos: Vec<String>,
}

impl AggregateReport {
    pub fn push(&mut self, repo_name: &str, report: &str) {
        let _ = write!(self.body, "## {repo_name}\n{report}\n\n");
        self.repos.push(repo_name.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Repositories included so far, in order.
    pub fn repos(&self) -> &[String] {
        &self.repos
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}
