// Integration test utilities: in-memory forge, report store and model, plus
// fixture builders for commits, change-sets and configs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, TimeZone, Utc};

use herald_core::config::{AggregationMode, HeraldConfig, NarrativeMode, PublishMode};
use herald_core::error::{ForgeError, HeraldError, LlmError, PublishError, Result};
use herald_core::extract::SourceControl;
use herald_core::llm::{LlmProvider, TokenUsage};
use herald_core::store::ReportStore;
use herald_core::types::{ChangeSet, CommitRef, DiffText, NewReport, PublishedReport, RepoId};

/// Clock used by every pipeline test.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 5, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn commit(sha: &str, message: &str) -> CommitRef {
    CommitRef {
        sha: sha.to_string(),
        author_name: "Ada Lovelace".to_string(),
        author_email: "ada@example.com".to_string(),
        author_date: Utc
            .with_ymd_and_hms(2024, 11, 4, 8, 30, 0)
            .single()
            .expect("valid timestamp"),
        message: message.to_string(),
    }
}

pub fn change_set(number: u64, title: &str, merge_sha: Option<&str>) -> ChangeSet {
    ChangeSet {
        number,
        title: title.to_string(),
        author_login: "ada".to_string(),
        merged_at: Some(fixed_now() - chrono::Duration::hours(3)),
        body: Some(format!("Implements {title}. Fixes #{number}.")),
        merge_commit_sha: merge_sha.map(str::to_string),
    }
}

/// Config pointing at `repos` under owner `rainlanguage`, with the given modes.
pub fn config(
    repos: &[&str],
    aggregation: AggregationMode,
    publish: PublishMode,
    narrative: NarrativeMode,
) -> HeraldConfig {
    let mut config = HeraldConfig::default();
    config.source.repos = repos.iter().map(|r| (*r).to_string()).collect();
    config.pipeline.aggregation = aggregation;
    config.pipeline.publish = publish;
    config.pipeline.narrative = narrative;
    config
}

// ── Source control ─────────────────────────────────────────────────

/// Canned state of one repository on the fake forge.
#[derive(Debug, Clone, Default)]
pub struct FakeRepo {
    /// Newest first, as the forge lists them.
    pub commits: Vec<CommitRef>,
    pub change_sets: HashMap<String, Vec<ChangeSet>>,
    pub change_set_commits: HashMap<u64, Vec<CommitRef>>,
    pub diffs: HashMap<u64, DiffText>,
    pub fail_listing: bool,
    pub fail_association: bool,
    pub fail_diff: bool,
}

impl FakeRepo {
    /// Latest commit belongs to no change-set.
    pub fn standalone(head: CommitRef) -> Self {
        Self {
            commits: vec![head],
            ..Self::default()
        }
    }

    /// Latest commit is part of `cs`, which contains `commits` and `diff`.
    pub fn merged(head: CommitRef, cs: ChangeSet, commits: Vec<CommitRef>, diff: &str) -> Self {
        let mut repo = Self::standalone(head.clone());
        repo.change_set_commits.insert(cs.number, commits);
        repo.diffs.insert(cs.number, diff.to_string());
        repo.change_sets.insert(head.sha, vec![cs]);
        repo
    }
}

/// In-memory [`SourceControl`] keyed by `owner/name`.
#[derive(Debug, Default)]
pub struct FakeSourceControl {
    repos: HashMap<String, FakeRepo>,
    diff_calls: AtomicU32,
}

impl FakeSourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_repo(mut self, slug: &str, repo: FakeRepo) -> Self {
        self.repos.insert(slug.to_string(), repo);
        self
    }

    pub fn diff_calls(&self) -> u32 {
        self.diff_calls.load(Ordering::Relaxed)
    }

    fn repo(&self, repo: &RepoId) -> std::result::Result<&FakeRepo, ForgeError> {
        self.repos.get(&repo.to_string()).ok_or_else(|| ForgeError::Api {
            status: 404,
            body: "Not Found".to_string(),
        })
    }
}

fn server_error() -> ForgeError {
    ForgeError::Api {
        status: 502,
        body: "Bad Gateway".to_string(),
    }
}

#[async_trait::async_trait]
impl SourceControl for FakeSourceControl {
    async fn list_commits(
        &self,
        repo: &RepoId,
        _branch: &str,
        per_page: u32,
    ) -> Result<Vec<CommitRef>> {
        let fake = self.repo(repo)?;
        if fake.fail_listing {
            return Err(server_error().into());
        }
        Ok(fake
            .commits
            .iter()
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    async fn change_sets_for_commit(&self, repo: &RepoId, sha: &str) -> Result<Vec<ChangeSet>> {
        let fake = self.repo(repo)?;
        if fake.fail_association {
            return Err(server_error().into());
        }
        Ok(fake.change_sets.get(sha).cloned().unwrap_or_default())
    }

    async fn change_set_commits(&self, repo: &RepoId, number: u64) -> Result<Vec<CommitRef>> {
        let fake = self.repo(repo)?;
        Ok(fake
            .change_set_commits
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn change_set_diff(&self, repo: &RepoId, number: u64) -> Result<DiffText> {
        self.diff_calls.fetch_add(1, Ordering::Relaxed);
        let fake = self.repo(repo)?;
        if fake.fail_diff {
            return Err(server_error().into());
        }
        Ok(fake.diffs.get(&number).cloned().unwrap_or_default())
    }
}

// ── Report store ───────────────────────────────────────────────────

/// A stored report with its body, as the fake keeps it.
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub report: PublishedReport,
    pub body: String,
}

/// In-memory [`ReportStore`] that counts writes.
#[derive(Debug, Default)]
pub struct FakeReportStore {
    reports: Mutex<Vec<StoredReport>>,
    creates: AtomicU32,
    promotions: AtomicU32,
    fail_lookup: bool,
    fail_create: bool,
    fail_promote: bool,
}

impl FakeReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `find_by_tag` call fails with a server error.
    pub fn failing_lookup() -> Self {
        Self {
            fail_lookup: true,
            ..Self::default()
        }
    }

    /// Every `create` call fails.
    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    /// Creation works, promotion of drafts fails.
    pub fn failing_promote() -> Self {
        Self {
            fail_promote: true,
            ..Self::default()
        }
    }

    /// Pre-populate a published report under `tag`.
    pub fn seed(&self, tag: &str) {
        let mut reports = self.reports.lock().expect("store lock");
        let id = reports.len() as u64 + 1;
        reports.push(StoredReport {
            report: PublishedReport {
                id,
                tag_name: tag.to_string(),
                name: tag.to_string(),
                draft: false,
            },
            body: String::new(),
        });
    }

    pub fn reports(&self) -> Vec<StoredReport> {
        self.reports.lock().expect("store lock").clone()
    }

    pub fn create_calls(&self) -> u32 {
        self.creates.load(Ordering::Relaxed)
    }

    pub fn promote_calls(&self) -> u32 {
        self.promotions.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl ReportStore for FakeReportStore {
    async fn find_by_tag(&self, tag: &str) -> Result<Option<PublishedReport>> {
        if self.fail_lookup {
            return Err(PublishError::Lookup {
                tag: tag.to_string(),
                source: ForgeError::Api {
                    status: 500,
                    body: "Internal Server Error".to_string(),
                },
            }
            .into());
        }
        Ok(self
            .reports
            .lock()
            .expect("store lock")
            .iter()
            .find(|r| r.report.tag_name == tag)
            .map(|r| r.report.clone()))
    }

    async fn create(&self, report: &NewReport) -> Result<PublishedReport> {
        self.creates.fetch_add(1, Ordering::Relaxed);
        if self.fail_create {
            return Err(PublishError::Create {
                tag: report.tag_name.clone(),
                source: server_error(),
            }
            .into());
        }
        let mut reports = self.reports.lock().expect("store lock");
        let created = PublishedReport {
            id: reports.len() as u64 + 1,
            tag_name: report.tag_name.clone(),
            name: report.name.clone(),
            draft: report.draft,
        };
        reports.push(StoredReport {
            report: created.clone(),
            body: report.body.clone(),
        });
        Ok(created)
    }

    async fn publish_draft(&self, id: u64) -> Result<PublishedReport> {
        self.promotions.fetch_add(1, Ordering::Relaxed);
        if self.fail_promote {
            return Err(PublishError::Promote {
                id,
                source: server_error(),
            }
            .into());
        }
        let mut reports = self.reports.lock().expect("store lock");
        let stored = reports
            .iter_mut()
            .find(|r| r.report.id == id)
            .expect("promoted id exists");
        stored.report.draft = false;
        Ok(stored.report.clone())
    }
}

// ── Model ──────────────────────────────────────────────────────────

/// Model that returns a fixed reply, or fails every call.
#[derive(Debug)]
pub struct ScriptedLlm {
    reply: Option<String>,
    calls: AtomicU32,
}

impl ScriptedLlm {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<(String, TokenUsage)> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.reply {
            Some(text) => Ok((
                text.clone(),
                TokenUsage {
                    input_tokens: 200,
                    output_tokens: 80,
                },
            )),
            None => Err(HeraldError::Llm(LlmError::ApiError {
                status: 503,
                body: "overloaded".to_string(),
            })),
        }
    }

    fn cost_per_1k_input(&self) -> f64 {
        0.0
    }

    fn cost_per_1k_output(&self) -> f64 {
        0.0
    }
}

/// A well-formed structured reply with a distinct body per section.
pub const STRUCTURED_REPLY: &str = "### Overview\nVaults are now supported.\n\n\
### 🎯 Highlights\n- Vault deposits\n\n\
### 🏗️ Architecture Changes\nNew vault module.\n\n\
### 🔍 Code Diff Analysis\nAdds vault.rs.\n\n\
### 🧪 Tests\nVault unit tests.";
