//! Pipeline orchestrator: Locate → Resolve → Aggregate → Narrate → Publish,
//! once per configured repository, in configured order.
//!
//! Failures that are fatal for one repository are recorded in the
//! [`RunSummary`] and the run moves on to the next repository.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use crate::analyze::NarrativeSynthesizer;
use crate::config::{AggregationMode, HeraldConfig};
use crate::extract::forge_common::parse_repo;
use crate::extract::{
    SourceControl, gather_change_set, locate_latest_commit, resolve_change_set,
};
use crate::llm::{CostTracker, LlmProvider};
use crate::naming::{aggregate_names, release_link, release_names};
use crate::publish::{PublishOutcome, Publisher};
use crate::render::{AggregateReport, StructuredReport, render_commit, render_freeform};
use crate::store::ReportStore;
use crate::types::{Narrative, ReportDocument, RepoId};

/// What happened to one repository during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    /// A new report was created under this tag.
    Published { tag: String, id: u64 },
    /// A report for this tag already existed; nothing was generated.
    AlreadyPublished { tag: String },
    /// The report was added to the aggregate (batch mode).
    Aggregated { tag: String },
    /// Processing stopped with an error.
    Failed(String),
}

/// What happened to the aggregate report in batch mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Published { tag: String, id: u64 },
    AlreadyPublished { tag: String },
    /// No repository produced a report.
    NothingToPublish,
    Failed(String),
}

/// Statistics returned by a pipeline run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One entry per configured repository entry, in order.
    pub repos: Vec<(String, RepoOutcome)>,
    /// Set only in batch mode.
    pub batch: Option<BatchOutcome>,
    pub costs: CostTracker,
    pub duration: Duration,
}

impl RunSummary {
    pub fn failure_count(&self) -> usize {
        let repo_failures = self
            .repos
            .iter()
            .filter(|(_, o)| matches!(o, RepoOutcome::Failed(_)))
            .count();
        let batch_failure = usize::from(matches!(self.batch, Some(BatchOutcome::Failed(_))));
        repo_failures + batch_failure
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    pub fn published_count(&self) -> usize {
        let repos = self
            .repos
            .iter()
            .filter(|(_, o)| matches!(o, RepoOutcome::Published { .. }))
            .count();
        repos + usize::from(matches!(self.batch, Some(BatchOutcome::Published { .. })))
    }
}

/// Runs the release-report pipeline over injected capabilities.
pub struct ReleasePipeline<'a> {
    source: &'a dyn SourceControl,
    store: &'a dyn ReportStore,
    llm: &'a dyn LlmProvider,
    config: &'a HeraldConfig,
}

impl std::fmt::Debug for ReleasePipeline<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleasePipeline")
            .field("llm", &self.llm)
            .field("pipeline", &self.config.pipeline)
            .finish_non_exhaustive()
    }
}

impl<'a> ReleasePipeline<'a> {
    pub fn new(
        source: &'a dyn SourceControl,
        store: &'a dyn ReportStore,
        llm: &'a dyn LlmProvider,
        config: &'a HeraldConfig,
    ) -> Self {
        Self {
            source,
            store,
            llm,
            config,
        }
    }

    /// Run against the wall clock.
    pub async fn run(&self) -> RunSummary {
        self.run_at(Utc::now()).await
    }

    /// Run with `now` as the report clock (titles, relative times, batch tags).
    #[instrument(skip_all, fields(mode = ?self.config.pipeline.aggregation))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunSummary {
        let start = Instant::now();
        let batch = self.config.pipeline.aggregation == AggregationMode::Batch;
        let publisher = Publisher::new(self.store, self.config.pipeline.publish);
        let mut summary = RunSummary::default();
        let mut aggregate = AggregateReport::default();

        for entry in &self.config.source.repos {
            let Some(repo) = parse_repo(entry, &self.config.source.owner) else {
                warn!(entry = %entry, "Invalid repository entry, skipping");
                summary.repos.push((
                    entry.clone(),
                    RepoOutcome::Failed(format!("invalid repository entry: {entry}")),
                ));
                continue;
            };

            let sink = if batch { Some(&mut aggregate) } else { None };
            let outcome = match self
                .process_repo(&repo, now, &publisher, sink, &mut summary.costs)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(repo = %repo, error = %e, "Repository failed");
                    RepoOutcome::Failed(e.to_string())
                }
            };
            summary.repos.push((repo.to_string(), outcome));
        }

        if batch {
            summary.batch = Some(self.publish_aggregate(aggregate, now, &publisher).await);
        }

        summary.duration = start.elapsed();
        info!(
            repos = summary.repos.len(),
            published = summary.published_count(),
            failed = summary.failure_count(),
            llm_requests = summary.costs.total_requests,
            duration_ms = u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
            "Run complete"
        );
        summary
    }

    #[instrument(skip_all, fields(repo = %repo))]
    async fn process_repo(
        &self,
        repo: &RepoId,
        now: DateTime<Utc>,
        publisher: &Publisher<'_>,
        aggregate: Option<&mut AggregateReport>,
        costs: &mut CostTracker,
    ) -> crate::error::Result<RepoOutcome> {
        let products = &self.config.products;
        let commit = locate_latest_commit(self.source, repo, &self.config.source.branch).await?;
        let change_set = resolve_change_set(self.source, repo, &commit.sha).await;

        let sha = change_set
            .as_ref()
            .and_then(|cs| cs.merge_commit_sha.clone())
            .unwrap_or_else(|| commit.sha.clone());
        let names = release_names(&repo.name, &sha, products);
        let link = release_link(&repo.name, &names.tag_name, products);

        // An existing report makes the whole repository a no-op, before any
        // diff fetch or model call.
        if aggregate.is_none() {
            if let Some(existing) = publisher.find_existing(&names.tag_name).await? {
                info!(tag = %names.tag_name, id = existing.id, "Already published");
                return Ok(RepoOutcome::AlreadyPublished {
                    tag: names.tag_name,
                });
            }
        }

        let body = match change_set {
            Some(change_set) => {
                info!(pr = change_set.number, "Reporting on change-set");
                let content = gather_change_set(self.source, repo, change_set).await?;
                let narrative = NarrativeSynthesizer::new(self.llm)
                    .synthesize(
                        self.config.pipeline.narrative,
                        content.change_set.body.as_deref(),
                        &content.diff,
                        costs,
                    )
                    .await;
                match narrative {
                    Narrative::Structured(sections) => StructuredReport {
                        title: &self.config.report.title,
                        names: &names,
                        content: &content,
                        sections: &sections,
                        release_link: link.as_deref(),
                        now,
                    }
                    .render(),
                    Narrative::Freeform(summary) => render_freeform(repo, &content, &summary),
                }
            }
            None => {
                info!(sha = %commit.sha, "No change-set, reporting on commit");
                render_commit(&commit, link.as_deref())
            }
        };
        debug!(tag = %names.tag_name, report = %body, "Report rendered");

        if let Some(aggregate) = aggregate {
            aggregate.push(&repo.name, &body);
            return Ok(RepoOutcome::Aggregated {
                tag: names.tag_name,
            });
        }

        let doc = ReportDocument { names, body };
        let published = publisher.create_and_finalize(&doc).await?;
        Ok(RepoOutcome::Published {
            tag: doc.names.tag_name,
            id: published.id,
        })
    }

    async fn publish_aggregate(
        &self,
        aggregate: AggregateReport,
        now: DateTime<Utc>,
        publisher: &Publisher<'_>,
    ) -> BatchOutcome {
        if aggregate.is_empty() {
            info!("No updates found across the repositories.");
            return BatchOutcome::NothingToPublish;
        }

        let names = aggregate_names(&self.config.source.owner, now);
        info!(
            tag = %names.tag_name,
            repos = aggregate.repos().len(),
            "Publishing aggregate report"
        );
        let doc = ReportDocument {
            names,
            body: aggregate.into_body(),
        };
        debug!(report = %doc.body, "Aggregate rendered");

        match publisher.publish(&doc).await {
            Ok(PublishOutcome::Created(report)) => BatchOutcome::Published {
                tag: report.tag_name,
                id: report.id,
            },
            Ok(PublishOutcome::AlreadyExists(report)) => BatchOutcome::AlreadyPublished {
                tag: report.tag_name,
            },
            Err(e) => {
                error!(error = %e, "Aggregate publish failed");
                BatchOutcome::Failed(e.to_string())
            }
        }
    }
}
