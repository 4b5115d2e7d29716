use herald_core::config::{AggregationMode, NarrativeMode, PublishMode};
use herald_core::pipeline::{BatchOutcome, ReleasePipeline, RepoOutcome};
use herald_test::{
    FakeRepo, FakeReportStore, FakeSourceControl, STRUCTURED_REPLY, ScriptedLlm, change_set,
    commit, config, fixed_now,
};

const ORDERBOOK: &str = "rainlanguage/rain.orderbook";
const WEBAPP: &str = "rainlanguage/rain.webapp";

fn orderbook_merged() -> FakeRepo {
    FakeRepo::merged(
        commit("h1", "Merge pull request #12"),
        change_set(12, "Add vault support", Some("m1")),
        vec![commit("c1", "add vaults"), commit("c2", "fix vault tests")],
        "diff --git a/vault.rs b/vault.rs\n+pub struct Vault;",
    )
}

fn webapp_merged() -> FakeRepo {
    FakeRepo::merged(
        commit("w1", "Merge pull request #7"),
        change_set(7, "Polish landing page", Some("wm7")),
        vec![commit("w0", "tweak css")],
        "+body { margin: 0 }",
    )
}

fn single(repos: &[&str]) -> herald_core::config::HeraldConfig {
    config(
        repos,
        AggregationMode::Single,
        PublishMode::Direct,
        NarrativeMode::Structured,
    )
}

// ── Single mode ──────────────────────────────────────────────────

#[tokio::test]
async fn two_runs_produce_one_report() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["rain.orderbook"]);
    let pipeline = ReleasePipeline::new(&source, &store, &llm, &config);

    let first = pipeline.run_at(fixed_now()).await;
    let second = pipeline.run_at(fixed_now()).await;

    assert_eq!(
        first.repos[0].1,
        RepoOutcome::Published {
            tag: "app-v0.0.0-m1".into(),
            id: 1
        }
    );
    assert_eq!(
        second.repos[0].1,
        RepoOutcome::AlreadyPublished {
            tag: "app-v0.0.0-m1".into()
        }
    );
    assert_eq!(store.reports().len(), 1);
    assert_eq!(store.create_calls(), 1);
    // The second run stops at the existence check.
    assert_eq!(llm.calls(), 1);
    assert_eq!(source.diff_calls(), 1);
}

#[tokio::test]
async fn existing_tag_means_no_writes() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::new();
    store.seed("app-v0.0.0-m1");
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert!(matches!(
        summary.repos[0].1,
        RepoOutcome::AlreadyPublished { .. }
    ));
    assert_eq!(store.create_calls(), 0);
    assert_eq!(llm.calls(), 0);
    assert_eq!(source.diff_calls(), 0);
    assert!(!summary.has_failures());
}

#[tokio::test]
async fn structured_report_content() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["rain.orderbook"]);

    ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    let reports = store.reports();
    let stored = &reports[0];
    assert_eq!(stored.report.name, "App v0.0.0-m1");
    assert!(!stored.report.draft);
    let body = &stored.body;
    assert!(body.starts_with("# Raindex Release Notes - November 5, 2024\n"));
    assert!(body.contains("## Release: App v0.0.0-m1"));
    assert!(body.contains("> Vaults are now supported."));
    assert!(body.contains("- **PR Summary**: Add vault support"));
    assert!(body.contains("  - **Merged At**: 3 hours ago"));
    assert!(body.contains("### 🏗️ Architecture Changes\nNew vault module."));
    assert!(body.contains(
        "[View Release on GitHub](https://github.com/rainlanguage/rain.orderbook/releases/tag/app-v0.0.0-m1)"
    ));
    assert!(body.ends_with("### 📄 Detailed Commit Messages\n- add vaults\n- fix vault tests"));
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn failing_model_yields_placeholders() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::failing();
    let config = single(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert!(matches!(summary.repos[0].1, RepoOutcome::Published { .. }));
    assert_eq!(summary.costs.failed_requests, 1);
    let reports = store.reports();
    let body = &reports[0].body;
    for placeholder in [
        "> No information available.",
        "### 🎯 Highlights\nNo specific highlights noted.",
        "### 🏗️ Architecture Changes\nNo architectural changes introduced.",
        "### 🔍 Code Diff Analysis\nNo code analysis available.",
        "### 🧪 Tests\nNo testing updates provided.",
    ] {
        assert!(body.contains(placeholder), "missing {placeholder:?}");
    }
}

#[tokio::test]
async fn standalone_commit_report() {
    let source = FakeSourceControl::new().with_repo(
        "rainlanguage/foo",
        FakeRepo::standalone(commit("deadbeef", "chore: bump deps")),
    );
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["foo"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert_eq!(
        summary.repos[0],
        (
            "rainlanguage/foo".to_string(),
            RepoOutcome::Published {
                tag: "release-v0.0.0-deadbeef".into(),
                id: 1
            }
        )
    );
    let reports = store.reports();
    assert_eq!(reports[0].report.name, "Release v0.0.0-deadbeef");
    let body = &reports[0].body;
    assert!(body.contains("deadbeef"));
    assert!(body.contains("Ada Lovelace (ada@example.com)"));
    assert!(body.contains("2024-11-04T08:30:00+00:00"));
    assert!(body.contains("chore: bump deps"));
    assert!(!body.contains("PR Summary"));
    assert!(!body.contains("Full PR Description"));
    assert!(!body.contains("App Release"));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn association_failure_falls_back_to_commit() {
    let mut repo = orderbook_merged();
    repo.fail_association = true;
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, repo);
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert_eq!(
        summary.repos[0].1,
        RepoOutcome::Published {
            tag: "app-v0.0.0-h1".into(),
            id: 1
        }
    );
    let reports = store.reports();
    let body = &reports[0].body;
    assert!(body.starts_with("## Report for Commit h1"));
    // Linked products carry the release link on commit reports too.
    assert!(body.contains("### 🌐 App Release"));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn null_merge_sha_uses_commit_sha() {
    let source = FakeSourceControl::new().with_repo(
        ORDERBOOK,
        FakeRepo::merged(
            commit("h9", "Merge pull request #3"),
            change_set(3, "Fix fees", None),
            vec![commit("c9", "fix fees")],
            "+fee",
        ),
    );
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert_eq!(
        summary.repos[0].1,
        RepoOutcome::Published {
            tag: "app-v0.0.0-h9".into(),
            id: 1
        }
    );
}

#[tokio::test]
async fn diff_failure_is_soft() {
    let mut repo = orderbook_merged();
    repo.fail_diff = true;
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, repo);
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert!(matches!(summary.repos[0].1, RepoOutcome::Published { .. }));
    assert_eq!(llm.calls(), 1);
    assert_eq!(store.reports().len(), 1);
}

#[tokio::test]
async fn hard_failure_is_isolated_per_repository() {
    let mut broken = orderbook_merged();
    broken.fail_listing = true;
    let source = FakeSourceControl::new()
        .with_repo(ORDERBOOK, broken)
        .with_repo(WEBAPP, webapp_merged());
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["rain.orderbook", "rain.webapp"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert!(matches!(summary.repos[0].1, RepoOutcome::Failed(_)));
    assert_eq!(
        summary.repos[1].1,
        RepoOutcome::Published {
            tag: "webapp-v0.0.0-wm7".into(),
            id: 1
        }
    );
    assert_eq!(summary.failure_count(), 1);
    assert_eq!(store.reports().len(), 1);
}

#[tokio::test]
async fn empty_history_fails_repository() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, FakeRepo::default());
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    let RepoOutcome::Failed(message) = &summary.repos[0].1 else {
        panic!("expected failure, got {:?}", summary.repos[0].1);
    };
    assert!(message.contains("No commits found"));
}

#[tokio::test]
async fn invalid_repository_entry_is_reported() {
    let source = FakeSourceControl::new().with_repo(WEBAPP, webapp_merged());
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["a/b/c", "rain.webapp"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert_eq!(summary.repos[0].0, "a/b/c");
    assert!(matches!(summary.repos[0].1, RepoOutcome::Failed(_)));
    assert!(matches!(summary.repos[1].1, RepoOutcome::Published { .. }));
}

// ── Publish modes ────────────────────────────────────────────────

#[tokio::test]
async fn draft_promote_ends_published() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = config(
        &["rain.orderbook"],
        AggregationMode::Single,
        PublishMode::DraftPromote,
        NarrativeMode::Structured,
    );

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert!(matches!(summary.repos[0].1, RepoOutcome::Published { .. }));
    assert_eq!(store.promote_calls(), 1);
    assert!(store.reports().iter().all(|r| !r.report.draft));
}

#[tokio::test]
async fn failed_promotion_leaves_draft_and_fails_repository() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::failing_promote();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = config(
        &["rain.orderbook"],
        AggregationMode::Single,
        PublishMode::DraftPromote,
        NarrativeMode::Structured,
    );

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert!(matches!(summary.repos[0].1, RepoOutcome::Failed(_)));
    let reports = store.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].report.draft);
}

#[tokio::test]
async fn create_failure_fails_repository() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::failing_create();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert!(matches!(summary.repos[0].1, RepoOutcome::Failed(_)));
    assert!(store.reports().is_empty());
}

#[tokio::test]
async fn lookup_failure_fails_repository_before_any_work() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::failing_lookup();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = single(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert!(matches!(summary.repos[0].1, RepoOutcome::Failed(_)));
    assert_eq!(store.create_calls(), 0);
    assert_eq!(llm.calls(), 0);
    assert_eq!(source.diff_calls(), 0);
}

// ── Freeform narrative ───────────────────────────────────────────

#[tokio::test]
async fn freeform_report_links_issue() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying("Vaults arrive with deposits and withdrawals.");
    let config = config(
        &["rain.orderbook"],
        AggregationMode::Single,
        PublishMode::Direct,
        NarrativeMode::Freeform,
    );

    ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    let reports = store.reports();
    let body = &reports[0].body;
    assert!(body.starts_with("### Overview\nVaults arrive with deposits and withdrawals.\n"));
    assert!(body.contains(
        "See issue: [#12](https://github.com/rainlanguage/rain.orderbook/issues/12)"
    ));
    assert!(body.contains("## Solution\nImplements Add vault support. Fixes #12.\n"));
}

// ── Batch mode ───────────────────────────────────────────────────

fn batch(repos: &[&str]) -> herald_core::config::HeraldConfig {
    config(
        repos,
        AggregationMode::Batch,
        PublishMode::Direct,
        NarrativeMode::Structured,
    )
}

#[tokio::test]
async fn aggregate_keeps_configured_order() {
    let source = FakeSourceControl::new()
        .with_repo(ORDERBOOK, orderbook_merged())
        .with_repo(WEBAPP, webapp_merged());
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = batch(&["rain.orderbook", "rain.webapp"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert_eq!(
        summary.repos[0].1,
        RepoOutcome::Aggregated {
            tag: "app-v0.0.0-m1".into()
        }
    );
    assert_eq!(
        summary.batch,
        Some(BatchOutcome::Published {
            tag: "rainlanguage-aggregated-20241105120000".into(),
            id: 1
        })
    );
    let reports = store.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].report.name,
        "Aggregated Release - rainlanguage - 2024-11-05 12:00:00 UTC"
    );
    let body = &reports[0].body;
    let a = body.find("## rain.orderbook\n").expect("first repository heading");
    let b = body.find("## rain.webapp\n").expect("second repository heading");
    assert!(a < b);
    assert!(body.starts_with("## rain.orderbook\n# Raindex Release Notes"));
}

#[tokio::test]
async fn aggregate_skips_failed_repository() {
    let mut broken = webapp_merged();
    broken.fail_listing = true;
    let source = FakeSourceControl::new()
        .with_repo(ORDERBOOK, orderbook_merged())
        .with_repo(WEBAPP, broken);
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = batch(&["rain.orderbook", "rain.webapp"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert!(matches!(summary.repos[1].1, RepoOutcome::Failed(_)));
    assert!(matches!(summary.batch, Some(BatchOutcome::Published { .. })));
    let reports = store.reports();
    let body = &reports[0].body;
    assert!(body.contains("## rain.orderbook\n"));
    assert!(!body.contains("## rain.webapp\n"));
}

#[tokio::test]
async fn aggregate_with_nothing_publishes_nothing() {
    let source = FakeSourceControl::new();
    let store = FakeReportStore::new();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = batch(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert_eq!(summary.batch, Some(BatchOutcome::NothingToPublish));
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn aggregate_tag_already_present() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::new();
    store.seed("rainlanguage-aggregated-20241105120000");
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = batch(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert_eq!(
        summary.batch,
        Some(BatchOutcome::AlreadyPublished {
            tag: "rainlanguage-aggregated-20241105120000".into()
        })
    );
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn aggregate_lookup_failure_fails_batch() {
    let source = FakeSourceControl::new().with_repo(ORDERBOOK, orderbook_merged());
    let store = FakeReportStore::failing_lookup();
    let llm = ScriptedLlm::replying(STRUCTURED_REPLY);
    let config = batch(&["rain.orderbook"]);

    let summary = ReleasePipeline::new(&source, &store, &llm, &config)
        .run_at(fixed_now())
        .await;

    assert!(matches!(summary.repos[0].1, RepoOutcome::Aggregated { .. }));
    assert!(matches!(summary.batch, Some(BatchOutcome::Failed(_))));
    assert!(summary.has_failures());
    assert_eq!(store.create_calls(), 0);
}
