use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use herald_core::config::HeraldConfig;
use herald_core::error::HeraldError;
use herald_core::extract::github::GitHubClient;
use herald_core::llm::providers::provider_from_config;
use herald_core::pipeline::{ReleasePipeline, RunSummary};
use herald_core::store::github::GitHubReleaseStore;
use herald_core::types::RepoId;

const DEFAULT_CONFIG_FILE: &str = "herald.toml";

#[derive(Parser, Debug)]
#[command(
    name = "herald",
    version,
    about = "Generate and publish release reports for the latest merged changes"
)]
struct Cli {
    /// Path to herald.toml (default: ./herald.toml if present, else built-in defaults)
    #[arg(short, long, env = "HERALD_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,
}

/// Exit codes:
///   0: every repository published or was already published
///   1: general/unknown error
///   2: configuration error
///   10: partial success (some repositories or the aggregate failed)
const EXIT_PARTIAL: u8 = 10;

fn classify_exit_code(err: &anyhow::Error) -> u8 {
    let is_config = err
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<HeraldError>(), Some(HeraldError::Config(_))));
    if is_config { 2 } else { 1 }
}

fn summary_exit_code(summary: &RunSummary) -> u8 {
    if summary.has_failures() { EXIT_PARTIAL } else { 0 }
}

fn log_filter(quiet: bool, verbose: u8) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (_, 0) => "info",
        (_, 1) => "debug",
        _ => "trace",
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<HeraldConfig> {
    if let Some(path) = explicit {
        return HeraldConfig::load(path)
            .with_context(|| format!("Cannot load config: {}", path.display()));
    }
    let local = Path::new(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return HeraldConfig::load(local).context("Cannot load config: herald.toml");
    }
    info!("No config file found, using defaults");
    Ok(HeraldConfig::default())
}

async fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    let config = load_config(cli.config.as_deref())?;

    let token = config.source_token();
    if token.is_none() {
        warn!(
            env = %config.source.token_env,
            "No GitHub token set, requests are unauthenticated"
        );
    }
    let source = GitHubClient::new(token.clone());
    let store = GitHubReleaseStore::new(
        GitHubClient::new(token),
        RepoId::new(config.report.owner.clone(), config.report.repo.clone()),
    );
    let llm = provider_from_config(&config.llm, &config.llm_api_key())
        .context("Cannot build LLM provider")?;

    info!(
        repos = config.source.repos.len(),
        aggregation = ?config.pipeline.aggregation,
        publish = ?config.pipeline.publish,
        narrative = ?config.pipeline.narrative,
        model = llm.model_id(),
        "Starting run"
    );

    let pipeline = ReleasePipeline::new(&source, &store, llm.as_ref(), &config);
    Ok(pipeline.run().await)
}

fn main() -> ExitCode {
    // Credentials and HERALD_CONFIG may live in .env; a missing file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(log_filter(cli.quiet, cli.verbose))
                }),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(summary) => {
            for (repo, outcome) in &summary.repos {
                info!(repo = %repo, outcome = ?outcome, "Repository finished");
            }
            if let Some(batch) = &summary.batch {
                info!(outcome = ?batch, "Aggregate finished");
            }
            ExitCode::from(summary_exit_code(&summary))
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(classify_exit_code(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use herald_core::error::{ConfigError, ForgeError};
    use herald_core::pipeline::{BatchOutcome, RepoOutcome};

    use super::*;

    #[test]
    fn exit_code_config() {
        let err = anyhow::Error::from(HeraldError::from(ConfigError::Parse("bad toml".into())))
            .context("Cannot load config: herald.toml");
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_general() {
        let err = anyhow::Error::from(HeraldError::from(ForgeError::Network("down".into())));
        assert_eq!(classify_exit_code(&err), 1);
        assert_eq!(classify_exit_code(&anyhow::anyhow!("unexpected")), 1);
    }

    #[test]
    fn exit_code_partial() {
        let mut summary = RunSummary::default();
        summary.repos.push((
            "o/a".into(),
            RepoOutcome::AlreadyPublished { tag: "t".into() },
        ));
        assert_eq!(summary_exit_code(&summary), 0);

        summary.batch = Some(BatchOutcome::Failed("boom".into()));
        assert_eq!(summary_exit_code(&summary), EXIT_PARTIAL);
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(log_filter(true, 2), "error");
        assert_eq!(log_filter(false, 0), "info");
        assert_eq!(log_filter(false, 1), "debug");
        assert_eq!(log_filter(false, 2), "trace");
    }

    #[test]
    fn missing_explicit_config_is_config_error() {
        let err = load_config(Some(Path::new("/nonexistent/herald.toml"))).unwrap_err();
        assert_eq!(classify_exit_code(&err), 2);
    }
}
