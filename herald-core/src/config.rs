use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Whether repositories are published one by one or combined into one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    #[default]
    Single,
    Batch,
}

/// How a new report entry reaches its published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PublishMode {
    /// Create the entry as non-draft.
    #[default]
    Direct,
    /// Create as draft, then promote with a second call.
    DraftPromote,
}

/// Shape of the model-generated prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeMode {
    /// Five named sections parsed out of one completion.
    #[default]
    Structured,
    /// One unstructured summary of the diff.
    Freeform,
}

/// Top-level Herald configuration, matching `herald.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub source: SourceSection,
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default = "default_products")]
    pub products: BTreeMap<String, ProductConfig>,
}

impl Default for HeraldConfig {
    fn default() -> Self {
        Self {
            source: SourceSection::default(),
            report: ReportSection::default(),
            llm: LlmSection::default(),
            pipeline: PipelineSection::default(),
            products: default_products(),
        }
    }
}

impl HeraldConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> crate::error::Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.source.owner.trim().is_empty() {
            return Err(ConfigError::Invalid("source.owner must not be empty".into()).into());
        }
        if self.report.owner.trim().is_empty() || self.report.repo.trim().is_empty() {
            return Err(
                ConfigError::Invalid("report.owner and report.repo must be set".into()).into(),
            );
        }
        Ok(())
    }

    /// Source-control token, read from the environment variable named in the config.
    pub fn source_token(&self) -> Option<String> {
        std::env::var(&self.source.token_env)
            .ok()
            .filter(|t| !t.is_empty())
    }

    /// LLM API key. Missing keys are not an error here; the call fails downstream.
    pub fn llm_api_key(&self) -> String {
        std::env::var(&self.llm.api_key_env).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub owner: String,
    pub repos: Vec<String>,
    pub branch: String,
    pub token_env: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            owner: "rainlanguage".to_string(),
            repos: vec!["rain.orderbook".into(), "rain.webapp".into()],
            branch: "main".to_string(),
            token_env: "API_GITHUB_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub owner: String,
    pub repo: String,
    /// Product line shown in the title of change-set reports.
    pub title: String,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            owner: "Siddharth2207".to_string(),
            repo: "raindex-releases".to_string(),
            title: "Raindex".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: String,
    pub model: String,
    pub api_key_env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub aggregation: AggregationMode,
    pub publish: PublishMode,
    pub narrative: NarrativeMode,
}

/// Naming and cross-linking for a repository that ships as a known product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub prefix: String,
    pub display_name: String,
    /// External release page; `{tag}` is replaced with the report tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_link: Option<String>,
}

fn default_products() -> BTreeMap<String, ProductConfig> {
    let mut products = BTreeMap::new();
    products.insert(
        "rain.orderbook".to_string(),
        ProductConfig {
            prefix: "app".into(),
            display_name: "App".into(),
            release_link: Some(
                "https://github.com/rainlanguage/rain.orderbook/releases/tag/{tag}".into(),
            ),
        },
    );
    products.insert(
        "rain.webapp".to_string(),
        ProductConfig {
            prefix: "webapp".into(),
            display_name: "RaindexWebApp".into(),
            release_link: None,
        },
    );
    products
}
