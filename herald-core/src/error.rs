/// Top-level Herald error type.
///
/// All fallible operations in `herald-core` return [`Result<T, HeraldError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum HeraldError {
    /// Error talking to the source-control service (commits, PRs, diffs).
    #[error("Forge error: {0}")]
    Forge(#[from] ForgeError),

    /// Error reading from or writing to the report store.
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error communicating with an LLM provider.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Errors from the source-control query service.
#[derive(thiserror::Error, Debug)]
pub enum ForgeError {
    /// Network-level failure reaching the API.
    #[error("GitHub API: {0}")]
    Network(String),

    /// The API answered with a non-success HTTP status.
    #[error("GitHub API {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Parse response: {0}")]
    Parse(String),

    /// A listing that must yield at least one entry came back empty.
    #[error("No commits found on {branch} for {repo}")]
    NoCommits {
        /// Repository slug (`owner/name`).
        repo: String,
        /// Branch that was listed.
        branch: String,
    },
}

/// Errors from the report store (release lookup, creation, promotion).
#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    /// Looking up a report by tag failed for a reason other than not-found.
    #[error("Release lookup for tag {tag} failed: {source}")]
    Lookup {
        /// Tag that was looked up.
        tag: String,
        /// Underlying transport or API failure.
        source: ForgeError,
    },

    /// Creating the report entry failed.
    #[error("Release creation for tag {tag} failed: {source}")]
    Create {
        /// Tag of the report being created.
        tag: String,
        /// Underlying transport or API failure.
        source: ForgeError,
    },

    /// Promoting a draft report to published failed. The draft is left in place.
    #[error("Promotion of draft release {id} failed: {source}")]
    Promote {
        /// Id of the draft that could not be promoted.
        id: u64,
        /// Underlying transport or API failure.
        source: ForgeError,
    },
}

/// Errors in Herald configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors from LLM provider interactions (narrative synthesis).
#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    /// Network-level failure connecting to the LLM provider.
    #[error("Network error: {0}")]
    Network(String),

    /// LLM API returned a non-success HTTP status.
    #[error("API error (HTTP {status}): {body}")]
    ApiError {
        /// HTTP status code from the provider.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// LLM response could not be parsed into the expected format.
    #[error("Response parse error: {0}")]
    Parse(String),

    /// LLM configuration is missing or invalid (API key, model, etc.).
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias for `Result<T, HeraldError>`.
pub type Result<T> = std::result::Result<T, HeraldError>;
