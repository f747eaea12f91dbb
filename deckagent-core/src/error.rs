//! Error types for the deckagent core.
//!
//! Uses `thiserror` for public API error types, one enum per concern:
//! transport failures of a generative call, configuration, and the two
//! pipeline phases (retrieval and synthesis).

/// Errors from a single call to a generative model.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not set: {var}")]
    EnvVarMissing { var: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Failed to load configuration: {message}")]
    Load { message: String },
}

/// Errors from the knowledge-retrieval phase.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Errors from the synthesis phase.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("Failed to generate JSON")]
    EmptyResponse,

    #[error("Slide JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// The cause of a failed pipeline run. Logged, never shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("research phase failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("synthesis phase failed: {0}")]
    Synthesis(#[from] SynthesisError),
}
