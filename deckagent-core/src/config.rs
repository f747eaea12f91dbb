//! Configuration system for deckagent.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/deckagent/config.toml` and/or `.deckagent/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default Gemini model used for both pipeline phases.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default upper bound on research text embedded in the synthesis prompt.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 20_000;

/// Top-level configuration for deckagent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub research: ResearchConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Generative model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier (e.g., "gemini-2.5-flash").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Inline API key. Takes precedence over `api_key_env` and is never written out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Optional base URL override for the API endpoint.
    pub base_url: Option<String>,
    /// Overall request timeout. `None` leaves the transport default in place.
    pub timeout_secs: Option<u64>,
    /// Connection establishment timeout.
    pub connect_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: None,
            connect_timeout_secs: 10,
        }
    }
}

impl LlmConfig {
    /// Resolve the API credential from the inline key or the process environment.
    pub fn resolve_credential(&self) -> Result<ApiCredential, ConfigError> {
        self.resolve_credential_with(|var| std::env::var(var).ok())
    }

    /// Resolve the API credential using `lookup` in place of the process environment.
    pub fn resolve_credential_with<F>(&self, lookup: F) -> Result<ApiCredential, ConfigError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let key = self
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup(&self.api_key_env).filter(|k| !k.trim().is_empty()));

        key.map(ApiCredential::new)
            .ok_or_else(|| ConfigError::EnvVarMissing {
                var: self.api_key_env.clone(),
            })
    }
}

/// An API key, passed explicitly into provider constructors.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential(String);

impl ApiCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiCredential(<redacted>)")
    }
}

/// Research pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Characters of research text kept when building the synthesis prompt.
    pub max_context_chars: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}

/// Terminal front end settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Topics offered in the interactive prompt.
    pub suggestions: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            suggestions: vec![
                "Quantum Computing".to_string(),
                "Fusion Energy".to_string(),
                "AGI Safety".to_string(),
                "Crispr Technology".to_string(),
            ],
        }
    }
}

impl DeckConfig {
    /// Check for values that make the pipeline unusable.
    ///
    /// Returns soft warnings on success; a zero context bound is a hard error.
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        if self.research.max_context_chars == 0 {
            return Err(ConfigError::Invalid {
                message: "research.max_context_chars must be greater than zero".to_string(),
            });
        }

        let mut warnings = Vec::new();
        if self.llm.model.trim().is_empty() {
            warnings.push("llm.model is empty; requests will be rejected".to_string());
        }
        if self.llm.timeout_secs == Some(0) {
            warnings.push("llm.timeout_secs is 0; every request will time out".to_string());
        }
        Ok(warnings)
    }
}

/// Values set explicitly for one invocation, e.g. from command-line flags.
///
/// Only fields that are `Some` are merged; everything else keeps the value
/// from the lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub max_context_chars: Option<usize>,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "codeholics", "deckagent")
}

/// User-level config file location, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

/// Workspace-level config file location.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".deckagent").join("config.toml")
}

/// Load configuration with layered merging.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (only the fields that are set)
/// 2. Environment variables (prefixed with `DECKAGENT_`)
/// 3. Workspace-local config (`.deckagent/config.toml`)
/// 4. User config (`~/.config/deckagent/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<DeckConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(DeckConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // DECKAGENT_LLM__MODEL, DECKAGENT_RESEARCH__MAX_CONTEXT_CHARS, etc.
    figment = figment.merge(Env::prefixed("DECKAGENT_").split("__"));

    if let Some(model) = &overrides.model {
        figment = figment.merge(Serialized::default("llm.model", model));
    }
    if let Some(max_chars) = overrides.max_context_chars {
        figment = figment.merge(Serialized::default("research.max_context_chars", max_chars));
    }

    let config: DeckConfig = figment.extract().map_err(|e| ConfigError::Load {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}
