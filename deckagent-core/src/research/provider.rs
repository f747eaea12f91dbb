//! The research capability consumed by the pipeline.
//!
//! `ResearchProvider` hides the vendor behind the two operations the
//! orchestrator sequences, so state-machine tests run without a network.

use super::retrieval::RetrievalClient;
use super::synthesis::SynthesisClient;
use crate::brain::GenerativeModel;
use crate::config::DeckConfig;
use crate::error::{ConfigError, LlmError, RetrievalError, SynthesisError};
use crate::providers::GeminiProvider;
use crate::types::{ResearchResult, Slide};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Retrieve research for a topic, then synthesize it into slides.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn retrieve(&self, topic: &str) -> Result<ResearchResult, RetrievalError>;

    async fn synthesize(&self, topic: &str, context: &str) -> Result<Vec<Slide>, SynthesisError>;
}

/// Errors from building a provider out of configuration.
#[derive(Debug, thiserror::Error)]
pub enum ProviderInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Search-grounded research plus schema-constrained synthesis over one model.
pub struct GroundedResearchProvider {
    retrieval: RetrievalClient,
    synthesis: SynthesisClient,
}

impl GroundedResearchProvider {
    pub fn new(model: Arc<dyn GenerativeModel>, max_context_chars: usize) -> Self {
        Self {
            retrieval: RetrievalClient::new(model.clone()),
            synthesis: SynthesisClient::new(model, max_context_chars),
        }
    }

    /// Build a Gemini-backed provider.
    ///
    /// The credential is resolved before anything else is constructed, so a
    /// missing key fails here without creating an HTTP client.
    pub fn from_config(config: &DeckConfig) -> Result<Self, ProviderInitError> {
        let credential = config.llm.resolve_credential()?;
        let model = GeminiProvider::new(&config.llm, credential)?;
        info!(model = model.model_name(), "Gemini provider ready");
        Ok(Self::new(
            Arc::new(model),
            config.research.max_context_chars,
        ))
    }
}

#[async_trait]
impl ResearchProvider for GroundedResearchProvider {
    async fn retrieve(&self, topic: &str) -> Result<ResearchResult, RetrievalError> {
        self.retrieval.perform_research(topic).await
    }

    async fn synthesize(&self, topic: &str, context: &str) -> Result<Vec<Slide>, SynthesisError> {
        self.synthesis.synthesize_presentation(topic, context).await
    }
}

/// A scripted research provider for testing the pipeline.
///
/// Each phase returns its queued outcomes in order; calls and the contexts
/// handed to `synthesize` are recorded.
pub struct MockResearchProvider {
    retrievals: std::sync::Mutex<Vec<Result<ResearchResult, RetrievalError>>>,
    syntheses: std::sync::Mutex<Vec<Result<Vec<Slide>, SynthesisError>>>,
    retrieve_calls: std::sync::Mutex<Vec<String>>,
    synthesize_calls: std::sync::Mutex<Vec<(String, String)>>,
}

impl MockResearchProvider {
    pub fn new() -> Self {
        Self {
            retrievals: std::sync::Mutex::new(Vec::new()),
            syntheses: std::sync::Mutex::new(Vec::new()),
            retrieve_calls: std::sync::Mutex::new(Vec::new()),
            synthesize_calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn queue_retrieval(&self, outcome: Result<ResearchResult, RetrievalError>) {
        lock(&self.retrievals).push(outcome);
    }

    pub fn queue_synthesis(&self, outcome: Result<Vec<Slide>, SynthesisError>) {
        lock(&self.syntheses).push(outcome);
    }

    /// Topics passed to `retrieve`, oldest first.
    pub fn retrieve_calls(&self) -> Vec<String> {
        lock(&self.retrieve_calls).clone()
    }

    /// `(topic, context)` pairs passed to `synthesize`, oldest first.
    pub fn synthesize_calls(&self) -> Vec<(String, String)> {
        lock(&self.synthesize_calls).clone()
    }
}

impl Default for MockResearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn unscripted() -> LlmError {
    LlmError::ApiRequest {
        message: "mock research provider has no queued outcome".to_string(),
    }
}

#[async_trait]
impl ResearchProvider for MockResearchProvider {
    async fn retrieve(&self, topic: &str) -> Result<ResearchResult, RetrievalError> {
        lock(&self.retrieve_calls).push(topic.to_string());
        let mut queue = lock(&self.retrievals);
        if queue.is_empty() {
            return Err(unscripted().into());
        }
        queue.remove(0)
    }

    async fn synthesize(&self, topic: &str, context: &str) -> Result<Vec<Slide>, SynthesisError> {
        lock(&self.synthesize_calls).push((topic.to_string(), context.to_string()));
        let mut queue = lock(&self.syntheses);
        if queue.is_empty() {
            return Err(unscripted().into());
        }
        queue.remove(0)
    }
}
