//! Pipeline orchestrator: the research → synthesis state machine.
//!
//! ```text
//! IDLE ─begin─▶ RESEARCHING ─ok─▶ SYNTHESIZING ─ok─▶ COMPLETE
//!                    │                 │
//!                    └──────err────────┴──▶ ERROR
//!
//! reset: COMPLETE | ERROR | IDLE ─▶ IDLE
//! ```
//!
//! A new run may also begin directly from ERROR.

use crate::error::PipelineError;
use crate::research::ResearchProvider;
use crate::types::{AgentStatus, PresentationData};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};

/// The only failure text ever exposed to the user.
pub const PIPELINE_ERROR_MESSAGE: &str = "The agent encountered an error while connecting to the knowledge base. Please verify your API key or try a different topic.";

/// Observable state of the pipeline.
///
/// `result` is present only in COMPLETE and `error` only in ERROR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub status: AgentStatus,
    pub topic: String,
    pub result: Option<PresentationData>,
    pub error: Option<String>,
}

/// Receives every status transition. Observers only; they cannot alter the run.
#[async_trait]
pub trait PipelineCallback: Send + Sync {
    async fn on_status_change(&self, state: &PipelineState);
}

/// A callback that ignores all events.
pub struct NoOpCallback;

#[async_trait]
impl PipelineCallback for NoOpCallback {
    async fn on_status_change(&self, _state: &PipelineState) {}
}

/// A callback that records all status transitions for test assertions.
pub struct RecordingCallback {
    states: tokio::sync::Mutex<Vec<PipelineState>>,
}

impl RecordingCallback {
    pub fn new() -> Self {
        Self {
            states: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    pub async fn status_changes(&self) -> Vec<AgentStatus> {
        self.states.lock().await.iter().map(|s| s.status).collect()
    }

    pub async fn states(&self) -> Vec<PipelineState> {
        self.states.lock().await.clone()
    }
}

impl Default for RecordingCallback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineCallback for RecordingCallback {
    async fn on_status_change(&self, state: &PipelineState) {
        self.states.lock().await.push(state.clone());
    }
}

/// Sequences retrieval and synthesis for one topic at a time.
pub struct Pipeline {
    provider: Arc<dyn ResearchProvider>,
    callback: Arc<dyn PipelineCallback>,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(provider: Arc<dyn ResearchProvider>, callback: Arc<dyn PipelineCallback>) -> Self {
        Self {
            provider,
            callback,
            state: PipelineState::default(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn status(&self) -> AgentStatus {
        self.state.status
    }

    pub fn topic(&self) -> &str {
        &self.state.topic
    }

    pub fn result(&self) -> Option<&PresentationData> {
        self.state.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    /// Move to RESEARCHING for `topic` without issuing any call.
    ///
    /// Refused (returns `false`, state untouched) unless the pipeline is IDLE
    /// or ERROR and `topic` has non-whitespace content.
    pub fn begin(&mut self, topic: &str) -> bool {
        if !self.state.status.accepts_input() {
            warn!(status = %self.state.status, "Ignoring start while pipeline is not ready");
            return false;
        }
        if topic.trim().is_empty() {
            return false;
        }

        self.state = PipelineState {
            status: AgentStatus::Researching,
            topic: topic.to_string(),
            result: None,
            error: None,
        };
        true
    }

    /// Run both phases for the run opened by `begin`.
    ///
    /// Does nothing unless the pipeline is RESEARCHING.
    pub async fn run(&mut self) {
        if self.state.status != AgentStatus::Researching {
            return;
        }

        let run_id = uuid::Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id, topic = self.state.topic.as_str());
        async move {
            self.notify().await;
            info!("Research phase started");

            match self.execute().await {
                Ok(presentation) => {
                    info!(
                        slides = presentation.slides.len(),
                        sources = presentation.sources.len(),
                        "Pipeline complete"
                    );
                    self.state.result = Some(presentation);
                    self.state.status = AgentStatus::Complete;
                }
                Err(e) => {
                    error!(error = %e, "Pipeline run failed");
                    self.state.result = None;
                    self.state.error = Some(PIPELINE_ERROR_MESSAGE.to_string());
                    self.state.status = AgentStatus::Error;
                }
            }
            self.notify().await;
        }
        .instrument(span)
        .await
    }

    /// Begin and run a pipeline for `topic`, returning the resulting status.
    pub async fn start(&mut self, topic: &str) -> AgentStatus {
        if self.begin(topic) {
            self.run().await;
        }
        self.state.status
    }

    /// Return to the IDLE shape. Refused while a run is in flight.
    pub fn reset(&mut self) -> bool {
        if self.state.status.is_busy() {
            warn!(status = %self.state.status, "Ignoring reset while a run is in flight");
            return false;
        }
        self.state = PipelineState::default();
        true
    }

    async fn execute(&mut self) -> Result<PresentationData, PipelineError> {
        let topic = self.state.topic.clone();
        let research = self.provider.retrieve(&topic).await?;

        self.state.status = AgentStatus::Synthesizing;
        self.notify().await;
        info!("Synthesis phase started");

        // The research text lives only in this frame; a failure below drops it.
        let slides = self
            .provider
            .synthesize(&topic, &research.raw_text)
            .await?;

        Ok(PresentationData {
            topic,
            slides,
            sources: research.sources,
        })
    }

    async fn notify(&self) {
        self.callback.on_status_change(&self.state).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LlmError, RetrievalError, SynthesisError};
    use crate::research::MockResearchProvider;
    use crate::types::{ResearchResult, Slide, Source};
    use pretty_assertions::assert_eq;

    fn slide(title: &str) -> Slide {
        Slide {
            title: title.to_string(),
            points: vec!["one".into(), "two".into(), "three".into()],
            summary: format!("{} summary", title),
            metric: None,
        }
    }

    fn research() -> ResearchResult {
        ResearchResult {
            raw_text: "raw research".to_string(),
            sources: vec![Source::new("A", "https://a.example")],
        }
    }

    fn create_pipeline(
        provider: Arc<MockResearchProvider>,
    ) -> (Pipeline, Arc<RecordingCallback>) {
        let callback = Arc::new(RecordingCallback::new());
        (Pipeline::new(provider, callback.clone()), callback)
    }

    #[test]
    fn test_initial_state_is_idle() {
        let (pipeline, _) = create_pipeline(Arc::new(MockResearchProvider::new()));
        assert_eq!(pipeline.state(), &PipelineState::default());
        assert_eq!(pipeline.status(), AgentStatus::Idle);
        assert_eq!(pipeline.topic(), "");
        assert!(pipeline.result().is_none());
        assert!(pipeline.error().is_none());
    }

    #[test]
    fn test_begin_is_synchronous_and_issues_no_call() {
        let provider = Arc::new(MockResearchProvider::new());
        let (mut pipeline, _) = create_pipeline(provider.clone());

        assert!(pipeline.begin("Fusion Energy"));
        assert_eq!(pipeline.status(), AgentStatus::Researching);
        assert_eq!(pipeline.topic(), "Fusion Energy");
        assert!(provider.retrieve_calls().is_empty());
    }

    #[test]
    fn test_begin_rejects_blank_topic() {
        let (mut pipeline, _) = create_pipeline(Arc::new(MockResearchProvider::new()));
        assert!(!pipeline.begin(""));
        assert!(!pipeline.begin("   \t\n"));
        assert_eq!(pipeline.state(), &PipelineState::default());
    }

    #[test]
    fn test_begin_rejected_while_busy() {
        let (mut pipeline, _) = create_pipeline(Arc::new(MockResearchProvider::new()));
        assert!(pipeline.begin("first"));
        assert!(!pipeline.begin("second"));
        assert_eq!(pipeline.topic(), "first");
        assert!(!pipeline.reset());
        assert_eq!(pipeline.status(), AgentStatus::Researching);
    }

    #[test]
    fn test_run_without_begin_is_noop() {
        let provider = Arc::new(MockResearchProvider::new());
        let (mut pipeline, callback) = create_pipeline(provider.clone());

        tokio_test::block_on(pipeline.run());
        assert_eq!(pipeline.status(), AgentStatus::Idle);
        assert!(provider.retrieve_calls().is_empty());
        assert!(tokio_test::block_on(callback.status_changes()).is_empty());
    }

    #[tokio::test]
    async fn test_successful_run() {
        let provider = Arc::new(MockResearchProvider::new());
        provider.queue_retrieval(Ok(research()));
        provider.queue_synthesis(Ok(vec![slide("S1"), slide("S2")]));
        let (mut pipeline, callback) = create_pipeline(provider.clone());

        let status = pipeline.start("Quantum Computing").await;
        assert_eq!(status, AgentStatus::Complete);

        let result = pipeline.result().unwrap();
        assert_eq!(result.topic, "Quantum Computing");
        assert_eq!(result.slides.len(), 2);
        assert_eq!(result.sources, research().sources);
        assert!(pipeline.error().is_none());

        assert_eq!(
            provider.synthesize_calls(),
            vec![("Quantum Computing".to_string(), "raw research".to_string())]
        );
        assert_eq!(
            callback.status_changes().await,
            vec![
                AgentStatus::Researching,
                AgentStatus::Synthesizing,
                AgentStatus::Complete
            ]
        );
    }

    #[tokio::test]
    async fn test_retrieval_failure_skips_synthesis() {
        let provider = Arc::new(MockResearchProvider::new());
        provider.queue_retrieval(Err(RetrievalError::Llm(LlmError::AuthFailed {
            provider: "Gemini".into(),
        })));
        let (mut pipeline, callback) = create_pipeline(provider.clone());

        assert_eq!(pipeline.start("AGI Safety").await, AgentStatus::Error);
        assert_eq!(pipeline.error(), Some(PIPELINE_ERROR_MESSAGE));
        assert!(pipeline.result().is_none());
        assert!(provider.synthesize_calls().is_empty());
        assert_eq!(
            callback.status_changes().await,
            vec![AgentStatus::Researching, AgentStatus::Error]
        );
    }

    #[tokio::test]
    async fn test_synthesis_failure_discards_research() {
        let provider = Arc::new(MockResearchProvider::new());
        provider.queue_retrieval(Ok(research()));
        provider.queue_synthesis(Err(SynthesisError::EmptyResponse));
        let (mut pipeline, callback) = create_pipeline(provider.clone());

        assert_eq!(pipeline.start("Crispr").await, AgentStatus::Error);
        let state = pipeline.state();
        assert!(state.result.is_none());
        assert_eq!(state.error.as_deref(), Some(PIPELINE_ERROR_MESSAGE));

        let serialized = serde_json::to_string(state).unwrap();
        assert!(!serialized.contains("raw research"));
        assert!(!serialized.contains("a.example"));
        assert!(!serialized.contains("Failed to generate JSON"));

        for observed in callback.states().await {
            assert!(observed.result.is_none());
        }
    }

    #[tokio::test]
    async fn test_error_message_hides_cause() {
        let provider = Arc::new(MockResearchProvider::new());
        provider.queue_retrieval(Err(RetrievalError::Llm(LlmError::ApiRequest {
            message: "HTTP 500 secret-internal-detail".into(),
        })));
        let (mut pipeline, _) = create_pipeline(provider);

        pipeline.start("topic").await;
        assert!(!pipeline.error().unwrap().contains("secret-internal-detail"));
    }

    #[tokio::test]
    async fn test_restart_from_error() {
        let provider = Arc::new(MockResearchProvider::new());
        provider.queue_retrieval(Err(RetrievalError::Llm(LlmError::Connection {
            message: "offline".into(),
        })));
        provider.queue_retrieval(Ok(research()));
        provider.queue_synthesis(Ok(vec![slide("S1")]));
        let (mut pipeline, _) = create_pipeline(provider.clone());

        assert_eq!(pipeline.start("first").await, AgentStatus::Error);
        assert!(pipeline.begin("second"));
        assert!(pipeline.error().is_none());
        pipeline.run().await;
        assert_eq!(pipeline.status(), AgentStatus::Complete);
        assert_eq!(provider.retrieve_calls(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_start_refused_from_complete() {
        let provider = Arc::new(MockResearchProvider::new());
        provider.queue_retrieval(Ok(research()));
        provider.queue_synthesis(Ok(vec![slide("S1")]));
        let (mut pipeline, _) = create_pipeline(provider.clone());

        pipeline.start("first").await;
        assert_eq!(pipeline.start("second").await, AgentStatus::Complete);
        assert_eq!(pipeline.topic(), "first");
        assert_eq!(provider.retrieve_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_returns_idle_shape() {
        let provider = Arc::new(MockResearchProvider::new());
        provider.queue_retrieval(Ok(research()));
        provider.queue_synthesis(Ok(vec![slide("S1")]));
        let (mut pipeline, _) = create_pipeline(provider);

        pipeline.start("Fusion Energy").await;
        assert!(pipeline.reset());
        assert_eq!(
            serde_json::to_value(pipeline.state()).unwrap(),
            serde_json::json!({"status": "IDLE", "topic": "", "result": null, "error": null})
        );

        // Idempotent from IDLE.
        assert!(pipeline.reset());
        assert_eq!(pipeline.state(), &PipelineState::default());
    }
}
