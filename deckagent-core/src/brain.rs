//! Generative model interface.
//!
//! `GenerativeModel` is the seam between the research clients and a vendor
//! API. Requests carry a single user prompt plus the two optional
//! capabilities the pipeline needs: live web search and schema-constrained
//! JSON output.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single-turn generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub system_instruction: Option<String>,
    pub prompt: String,
    /// Enable search-grounded generation for this call.
    pub web_search: bool,
    /// When set, the response must be JSON conforming to this schema.
    pub response_schema: Option<serde_json::Value>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }

    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// A web citation candidate from grounding metadata. Either field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
}

impl GroundingChunk {
    pub fn web(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            title: Some(title.into()),
        }
    }
}

/// The parts of a generation response the pipeline consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text; `None` when the model produced none.
    pub text: Option<String>,
    pub grounding: Vec<GroundingChunk>,
}

impl GenerateResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            grounding: Vec::new(),
        }
    }

    pub fn with_grounding(mut self, grounding: Vec<GroundingChunk>) -> Self {
        self.grounding = grounding;
        self
    }
}

/// Trait for generative model backends.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Perform a single generation and return the response.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError>;

    /// Name of the model every request is sent to.
    fn model_name(&self) -> &str;
}

/// A scripted generative model for testing.
///
/// Responses are returned in the order they were queued; every request is
/// recorded for later inspection.
pub struct MockGenerativeModel {
    model: String,
    responses: std::sync::Mutex<Vec<Result<GenerateResponse, LlmError>>>,
    requests: std::sync::Mutex<Vec<GenerateRequest>>,
}

impl MockGenerativeModel {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: std::sync::Mutex::new(Vec::new()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Queue a response to be returned by the next `generate` call.
    pub fn queue_response(&self, response: GenerateResponse) {
        self.lock_responses().push(Ok(response));
    }

    /// Queue an error to be returned by the next `generate` call.
    pub fn queue_error(&self, error: LlmError) {
        self.lock_responses().push(Err(error));
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lock_responses(
        &self,
    ) -> std::sync::MutexGuard<'_, Vec<Result<GenerateResponse, LlmError>>> {
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockGenerativeModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeModel for MockGenerativeModel {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let mut responses = self.lock_responses();
        if responses.is_empty() {
            return Err(LlmError::ApiRequest {
                message: "mock model has no queued response".to_string(),
            });
        }
        responses.remove(0)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
