//! Google Gemini API provider implementation.
//!
//! Implements the `GenerativeModel` trait for the native Google Gemini API.
//!
//! Request/response notes:
//! - Auth via `?key=API_KEY` query parameter (not header-based)
//! - System instruction is a top-level `system_instruction` field
//! - Search grounding is enabled with a `google_search` tool entry
//! - Structured output uses `generationConfig.responseMimeType` + `responseSchema`
//! - Citations arrive in `candidates[0].groundingMetadata.groundingChunks[].web`

use crate::brain::{GenerateRequest, GenerateResponse, GenerativeModel, GroundingChunk};
use crate::config::{ApiCredential, LlmConfig};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

/// The default Google Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Backoff reported for a 429 without a usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Google Gemini API provider.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    credential: ApiCredential,
    model: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an explicitly resolved credential.
    pub fn new(config: &LlmConfig, credential: ApiCredential) -> Result<Self, LlmError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mut builder = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| LlmError::Connection {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            client,
            base_url,
            credential,
            model: config.model.clone(),
        })
    }

    /// Build the JSON request body for the Gemini API.
    fn build_request_body(request: &GenerateRequest) -> Value {
        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": request.prompt}],
            }],
        });

        if let Some(system) = &request.system_instruction {
            body["system_instruction"] = serde_json::json!({
                "parts": [{"text": system}]
            });
        }

        if request.web_search {
            body["tools"] = serde_json::json!([{"google_search": {}}]);
        }

        if let Some(schema) = &request.response_schema {
            body["generationConfig"] = serde_json::json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }

        body
    }

    /// Parse a Gemini API response JSON into a `GenerateResponse`.
    ///
    /// A response without candidates (e.g. a blocked prompt) yields no text
    /// rather than an error; callers decide what empty output means.
    fn parse_response(body: &Value) -> Result<GenerateResponse, LlmError> {
        if !body.is_object() {
            return Err(LlmError::ResponseParse {
                message: "Response body is not a JSON object".to_string(),
            });
        }

        let Some(candidate) = body["candidates"].as_array().and_then(|c| c.first()) else {
            if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
                debug!(reason, "Gemini returned no candidates");
            }
            return Ok(GenerateResponse::default());
        };

        Ok(GenerateResponse {
            text: Self::candidate_text(candidate),
            grounding: Self::grounding_chunks(candidate),
        })
    }

    /// Concatenate the text parts of a candidate, skipping thought parts.
    fn candidate_text(candidate: &Value) -> Option<String> {
        let parts = candidate["content"]["parts"].as_array()?;
        let mut text = String::new();
        let mut found = false;
        for part in parts {
            if part["thought"].as_bool() == Some(true) {
                continue;
            }
            if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                text.push_str(t);
                found = true;
            }
        }
        found.then_some(text)
    }

    /// Read web citation candidates from a candidate's grounding metadata.
    fn grounding_chunks(candidate: &Value) -> Vec<GroundingChunk> {
        candidate["groundingMetadata"]["groundingChunks"]
            .as_array()
            .map(|chunks| {
                chunks
                    .iter()
                    .filter_map(|chunk| chunk.get("web"))
                    .map(|web| GroundingChunk {
                        uri: web["uri"].as_str().map(str::to_string),
                        title: web["title"].as_str().map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Classify a non-success status.
    ///
    /// The response body is never copied into the error; it is only logged
    /// at debug level by the caller.
    fn status_error(status: StatusCode, retry_after: Option<&str>) -> LlmError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthFailed {
                provider: "Gemini".to_string(),
            },
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
                retry_after_secs: retry_after
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            s if s.is_server_error() => LlmError::Connection {
                message: format!("Gemini service unavailable ({})", s),
            },
            s => LlmError::ApiRequest {
                message: format!("Gemini rejected the request ({})", s),
            },
        }
    }

    /// `generateContent` URL for the configured model. Carries the key; never log it.
    fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            self.credential.expose()
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let body = Self::build_request_body(&request);
        let url = self.endpoint_url();

        debug!(
            model = self.model.as_str(),
            web_search = request.web_search,
            structured = request.response_schema.is_some(),
            prompt_chars = request.prompt.chars().count(),
            "Sending Gemini generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest {
                // reqwest errors can embed the URL, which carries the key.
                message: format!("Request to Gemini API failed: {}", e.without_url()),
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body_text = response.text().await.map_err(|e| LlmError::ResponseParse {
            message: format!("Failed to read response body: {}", e.without_url()),
        })?;

        if !status.is_success() {
            debug!(%status, body = body_text.as_str(), "Gemini returned an error status");
            return Err(Self::status_error(status, retry_after.as_deref()));
        }

        let response_json: Value =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ResponseParse {
                message: format!("Invalid JSON in response: {}", e),
            })?;

        Self::parse_response(&response_json)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
