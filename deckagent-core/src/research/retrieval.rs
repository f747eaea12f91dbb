//! Knowledge-retrieval client: one search-grounded research call per topic.

use crate::brain::{GenerateRequest, GenerativeModel, GroundingChunk};
use crate::error::RetrievalError;
use crate::types::{ResearchResult, Source, SourceSet};
use std::sync::Arc;
use tracing::debug;

/// Placeholder used when the model returns no research text.
pub const NO_TEXT_PLACEHOLDER: &str = "No text generated.";

const RESEARCHER_INSTRUCTION: &str = "You are an elite technical researcher.
Your goal is to research the user's topic deeply using Google Search.
Focus on:
1. Recent breakthroughs and news.
2. Technical challenges and bottlenecks.
3. Future market or technological outlook.
4. Key statistics and data points.

Provide a comprehensive, structured report. Do not use markdown formatting like bolding or headers too heavily, just clear paragraphs.";

/// Issues the research call and extracts citation sources.
pub struct RetrievalClient {
    model: Arc<dyn GenerativeModel>,
}

impl RetrievalClient {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Research `topic` with web search enabled.
    ///
    /// `topic` must be non-empty; the orchestrator checks this before calling.
    pub async fn perform_research(&self, topic: &str) -> Result<ResearchResult, RetrievalError> {
        let request = GenerateRequest::new(research_prompt(topic))
            .with_system_instruction(RESEARCHER_INSTRUCTION)
            .with_web_search();

        let response = self.model.generate(request).await?;

        let raw_text = response
            .text
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TEXT_PLACEHOLDER.to_string());
        let sources = extract_sources(&response.grounding);

        debug!(
            chars = raw_text.chars().count(),
            sources = sources.len(),
            "Research complete"
        );

        Ok(ResearchResult { raw_text, sources })
    }
}

fn research_prompt(topic: &str) -> String {
    format!("Investigate the following topic deeply: \"{}\"", topic)
}

/// Turn grounding chunks into citation sources.
///
/// A chunk is kept only if both title and URI are present and non-empty.
/// Duplicate URIs are dropped, keeping the first occurrence in order.
pub fn extract_sources(chunks: &[GroundingChunk]) -> Vec<Source> {
    let mut set = SourceSet::new();
    for chunk in chunks {
        let (Some(uri), Some(title)) = (chunk.uri.as_deref(), chunk.title.as_deref()) else {
            continue;
        };
        if uri.is_empty() || title.is_empty() {
            continue;
        }
        set.insert(Source::new(title, uri));
    }
    set.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::{GenerateResponse, MockGenerativeModel};
    use crate::error::LlmError;
    use pretty_assertions::assert_eq;

    fn chunk(uri: Option<&str>, title: Option<&str>) -> GroundingChunk {
        GroundingChunk {
            uri: uri.map(str::to_string),
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn test_extract_sources_dedupes_first_wins() {
        let chunks = vec![
            GroundingChunk::web("a", "A1"),
            GroundingChunk::web("b", "B"),
            GroundingChunk::web("a", "A2"),
        ];
        assert_eq!(
            extract_sources(&chunks),
            vec![Source::new("A1", "a"), Source::new("B", "b")]
        );
    }

    #[test]
    fn test_extract_sources_drops_incomplete() {
        let chunks = vec![
            chunk(Some("a"), None),
            chunk(None, Some("No URI")),
            chunk(Some(""), Some("Empty URI")),
            chunk(Some("d"), Some("")),
            chunk(Some("e"), Some("E")),
        ];
        assert_eq!(extract_sources(&chunks), vec![Source::new("E", "e")]);
    }

    #[test]
    fn test_incomplete_chunk_does_not_claim_uri() {
        // A rejected chunk must not shadow a later complete one with the same URI.
        let chunks = vec![chunk(Some("a"), None), GroundingChunk::web("a", "A")];
        assert_eq!(extract_sources(&chunks), vec![Source::new("A", "a")]);
    }

    #[tokio::test]
    async fn test_perform_research_request_shape() {
        let mock = Arc::new(MockGenerativeModel::new());
        mock.queue_response(
            GenerateResponse::text("Report body")
                .with_grounding(vec![GroundingChunk::web("https://x.example", "X")]),
        );
        let client = RetrievalClient::new(mock.clone());

        let result = client.perform_research("Fusion Energy").await.unwrap();
        assert_eq!(result.raw_text, "Report body");
        assert_eq!(result.sources, vec![Source::new("X", "https://x.example")]);

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].web_search);
        assert!(requests[0].response_schema.is_none());
        assert_eq!(
            requests[0].prompt,
            "Investigate the following topic deeply: \"Fusion Energy\""
        );
        let instruction = requests[0].system_instruction.as_deref().unwrap();
        assert!(instruction.contains("elite technical researcher"));
        assert!(instruction.contains("Key statistics"));
    }

    #[tokio::test]
    async fn test_perform_research_placeholder_on_empty_text() {
        let mock = Arc::new(MockGenerativeModel::new());
        mock.queue_response(GenerateResponse::default());
        mock.queue_response(GenerateResponse::text(""));
        let client = RetrievalClient::new(mock);

        let missing = client.perform_research("t").await.unwrap();
        assert_eq!(missing.raw_text, NO_TEXT_PLACEHOLDER);
        assert!(missing.sources.is_empty());

        let empty = client.perform_research("t").await.unwrap();
        assert_eq!(empty.raw_text, NO_TEXT_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_perform_research_propagates_error() {
        let mock = Arc::new(MockGenerativeModel::new());
        mock.queue_error(LlmError::AuthFailed {
            provider: "Gemini".into(),
        });
        let client = RetrievalClient::new(mock);

        let err = client.perform_research("t").await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Llm(LlmError::AuthFailed { .. })
        ));
    }
}
