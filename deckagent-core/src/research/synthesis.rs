//! Synthesis client: turns research text into a five-slide executive deck
//! using schema-constrained JSON output.

use crate::brain::{GenerateRequest, GenerativeModel};
use crate::error::SynthesisError;
use crate::types::{Slide, SlideRole};
use std::sync::Arc;
use tracing::debug;

/// Builds the synthesis prompt and parses the returned slides.
pub struct SynthesisClient {
    model: Arc<dyn GenerativeModel>,
    max_context_chars: usize,
}

impl SynthesisClient {
    pub fn new(model: Arc<dyn GenerativeModel>, max_context_chars: usize) -> Self {
        Self {
            model,
            max_context_chars,
        }
    }

    pub fn max_context_chars(&self) -> usize {
        self.max_context_chars
    }

    /// Generate the slide deck for `topic` from `research_context`.
    ///
    /// No validation beyond JSON parsing: slide count and point counts are
    /// whatever the model returned.
    pub async fn synthesize_presentation(
        &self,
        topic: &str,
        research_context: &str,
    ) -> Result<Vec<Slide>, SynthesisError> {
        let context = truncate_context(research_context, self.max_context_chars);
        let request = GenerateRequest::new(synthesis_prompt(topic, context))
            .with_response_schema(slide_schema());

        let response = self.model.generate(request).await?;

        let json_text = response
            .text
            .filter(|t| !t.is_empty())
            .ok_or(SynthesisError::EmptyResponse)?;
        let slides: Vec<Slide> = serde_json::from_str(&json_text)?;

        debug!(slides = slides.len(), "Synthesis complete");
        Ok(slides)
    }
}

/// Keep the first `max_chars` characters of `text`.
///
/// Counts Unicode scalar values, never splits a character, and adds no
/// truncation marker.
pub fn truncate_context(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn synthesis_prompt(topic: &str, context: &str) -> String {
    let requirements: String = SlideRole::ALL
        .iter()
        .enumerate()
        .map(|(i, role)| format!("{n}. Slide {n}: {}\n", role.heading(), n = i + 1))
        .collect();

    format!(
        "You are a Chief Strategy Officer.
Based on the following research report on \"{topic}\", create a {count}-slide executive presentation.

Research Context:
{context}

Requirements:
{requirements}
Make the content professional, punchy, and insightful.",
        count = SlideRole::ALL.len(),
    )
}

/// Response schema for the slide array, in Gemini's schema dialect.
pub fn slide_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": {
                    "type": "STRING",
                    "description": "Slide headline"
                },
                "points": {
                    "type": "ARRAY",
                    "items": {"type": "STRING"},
                    "description": "3-4 concise bullet points"
                },
                "summary": {
                    "type": "STRING",
                    "description": "A short executive summary paragraph for the speaker notes"
                },
                "metric": {
                    "type": "STRING",
                    "description": "A key statistic or number mentioned in the research, if applicable (e.g. '40% growth')"
                }
            },
            "required": ["title", "points", "summary"]
        }
    })
}
