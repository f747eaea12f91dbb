//! Core types shared by the research pipeline.
//!
//! Plain records with no behavior beyond small helpers: citation sources,
//! the research result, slides, the finished presentation, and the
//! pipeline status.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A web citation consulted by the research phase. Unique by `uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

impl Source {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// Output of the retrieval phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub raw_text: String,
    pub sources: Vec<Source>,
}

/// One slide of the generated deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    pub points: Vec<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

/// The terminal artifact of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationData {
    pub topic: String,
    pub slides: Vec<Slide>,
    pub sources: Vec<Source>,
}

/// Editorial role of each slide, in deck order.
///
/// Roles are positional: slide `i` plays `SlideRole::ALL[i]`. Nothing
/// validates that the model honored the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideRole {
    Overview,
    Landscape,
    Challenges,
    Outlook,
    Recommendation,
}

impl SlideRole {
    pub const ALL: [SlideRole; 5] = [
        SlideRole::Overview,
        SlideRole::Landscape,
        SlideRole::Challenges,
        SlideRole::Outlook,
        SlideRole::Recommendation,
    ];

    /// Heading used when instructing the model and labelling the slide.
    pub fn heading(&self) -> &'static str {
        match self {
            SlideRole::Overview => "Executive Overview",
            SlideRole::Landscape => "Current Landscape / Technical Details",
            SlideRole::Challenges => "Challenges & Risks",
            SlideRole::Outlook => "Future Outlook",
            SlideRole::Recommendation => "Strategic Recommendation",
        }
    }

    /// Role for the slide at `index`, if the deck has one there.
    pub fn for_index(index: usize) -> Option<SlideRole> {
        Self::ALL.get(index).copied()
    }
}

/// Status of the research pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    #[default]
    Idle,
    Researching,
    Synthesizing,
    Complete,
    Error,
}

impl AgentStatus {
    /// A run is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, AgentStatus::Researching | AgentStatus::Synthesizing)
    }

    /// A new run may be started from this status.
    pub fn accepts_input(&self) -> bool {
        matches!(self, AgentStatus::Idle | AgentStatus::Error)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Researching => write!(f, "researching"),
            AgentStatus::Synthesizing => write!(f, "synthesizing"),
            AgentStatus::Complete => write!(f, "complete"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

/// Insertion-ordered set of sources keyed by URI. First occurrence wins.
#[derive(Debug, Default)]
pub struct SourceSet {
    seen: HashSet<String>,
    sources: Vec<Source>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a source unless its URI is already present.
    /// Returns `true` if the source was added.
    pub fn insert(&mut self, source: Source) -> bool {
        if self.seen.contains(&source.uri) {
            return false;
        }
        self.seen.insert(source.uri.clone());
        self.sources.push(source);
        true
    }

    pub fn into_vec(self) -> Vec<Source> {
        self.sources
    }
}
