//! # deckagent core
//!
//! Core library for the deckagent research agent.
//! Provides the research pipeline orchestrator, the search-grounded
//! retrieval and slide synthesis clients, the Gemini provider,
//! configuration, and fundamental types.

pub mod brain;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod providers;
pub mod research;
pub mod types;

// Re-export commonly used types at the crate root.
pub use brain::{GenerateRequest, GenerateResponse, GenerativeModel, MockGenerativeModel};
pub use config::{ApiCredential, ConfigOverrides, DeckConfig, load_config};
pub use pipeline::{
    NoOpCallback, PIPELINE_ERROR_MESSAGE, Pipeline, PipelineCallback, PipelineState,
    RecordingCallback,
};
pub use research::{GroundedResearchProvider, MockResearchProvider, ResearchProvider};
pub use types::{AgentStatus, PresentationData, ResearchResult, Slide, SlideRole, Source};
