//! Research-to-presentation clients.
//!
//! Two sequential generative calls:
//! 1. **Retrieve** — search-grounded research on the topic, with citations
//! 2. **Synthesize** — schema-constrained JSON deck built from that research

pub mod provider;
pub mod retrieval;
pub mod synthesis;

pub use provider::{
    GroundedResearchProvider, MockResearchProvider, ProviderInitError, ResearchProvider,
};
pub use retrieval::{RetrievalClient, extract_sources};
pub use synthesis::{SynthesisClient, slide_schema, truncate_context};
