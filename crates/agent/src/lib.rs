//! Content orchestration for proposal documents.
//!
//! The orchestrator walks the content sections in canonical order, asks a
//! [`source::ContentSource`] for each one, and assembles the finished
//! [`proposal_core::ContentSchema`] that the renderer consumes.
//!
//! # Backends
//!
//! - [`source::MockContentSource`] answers deterministically from the brief.
//! - [`source::LlmContentSource`] asks an [`llm::LlmClient`] for one JSON object
//!   per section.
//!
//! The backend is picked from `content.backend` when the orchestrator is built
//! and never changes afterwards.

pub mod llm;
pub mod orchestrator;
pub mod source;

pub use llm::{LlmClient, OpenAiClient};
pub use orchestrator::{OrchestratorConfig, ProposalOrchestrator};
pub use source::{
    ContentSource, DraftSection, LlmContentSource, MockContentSource, ProposalBrief, SectionDraft,
};
