//! # llmgate core
//!
//! Domain types and the fallback engine for the llmgate gateway: messages,
//! the ordered candidate list, the request normalizer, the outcome taxonomy,
//! and the orchestrator that walks candidates until one succeeds.
//! Nothing here speaks HTTP directly; the upstream is reached through the
//! [`provider::UpstreamClient`] trait.

pub mod candidates;
pub mod config;
pub mod error;
pub mod message;
pub mod normalize;
pub mod orchestrator;
pub mod outcome;
pub mod provider;

pub use candidates::CandidateList;
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use message::{ChatMessage, GenerateRequest, GenerationRequest, Role};
pub use normalize::{Normalizer, TokenCeiling};
pub use orchestrator::{FallbackOrchestrator, GenerationReport, GenerationResult};
pub use outcome::{AttemptOutcome, Decision, ErrorKind, UpstreamReply};
pub use provider::{CompletionCall, UpstreamClient};
