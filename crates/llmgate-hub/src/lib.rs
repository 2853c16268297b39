//! # llmgate hub
//!
//! Runtime pieces around the core fallback engine: the OpenAI-compatible
//! upstream client, the axum REST server, access logging, and metrics.

pub mod api;
pub mod metrics;
pub mod middleware;
pub mod providers;
