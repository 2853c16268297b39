//! Request normalizer — clamps the caller's token budget to the configured ceiling.

use std::num::{NonZeroU32, NonZeroU64};

use serde::{Deserialize, Serialize};

use crate::message::{GenerateRequest, GenerationRequest};

/// Process-wide cap on output tokens sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenCeiling(NonZeroU32);

impl TokenCeiling {
    pub const DEFAULT: TokenCeiling = TokenCeiling(NonZeroU32::new(600).unwrap());

    pub fn new(ceiling: NonZeroU32) -> Self {
        Self(ceiling)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// `min(requested, ceiling)`, narrowed to the ceiling's width.
    pub fn clamp(self, requested: NonZeroU64) -> NonZeroU32 {
        let effective = requested.min(NonZeroU64::from(self.0));
        NonZeroU32::try_from(effective).unwrap_or(self.0)
    }
}

impl Default for TokenCeiling {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Turns validated inbound requests into upstream-agnostic ones.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    ceiling: TokenCeiling,
}

impl Normalizer {
    pub fn new(ceiling: TokenCeiling) -> Self {
        Self { ceiling }
    }

    pub fn normalize(&self, request: GenerateRequest) -> GenerationRequest {
        let effective = self.ceiling.clamp(request.max_tokens);
        GenerationRequest::new(request.messages, effective)
    }
}
