//! Fallback orchestrator — tries candidate models in order until one answers.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::candidates::CandidateList;
use crate::message::GenerationRequest;
use crate::normalize::TokenCeiling;
use crate::outcome::{AttemptOutcome, Decision, ErrorKind};
use crate::provider::{CompletionCall, UpstreamClient};

/// Final answer of a generate call. Serializes to `{text, model_used}` or
/// `{error_type}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationResult {
    Success { text: String, model_used: String },
    Failure {
        #[serde(rename = "error_type")]
        error_kind: ErrorKind,
    },
}

impl GenerationResult {
    pub fn failure(error_kind: ErrorKind) -> Self {
        Self::Failure { error_kind }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A result plus how many upstream calls it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub result: GenerationResult,
    pub attempts: usize,
}

/// Walks a [`CandidateList`] sequentially, one upstream call per candidate.
pub struct FallbackOrchestrator<U: UpstreamClient> {
    upstream: U,
    ceiling: TokenCeiling,
}

impl<U: UpstreamClient> FallbackOrchestrator<U> {
    pub fn new(upstream: U, ceiling: TokenCeiling) -> Self {
        Self { upstream, ceiling }
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        candidates: &CandidateList,
    ) -> GenerationResult {
        self.generate_with_report(request, candidates).await.result
    }

    /// Like [`generate`](Self::generate), also reporting the attempt count.
    pub async fn generate_with_report(
        &self,
        request: &GenerationRequest,
        candidates: &CandidateList,
    ) -> GenerationReport {
        let span = info_span!("generate", request_id = %Uuid::new_v4());
        self.run(request, candidates).instrument(span).await
    }

    async fn run(&self, request: &GenerationRequest, candidates: &CandidateList) -> GenerationReport {
        if candidates.is_empty() {
            warn!("No candidate models configured, nothing to try");
            return GenerationReport {
                result: GenerationResult::failure(ErrorKind::NoCandidates),
                attempts: 0,
            };
        }

        let total = candidates.len();
        let mut last_error = ErrorKind::Failed;
        let mut attempts = 0;

        for (i, model) in candidates.iter().enumerate() {
            let call = CompletionCall {
                model: model.to_string(),
                messages: request.messages().to_vec(),
                max_tokens: request.max_tokens().min(self.ceiling.get()),
            };

            debug!(
                "Trying candidate {}/{}: {} (max_tokens={}, messages={})",
                i + 1,
                total,
                model,
                call.max_tokens,
                call.messages.len()
            );

            let started = Instant::now();
            let reply = self.upstream.chat_completion(&call).await;
            attempts += 1;

            let outcome = AttemptOutcome::classify(model, reply);
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

            let label = outcome.label();

            match outcome.decision() {
                Decision::StopSuccess { text, model_used } => {
                    info!("Candidate {} succeeded ({:.1}ms)", model, elapsed_ms);
                    return GenerationReport {
                        result: GenerationResult::Success { text, model_used },
                        attempts,
                    };
                }
                Decision::Continue(kind) => {
                    warn!(
                        "Candidate {} failed: {} ({:.1}ms), moving on",
                        model, label, elapsed_ms
                    );
                    last_error = kind;
                }
                Decision::StopFailure(kind) => {
                    warn!(
                        "Candidate {} failed: {} ({:.1}ms), not trying remaining {}",
                        model,
                        label,
                        elapsed_ms,
                        total - i - 1
                    );
                    last_error = kind;
                    break;
                }
            }
        }

        info!("All attempts ended without text: {} after {} call(s)", last_error, attempts);
        GenerationReport {
            result: GenerationResult::failure(last_error),
            attempts,
        }
    }
}
