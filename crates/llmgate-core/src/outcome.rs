//! Outcome taxonomy — what one upstream attempt produced and what to do next.
//!
//! An attempt goes through three stages:
//!
//! 1. the [`UpstreamClient`](crate::provider::UpstreamClient) reports a raw
//!    [`UpstreamReply`] (a status and body, a timeout, or a transport failure);
//! 2. [`AttemptOutcome::classify`] turns it into a tagged outcome;
//! 3. [`AttemptOutcome::decision`] says whether the orchestrator continues to
//!    the next candidate, stops with the text, or stops with an error.
//!
//! | Observed condition               | Decision      | Recorded kind    |
//! |----------------------------------|---------------|------------------|
//! | timeout before any response      | continue      | `timeout`        |
//! | transport failure                | continue      | `upstream_error` |
//! | 200 with non-empty content       | stop, success | —                |
//! | 200 with empty/absent content    | stop, failure | `failed`         |
//! | 429                              | continue      | `rate_limited`   |
//! | 5xx                              | continue      | `upstream_error` |
//! | any other status (201-299 too)   | stop, failure | `failed`         |

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure kinds surfaced to the caller as `error_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Failed,
    Timeout,
    UpstreamError,
    RateLimited,
    NoCandidates,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Failed,
        ErrorKind::Timeout,
        ErrorKind::UpstreamError,
        ErrorKind::RateLimited,
        ErrorKind::NoCandidates,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Timeout => "timeout",
            Self::UpstreamError => "upstream_error",
            Self::RateLimited => "rate_limited",
            Self::NoCandidates => "no_candidates",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw result of a single chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamReply {
    /// The provider answered with an HTTP status and a body.
    Response { status: u16, body: String },
    /// The per-attempt timeout elapsed before a response arrived.
    Timeout,
    /// Connection refused, DNS failure, reset, unreadable body, ...
    Transport(String),
}

/// Classified outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { text: String, model_used: String },
    Timeout,
    TransportError,
    RateLimited,
    ServerError { status: u16 },
    EmptyOrMalformed,
    ClientError { status: u16 },
}

/// What the orchestrator does after an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Record the kind and try the next candidate.
    Continue(ErrorKind),
    /// Return the extracted text.
    StopSuccess { text: String, model_used: String },
    /// Return this kind without trying the remaining candidates.
    StopFailure(ErrorKind),
}

impl AttemptOutcome {
    /// Classify a reply for `model`. First matching row of the table wins.
    pub fn classify(model: &str, reply: UpstreamReply) -> Self {
        let (status, body) = match reply {
            UpstreamReply::Timeout => return Self::Timeout,
            UpstreamReply::Transport(_) => return Self::TransportError,
            UpstreamReply::Response { status, body } => (status, body),
        };

        if status == 200 {
            let text = extract_text(&body);
            if text.is_empty() {
                return Self::EmptyOrMalformed;
            }
            return Self::Success {
                text,
                model_used: model.to_string(),
            };
        }

        match status {
            429 => Self::RateLimited,
            500..=599 => Self::ServerError { status },
            _ => Self::ClientError { status },
        }
    }

    pub fn decision(self) -> Decision {
        match self {
            Self::Success { text, model_used } => Decision::StopSuccess { text, model_used },
            Self::Timeout => Decision::Continue(ErrorKind::Timeout),
            Self::TransportError | Self::ServerError { .. } => {
                Decision::Continue(ErrorKind::UpstreamError)
            }
            Self::RateLimited => Decision::Continue(ErrorKind::RateLimited),
            Self::EmptyOrMalformed | Self::ClientError { .. } => {
                Decision::StopFailure(ErrorKind::Failed)
            }
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match self {
            Self::Success { .. } => "success".to_string(),
            Self::Timeout => "timeout".to_string(),
            Self::TransportError => "transport_error".to_string(),
            Self::RateLimited => "rate_limited (429)".to_string(),
            Self::ServerError { status } => format!("server_error ({})", status),
            Self::EmptyOrMalformed => "empty_or_malformed".to_string(),
            Self::ClientError { status } => format!("client_error ({})", status),
        }
    }
}

/// Pull `choices[0].message.content` out of a chat-completion body.
///
/// Missing fields, a non-string content, or a body that is not JSON at all
/// all yield an empty string.
pub fn extract_text(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return String::new();
    };

    value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> UpstreamReply {
        UpstreamReply::Response {
            status,
            body: body.to_string(),
        }
    }

    const OK_BODY: &str = r#"{"choices":[{"message":{"role":"assistant","content":"Hello!"}}]}"#;

    #[test]
    fn test_success_with_text() {
        let outcome = AttemptOutcome::classify("m1", response(200, OK_BODY));
        assert_eq!(
            outcome,
            AttemptOutcome::Success {
                text: "Hello!".to_string(),
                model_used: "m1".to_string()
            }
        );
        assert_eq!(
            outcome.decision(),
            Decision::StopSuccess {
                text: "Hello!".to_string(),
                model_used: "m1".to_string()
            }
        );
    }

    #[test]
    fn test_success_status_with_empty_content_stops() {
        for body in [
            r#"{"choices":[{"message":{"content":""}}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{}}]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[]}"#,
            r#"{}"#,
            "not json",
            "",
        ] {
            let outcome = AttemptOutcome::classify("m", response(200, body));
            assert_eq!(outcome, AttemptOutcome::EmptyOrMalformed, "body: {body}");
            assert_eq!(outcome.decision(), Decision::StopFailure(ErrorKind::Failed));
        }
    }

    #[test]
    fn test_only_200_counts_as_success_status() {
        for status in [201, 202, 204, 299] {
            let outcome = AttemptOutcome::classify("m", response(status, OK_BODY));
            assert_eq!(outcome, AttemptOutcome::ClientError { status });
            assert_eq!(outcome.decision(), Decision::StopFailure(ErrorKind::Failed));
        }
    }

    #[test]
    fn test_transient_conditions_continue() {
        let cases = [
            (UpstreamReply::Timeout, ErrorKind::Timeout),
            (
                UpstreamReply::Transport("connection refused".to_string()),
                ErrorKind::UpstreamError,
            ),
            (response(429, "slow down"), ErrorKind::RateLimited),
            (response(500, ""), ErrorKind::UpstreamError),
            (response(503, OK_BODY), ErrorKind::UpstreamError),
            (response(599, ""), ErrorKind::UpstreamError),
        ];

        for (reply, kind) in cases {
            let outcome = AttemptOutcome::classify("m", reply);
            assert_eq!(outcome.decision(), Decision::Continue(kind));
        }
    }

    #[test]
    fn test_other_statuses_stop_with_failed() {
        for status in [301, 400, 401, 403, 404, 422, 600] {
            let outcome = AttemptOutcome::classify("m", response(status, OK_BODY));
            assert_eq!(outcome, AttemptOutcome::ClientError { status });
            assert_eq!(outcome.decision(), Decision::StopFailure(ErrorKind::Failed));
        }
    }

    #[test]
    fn test_extract_text_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"first"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(extract_text(body), "first");
    }

    #[test]
    fn test_whitespace_content_is_not_empty() {
        let body = r#"{"choices":[{"message":{"content":" "}}]}"#;
        let outcome = AttemptOutcome::classify("m", response(200, body));
        assert!(matches!(outcome.decision(), Decision::StopSuccess { text, .. } if text == " "));
    }

    #[test]
    fn test_error_kind_wire_tags() {
        for kind in ErrorKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }
}
