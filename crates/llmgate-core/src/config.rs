//! Configuration management for llmgate.
//!
//! Values come from an optional TOML file and the process environment, with
//! the environment taking precedence. Everything is resolved once at startup
//! into an immutable [`GatewayConfig`] that is passed explicitly to whoever
//! needs it.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::candidates::CandidateList;
use crate::error::{GatewayError, Result};
use crate::normalize::TokenCeiling;

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_BASE_URL: &str = "OPENROUTER_BASE_URL";
pub const ENV_CANDIDATES: &str = "MODEL_CANDIDATES";
pub const ENV_TIMEOUT: &str = "REQUEST_TIMEOUT_SEC";
pub const ENV_MAX_TOKENS: &str = "MAX_OUTPUT_TOKENS";

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Resolved gateway configuration.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Bearer credential for the upstream provider.
    pub api_key: String,
    /// Provider base address, e.g. `https://openrouter.ai/api/v1`.
    pub base_url: String,
    /// Models to try, in order.
    pub candidates: CandidateList,
    /// Bound on each individual upstream attempt.
    pub request_timeout: Duration,
    /// Cap on output tokens sent upstream.
    pub max_output_tokens: TokenCeiling,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("candidates", &self.candidates)
            .field("request_timeout", &self.request_timeout)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

/// On-disk shape. Every field is optional; the environment fills gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<CandidateList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl FileConfig {
    /// Load from a TOML file. A missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))
    }
}

impl GatewayConfig {
    /// Resolve from the process environment only.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(FileConfig::default(), lookup)
    }

    /// Resolve from a TOML file (default path when `None`) overlaid with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        let file = FileConfig::load(&path)?;
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    /// Merge file values with looked-up variables. Blank values count as absent.
    pub fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = var(ENV_API_KEY)
            .or(file.api_key.filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| GatewayError::MissingEnv(ENV_API_KEY.to_string()))?;

        let base_url = var(ENV_BASE_URL)
            .or(file.base_url.filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let candidates = match var(ENV_CANDIDATES) {
            Some(csv) => CandidateList::parse(&csv),
            None => file
                .candidates
                .ok_or_else(|| GatewayError::MissingEnv(ENV_CANDIDATES.to_string()))?,
        };
        if candidates.is_empty() {
            warn!("{} lists no usable models; every request will fail", ENV_CANDIDATES);
        }

        let timeout_secs = match var(ENV_TIMEOUT) {
            Some(raw) => parse_timeout(&raw)?,
            None => file.request_timeout_sec.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        let request_timeout = positive_duration(timeout_secs)?;

        let max_output_tokens = match var(ENV_MAX_TOKENS) {
            Some(raw) => parse_ceiling(&raw)?,
            None => match file.max_output_tokens {
                Some(n) => NonZeroU32::new(n).map(TokenCeiling::new).ok_or_else(|| {
                    invalid(ENV_MAX_TOKENS, "must be a positive integer")
                })?,
                None => TokenCeiling::default(),
            },
        };

        Ok(Self {
            api_key: api_key.trim().to_string(),
            base_url: base_url.trim().to_string(),
            candidates,
            request_timeout,
            max_output_tokens,
        })
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("llmgate")
            .join("config.toml")
    }

    /// Worst-case wall time of one generate call; there is no overall deadline.
    /// Saturates at `Duration::MAX`.
    pub fn worst_case_latency(&self) -> Duration {
        let attempts = u32::try_from(self.candidates.len()).unwrap_or(u32::MAX);
        self.request_timeout
            .checked_mul(attempts)
            .unwrap_or(Duration::MAX)
    }

    /// TOML rendering with the credential masked.
    pub fn to_redacted_toml(&self) -> Result<String> {
        let view = FileConfig {
            api_key: Some(redact(&self.api_key)),
            base_url: Some(self.base_url.clone()),
            candidates: Some(self.candidates.clone()),
            request_timeout_sec: Some(self.request_timeout.as_secs_f64()),
            max_output_tokens: Some(self.max_output_tokens.get()),
        };
        toml::to_string_pretty(&view)
            .map_err(|e| GatewayError::Config(format!("Failed to serialize config: {}", e)))
    }
}

fn invalid(name: &str, message: &str) -> GatewayError {
    GatewayError::InvalidValue {
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn parse_timeout(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| invalid(ENV_TIMEOUT, &e.to_string()))
}

fn positive_duration(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid(ENV_TIMEOUT, "must be a positive number of seconds"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| invalid(ENV_TIMEOUT, &e.to_string()))
}

fn parse_ceiling(raw: &str) -> Result<TokenCeiling> {
    raw.trim()
        .parse::<NonZeroU32>()
        .map(TokenCeiling::new)
        .map_err(|_| invalid(ENV_MAX_TOKENS, "must be a positive integer"))
}

fn redact(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
