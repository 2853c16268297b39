//! Runtime metrics — track generate calls, upstream attempts, and failure kinds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use llmgate_core::orchestrator::{GenerationReport, GenerationResult};
use llmgate_core::outcome::ErrorKind;

/// Gateway metrics collector.
#[derive(Debug)]
pub struct Metrics {
    pub requests_total: AtomicU64,
    pub requests_success: AtomicU64,
    pub requests_failure: AtomicU64,
    pub upstream_attempts: AtomicU64,
    failures_by_kind: [AtomicU64; ErrorKind::ALL.len()],
    success_by_model: Mutex<HashMap<String, u64>>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_success: AtomicU64::new(0),
            requests_failure: AtomicU64::new(0),
            upstream_attempts: AtomicU64::new(0),
            failures_by_kind: Default::default(),
            success_by_model: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, report: &GenerationReport) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.upstream_attempts
            .fetch_add(report.attempts as u64, Ordering::Relaxed);

        match &report.result {
            GenerationResult::Success { model_used, .. } => {
                self.requests_success.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut by_model) = self.success_by_model.lock() {
                    *by_model.entry(model_used.clone()).or_default() += 1;
                }
            }
            GenerationResult::Failure { error_kind } => {
                self.requests_failure.fetch_add(1, Ordering::Relaxed);
                self.failures_by_kind[kind_index(*error_kind)].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn failures(&self, kind: ErrorKind) -> u64 {
        self.failures_by_kind[kind_index(kind)].load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        let uptime = self.uptime_secs();
        let hours = uptime / 3600;
        let minutes = (uptime % 3600) / 60;
        let seconds = uptime % 60;

        let failures: serde_json::Map<String, serde_json::Value> = ErrorKind::ALL
            .iter()
            .map(|k| (k.as_str().to_string(), self.failures(*k).into()))
            .collect();

        let by_model = self
            .success_by_model
            .lock()
            .map(|m| serde_json::to_value(&*m).unwrap_or_default())
            .unwrap_or_default();

        serde_json::json!({
            "uptime": format!("{}h {}m {}s", hours, minutes, seconds),
            "uptime_secs": uptime,
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "success": self.requests_success.load(Ordering::Relaxed),
                "failure": self.requests_failure.load(Ordering::Relaxed),
            },
            "upstream_attempts": self.upstream_attempts.load(Ordering::Relaxed),
            "failures_by_kind": failures,
            "success_by_model": by_model,
        })
    }
}

fn kind_index(kind: ErrorKind) -> usize {
    ErrorKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default()
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;

pub fn new_metrics() -> SharedMetrics {
    Arc::new(Metrics::new())
}
