//! Prometheus metrics collection for chatrelay
//!
//! Tracks how each chat request was answered and how long upstream calls take.
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// How a chat request was answered
///
/// Restricts the `outcome` label to a fixed set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Canned attribution reply, provider not called
    Attribution,
    /// Provider returned text
    Completion,
    /// Apology envelope with 500
    Failure,
}

impl Outcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Attribution => "attribution",
            Outcome::Completion => "completion",
            Outcome::Failure => "failure",
        }
    }
}

/// Metrics collector for chatrelay
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    chat_requests_total: IntCounterVec,
    provider_duration: HistogramVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let chat_requests_total = IntCounterVec::new(
            Opts::new(
                "chatrelay_chat_requests_total",
                "Total number of chat requests by outcome",
            ),
            &["outcome"],
        )?;

        // Upstream latency; hosted completions usually land between 200ms and 10s
        let provider_duration = HistogramVec::new(
            HistogramOpts::new(
                "chatrelay_provider_duration_ms",
                "Completion provider call latency in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0,
            ]),
            &["provider", "success"],
        )?;

        registry.register(Box::new(chat_requests_total.clone()))?;
        registry.register(Box::new(provider_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            chat_requests_total,
            provider_duration,
        })
    }

    /// Count one answered chat request
    pub fn record_outcome(&self, outcome: Outcome) {
        self.chat_requests_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Observe one provider call
    ///
    /// Non-finite durations are dropped; they would corrupt the histogram.
    pub fn record_provider_call(&self, provider: &str, success: bool, duration_ms: f64) {
        if !duration_ms.is_finite() {
            tracing::warn!(
                provider = provider,
                duration_ms = duration_ms,
                "Dropping non-finite provider duration"
            );
            return;
        }
        let success_label = if success { "true" } else { "false" };
        self.provider_duration
            .with_label_values(&[provider, success_label])
            .observe(duration_ms);
    }

    /// Current count for one outcome
    pub fn outcome_count(&self, outcome: Outcome) -> u64 {
        self.chat_requests_total
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    /// Render all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("metrics output is not valid UTF-8: {}", e))
        })
    }
}
