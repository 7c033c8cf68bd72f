/// Prometheus metrics for the validation stages
///
/// Counters and histograms only observe; nothing in the pipeline reads them
/// back, so validation results never depend on this state.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Duration;

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Labels for stage outcome counters
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StageLabels {
    /// "syntax", "semantic", "consistency", "full"
    pub stage: String,
    /// "pass", "fail", or an error category
    pub outcome: String,
}

/// Labels for per-stage timings
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TimingLabels {
    pub stage: String,
}

pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Stage executions by outcome
    pub validations_total: Family<StageLabels, Counter>,

    /// Stage latency in seconds
    pub stage_duration_seconds: Family<TimingLabels, Histogram>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let validations_total = Family::<StageLabels, Counter>::default();
        // The text encoder appends the `_total` suffix for counters.
        registry.register(
            "validations",
            "Total number of validation stage executions",
            validations_total.clone(),
        );

        let stage_duration_seconds =
            Family::<TimingLabels, Histogram>::new_with_constructor(|| {
                // 100us .. ~2.6s
                Histogram::new(exponential_buckets(0.0001, 3.0, 10))
            });
        registry.register(
            "validation_stage_duration_seconds",
            "Validation stage latency histogram in seconds",
            stage_duration_seconds.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            validations_total,
            stage_duration_seconds,
        }
    }

    pub fn record_stage(&self, stage: &str, outcome: &str, elapsed: Duration) {
        self.validations_total
            .get_or_create(&StageLabels {
                stage: stage.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
        self.stage_duration_seconds
            .get_or_create(&TimingLabels {
                stage: stage.to_string(),
            })
            .observe(elapsed.as_secs_f64());
    }

    pub fn stage_count(&self, stage: &str, outcome: &str) -> u64 {
        self.validations_total
            .get_or_create(&StageLabels {
                stage: stage.to_string(),
                outcome: outcome.to_string(),
            })
            .get()
    }

    /// Text exposition format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        let registry = self.registry.read();
        if let Err(e) = encode(&mut buffer, &registry) {
            tracing::error!("failed to encode metrics: {}", e);
            return String::new();
        }
        buffer
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn outcome(passed: bool) -> &'static str {
    if passed { "pass" } else { "fail" }
}
