//! Scaler trait and the metric types exchanged with the autoscaling host.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::error::ScalerError;
use crate::trigger::ScalerConfig;

/// How the host compares the published value against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricTargetType {
    /// Value divided by the current replica count is compared to the target.
    AverageValue,
    /// Raw value is compared to the target.
    Value,
}

/// Static description of the metric a scaler publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub target_type: MetricTargetType,
    pub target: i64,
}

impl fmt::Display for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?} {})", self.name, self.target_type, self.target)
    }
}

/// A single observation of an external metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalMetricValue {
    pub metric_name: String,
    pub value: i64,
    /// When the value was read from the backing system.
    pub timestamp: DateTime<Utc>,
}

impl ExternalMetricValue {
    pub fn now(metric_name: impl Into<String>, value: i64) -> Self {
        Self {
            metric_name: metric_name.into(),
            value,
            timestamp: Utc::now(),
        }
    }
}

/// Capability set every scaler exposes to the host.
///
/// Polls are independent: implementations keep no state between calls
/// beyond their resolved configuration and connection.
#[async_trait]
pub trait Scaler: Send + Sync {
    /// Validate `config`, open the backing connection and verify it.
    ///
    /// `span` scopes every log line the instance emits.
    async fn connect(config: ScalerConfig, span: Span) -> Result<Self, ScalerError>
    where
        Self: Sized;

    /// Whether there is work to scale up for.
    async fn is_active(&self) -> Result<bool, ScalerError>;

    /// The metric this scaler publishes. Pure; safe to call at any time.
    fn metric_spec(&self) -> MetricSpec;

    /// Read the metric once.
    async fn current_value(&self) -> Result<ExternalMetricValue, ScalerError>;

    /// Release the connection. Idempotent.
    async fn close(&self) -> Result<(), ScalerError>;
}
