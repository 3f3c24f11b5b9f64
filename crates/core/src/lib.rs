pub mod config;
pub mod error;
pub mod scaler;
pub mod text;
pub mod trigger;

pub use config::WorkerConfig;
pub use error::ScalerError;
pub use scaler::{ExternalMetricValue, MetricSpec, MetricTargetType, Scaler};
pub use trigger::{ConfigSource, ScalerConfig, TriggerFile};
