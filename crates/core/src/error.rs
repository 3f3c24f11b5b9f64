use thiserror::Error;

/// Errors surfaced to the autoscaling host.
///
/// `Configuration` only ever comes out of scaler construction. The other
/// variants can come out of any poll.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScalerError {
    #[error("configuration error: {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("valueLocation must point to value of type number but got: '{0}'")]
    InvalidValueType(String),

    #[error("request cancelled: {0}")]
    Cancelled(String),
}

impl ScalerError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for the "no {field} given" error used by every mandatory field.
    pub fn missing(field: impl Into<String>) -> Self {
        let field = field.into();
        let reason = format!("no {field} given");
        Self::Configuration { field, reason }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
