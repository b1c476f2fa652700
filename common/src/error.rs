use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ControlError {
    #[error("temperature sample is not a finite number: {0}")]
    InvalidSample(f64),
    #[error("high trigger {high} must be greater than low trigger {low}")]
    InvalidConfig { high: f64, low: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error(transparent)]
    Thresholds(#[from] ControlError),
}
