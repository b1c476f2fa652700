use std::time::Duration;

use greenhouse_common::ControlError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret {0} is not set")]
    Missing(String),
    #[error("secret {0} is empty")]
    Empty(String),
    #[error("failed to read secret {id}: {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures reading the latest sample from the sensor service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("sensor credentials unavailable: {0}")]
    Credentials(#[from] SecretError),
    #[error("sensor request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("sensor service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("sensor service did not return an access token")]
    NotAuthorized,
    #[error("sensor {0} is unknown to the sensor service")]
    UnknownSensor(String),
    #[error("sensor {0} has no samples")]
    NoSamples(String),
    #[error("sensor read timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("webhook request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("webhook returned HTTP {0}")]
    HttpStatus(u16),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("webhook credential unavailable: {0}")]
    MissingCredential(#[source] SecretError),
    #[error("webhook rejected {event}: {reason}")]
    SinkRejected { event: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl CheckError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream(_) => "upstream",
            Self::Control(ControlError::InvalidSample(_)) => "invalid_sample",
            Self::Control(ControlError::InvalidConfig { .. }) => "invalid_config",
            Self::Dispatch(DispatchError::MissingCredential(_)) => "missing_credential",
            Self::Dispatch(DispatchError::SinkRejected { .. }) => "sink_rejected",
        }
    }
}
