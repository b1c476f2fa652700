use std::{path::PathBuf, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, ControlError},
    names::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(rename = "highTrigger")]
    pub high_trigger: f64,
    #[serde(rename = "lowTrigger")]
    pub low_trigger: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high_trigger: 100.0,
            low_trigger: 90.0,
        }
    }
}

impl ThresholdConfig {
    pub fn new(high_trigger: f64, low_trigger: f64) -> Self {
        Self {
            high_trigger,
            low_trigger,
        }
    }

    /// A degenerate or inverted band would toggle the fans every cycle.
    pub fn validate(&self) -> Result<(), ControlError> {
        let finite = self.high_trigger.is_finite() && self.low_trigger.is_finite();
        if !finite || self.high_trigger <= self.low_trigger {
            return Err(ControlError::InvalidConfig {
                high: self.high_trigger,
                low: self.low_trigger,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventNames {
    pub fans_on: String,
    pub fans_off: String,
}

impl Default for EventNames {
    fn default() -> Self {
        Self {
            fans_on: DEFAULT_FANS_ON_EVENT.to_string(),
            fans_off: DEFAULT_FANS_OFF_EVENT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Configuration {
    pub sensor_id: String,
    pub sample_limit: u32,
    pub thresholds: ThresholdConfig,
    pub events: EventNames,
    pub upstream_timeout: Duration,
    pub timezone: String,
    pub http_port: u16,
    pub secrets_dir: Option<PathBuf>,
}

impl Configuration {
    pub const DEFAULT_SAMPLE_LIMIT: u32 = 20;
    pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_TIMEZONE: &'static str = "UTC";
    pub const DEFAULT_HTTP_PORT: u16 = 8080;

    pub fn new(sensor_id: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            sample_limit: Self::DEFAULT_SAMPLE_LIMIT,
            thresholds: ThresholdConfig::default(),
            events: EventNames::default(),
            upstream_timeout: Duration::from_secs(Self::DEFAULT_UPSTREAM_TIMEOUT_SECS),
            timezone: Self::DEFAULT_TIMEZONE.to_string(),
            http_port: Self::DEFAULT_HTTP_PORT,
            secrets_dir: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds and validates the configuration from any key/value source.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let sensor_id = get(ENV_SENSOR_ID).ok_or(ConfigError::Missing(ENV_SENSOR_ID))?;
        let mut config = Self::new(sensor_id);

        if let Some(raw) = get(ENV_SAMPLE_LIMIT) {
            config.sample_limit = parse(ENV_SAMPLE_LIMIT, &raw)?;
        }
        if let Some(raw) = get(ENV_HIGH_TRIGGER) {
            config.thresholds.high_trigger = parse(ENV_HIGH_TRIGGER, &raw)?;
        }
        if let Some(raw) = get(ENV_LOW_TRIGGER) {
            config.thresholds.low_trigger = parse(ENV_LOW_TRIGGER, &raw)?;
        }
        if let Some(name) = get(ENV_FANS_ON_EVENT) {
            config.events.fans_on = name;
        }
        if let Some(name) = get(ENV_FANS_OFF_EVENT) {
            config.events.fans_off = name;
        }
        if let Some(raw) = get(ENV_UPSTREAM_TIMEOUT_SECS) {
            config.upstream_timeout =
                Duration::from_secs(parse(ENV_UPSTREAM_TIMEOUT_SECS, &raw)?);
        }
        if let Some(timezone) = get(ENV_TIMEZONE) {
            config.timezone = timezone;
        }
        if let Some(raw) = get(ENV_PORT) {
            config.http_port = parse(ENV_PORT, &raw)?;
        }
        config.secrets_dir = get(ENV_SECRETS_DIR).map(PathBuf::from);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_limit == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_SAMPLE_LIMIT,
                value: self.sample_limit.to_string(),
                reason: "must be at least 1",
            });
        }
        if self.upstream_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: ENV_UPSTREAM_TIMEOUT_SECS,
                value: "0".to_string(),
                reason: "must be at least 1 second",
            });
        }
        for (key, event) in [
            (ENV_FANS_ON_EVENT, &self.events.fans_on),
            (ENV_FANS_OFF_EVENT, &self.events.fans_off),
        ] {
            if event.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key,
                    value: event.clone(),
                    reason: "event name must not be empty",
                });
            }
        }
        if self.events.fans_on == self.events.fans_off {
            return Err(ConfigError::Invalid {
                key: ENV_FANS_OFF_EVENT,
                value: self.events.fans_off.clone(),
                reason: "must differ from the fans-on event",
            });
        }
        self.thresholds.validate()?;
        Ok(())
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: "not a valid number",
    })
}
