//! One control cycle: read the sensor, decide, dispatch, commit.
//!
//! The fan state lives behind a single async mutex that is held for the
//! whole cycle. Overlapping triggers queue up behind it instead of both
//! deciding from the same stale state and double-dispatching.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use greenhouse_common::{
    ActuatorState, Configuration, ControlDecision, ControlError, FanCommand, HysteresisController,
    TemperatureSample, ThresholdConfig,
};

use crate::{
    dispatch::{Ack, ActuatorDispatcher},
    error::{CheckError, UpstreamError},
    sensorpush::SensorReader,
};

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub sample: TemperatureSample,
    pub previous_state: ActuatorState,
    pub decision: ControlDecision,
    pub state: ActuatorState,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideOutcome {
    pub ack: Ack,
    pub previous_state: ActuatorState,
    pub state: ActuatorState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub fans: ActuatorState,
    #[serde(rename = "sensorId")]
    pub sensor_id: String,
    pub thresholds: ThresholdConfig,
    #[serde(rename = "lastSample")]
    pub last_sample: Option<TemperatureSample>,
    #[serde(rename = "lastCheckedAt")]
    pub last_checked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct FanState {
    fans: ActuatorState,
    last_sample: Option<TemperatureSample>,
    last_checked_at: Option<DateTime<Utc>>,
}

pub struct FanService {
    sensor_id: String,
    sample_limit: u32,
    read_timeout: Duration,
    controller: HysteresisController,
    reader: Arc<dyn SensorReader>,
    dispatcher: ActuatorDispatcher,
    state: Mutex<FanState>,
}

impl FanService {
    /// Thresholds are validated here, once, so a bad band is reported at
    /// startup rather than on the first check.
    pub fn new(
        config: &Configuration,
        reader: Arc<dyn SensorReader>,
        dispatcher: ActuatorDispatcher,
    ) -> Result<Self, ControlError> {
        Ok(Self {
            sensor_id: config.sensor_id.clone(),
            sample_limit: config.sample_limit,
            read_timeout: config.upstream_timeout,
            controller: HysteresisController::new(config.thresholds)?,
            reader,
            dispatcher,
            state: Mutex::new(FanState::default()),
        })
    }

    pub async fn check_and_act(&self) -> Result<CheckOutcome, CheckError> {
        let mut state = self.state.lock().await;

        let sample = self.read_sample().await?;
        let checked_at = Utc::now();
        state.last_sample = Some(sample.clone());
        state.last_checked_at = Some(checked_at);

        let previous_state = state.fans;
        let decision = self.controller.decide(&sample, previous_state)?;

        if let Some(command) = decision.action.command() {
            self.dispatcher.dispatch(command).await?;
            state.fans = decision.next_state;
            info!(
                temperature = sample.value,
                from = previous_state.as_str(),
                to = state.fans.as_str(),
                "fan state changed"
            );
        } else {
            debug!(
                temperature = sample.value,
                fans = previous_state.as_str(),
                "no fan action needed"
            );
        }

        Ok(CheckOutcome {
            sample,
            previous_state,
            decision,
            state: state.fans,
            checked_at,
        })
    }

    /// Sends `command` regardless of the temperature.
    pub async fn manual(&self, command: FanCommand) -> Result<OverrideOutcome, CheckError> {
        let mut state = self.state.lock().await;
        let previous_state = state.fans;

        let ack = self.dispatcher.dispatch(command).await?;
        state.fans = command.target_state();
        info!(
            command = command.as_str(),
            from = previous_state.as_str(),
            to = state.fans.as_str(),
            "manual fan override"
        );

        Ok(OverrideOutcome {
            ack,
            previous_state,
            state: state.fans,
        })
    }

    /// Reads the sensor without deciding anything.
    /// Reads the latest sample without deciding or dispatching.
    pub async fn probe_sensor(&self) -> Result<TemperatureSample, CheckError> {
        let sample = self.read_sample().await?;
        if !sample.value.is_finite() {
            return Err(ControlError::InvalidSample(sample.value).into());
        }
        Ok(sample)
    }

    pub async fn status(&self) -> ServiceStatus {
        let state = self.state.lock().await;
        ServiceStatus {
            fans: state.fans,
            sensor_id: self.sensor_id.clone(),
            thresholds: self.controller.thresholds(),
            last_sample: state.last_sample.clone(),
            last_checked_at: state.last_checked_at,
        }
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        self.controller.thresholds()
    }

    async fn read_sample(&self) -> Result<TemperatureSample, UpstreamError> {
        tokio::time::timeout(
            self.read_timeout,
            self.reader.latest_sample(&self.sensor_id, self.sample_limit),
        )
        .await
        .map_err(|_| UpstreamError::Timeout(self.read_timeout))?
    }
}
