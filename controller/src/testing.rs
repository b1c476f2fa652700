//! In-memory stand-ins for the secret store, the sensor service and the webhook.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use greenhouse_common::{
    Configuration, TemperatureSample, SECRET_IFTTT_KEY, SECRET_SENSORPUSH_PASSWORD,
    SECRET_SENSORPUSH_USER,
};

use crate::{
    check::FanService,
    dispatch::ActuatorDispatcher,
    error::{SecretError, SinkError, UpstreamError},
    ifttt::ActuatorSink,
    secrets::SecretProvider,
    sensorpush::SensorReader,
};

pub const SENSOR_ID: &str = "greenhouse-1";

#[derive(Default)]
pub struct FakeSecrets {
    values: HashMap<String, String>,
}

impl FakeSecrets {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn complete() -> Self {
        let mut values = HashMap::new();
        values.insert(SECRET_SENSORPUSH_USER.to_string(), "grower@example.com".to_string());
        values.insert(SECRET_SENSORPUSH_PASSWORD.to_string(), "hunter2".to_string());
        values.insert(SECRET_IFTTT_KEY.to_string(), "hook-key".to_string());
        Self { values }
    }
}

#[async_trait]
impl SecretProvider for FakeSecrets {
    async fn get_secret(&self, id: &str) -> Result<String, SecretError> {
        self.values
            .get(id)
            .cloned()
            .ok_or_else(|| SecretError::Missing(id.to_string()))
    }
}

enum SinkBehaviour {
    Accept,
    Reject(u16),
    Stall(Duration),
}

/// Records every `(key, event)` it is asked to trigger.
pub struct RecordingSink {
    behaviour: Mutex<SinkBehaviour>,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    fn new(behaviour: SinkBehaviour) -> Self {
        Self {
            behaviour: Mutex::new(behaviour),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting() -> Self {
        Self::new(SinkBehaviour::Accept)
    }

    pub fn rejecting(status: u16) -> Self {
        Self::new(SinkBehaviour::Reject(status))
    }

    pub fn stalling(delay: Duration) -> Self {
        Self::new(SinkBehaviour::Stall(delay))
    }

    pub fn accept(&self) {
        *self.behaviour.lock().unwrap() = SinkBehaviour::Accept;
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, event)| event).collect()
    }
}

#[async_trait]
impl ActuatorSink for RecordingSink {
    async fn trigger(&self, key: &str, event_name: &str) -> Result<(), SinkError> {
        self.calls
            .lock()
            .unwrap()
            .push((key.to_string(), event_name.to_string()));

        let stall = match *self.behaviour.lock().unwrap() {
            SinkBehaviour::Accept => return Ok(()),
            SinkBehaviour::Reject(status) => return Err(SinkError::HttpStatus(status)),
            SinkBehaviour::Stall(delay) => delay,
        };
        tokio::time::sleep(stall).await;
        Ok(())
    }
}

/// Serves queued readings in order; an empty queue means "no samples".
#[derive(Default)]
pub struct ScriptedSensor {
    readings: Mutex<VecDeque<Result<f64, &'static str>>>,
    delay: Option<Duration>,
}

impl ScriptedSensor {
    pub fn reading(value: f64) -> Self {
        let sensor = Self::default();
        sensor.push(value);
        sensor
    }

    pub fn slow(value: f64, delay: Duration) -> Self {
        let mut sensor = Self::reading(value);
        sensor.delay = Some(delay);
        sensor
    }

    pub fn unavailable() -> Self {
        let sensor = Self::default();
        sensor.readings.lock().unwrap().push_back(Err("down"));
        sensor
    }

    pub fn push(&self, value: f64) {
        self.readings.lock().unwrap().push_back(Ok(value));
    }
}

#[async_trait]
impl SensorReader for ScriptedSensor {
    async fn latest_sample(
        &self,
        sensor_id: &str,
        _sample_limit: u32,
    ) -> Result<TemperatureSample, UpstreamError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.readings.lock().unwrap().pop_front();
        match next {
            Some(Ok(value)) => Ok(TemperatureSample::new(sensor_id, value)),
            Some(Err(body)) => Err(UpstreamError::Status {
                status: 503,
                body: body.to_string(),
            }),
            None => Err(UpstreamError::NoSamples(sensor_id.to_string())),
        }
    }
}

pub fn test_config() -> Configuration {
    let mut config = Configuration::new(SENSOR_ID);
    config.upstream_timeout = Duration::from_millis(200);
    config
}

pub fn service(
    sensor: ScriptedSensor,
    secrets: FakeSecrets,
    sink: Arc<RecordingSink>,
) -> FanService {
    let config = test_config();
    let dispatcher = ActuatorDispatcher::new(
        Arc::new(secrets),
        sink,
        config.events.clone(),
        config.upstream_timeout,
    );
    FanService::new(&config, Arc::new(sensor), dispatcher)
        .expect("test thresholds are valid")
}
