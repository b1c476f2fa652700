use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActuatorState {
    #[default]
    Off,
    On,
}

impl ActuatorState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }
}

/// What a single control cycle asks of the fans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FanAction {
    None,
    TurnOn,
    TurnOff,
}

impl FanAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::TurnOn => "TURN_ON",
            Self::TurnOff => "TURN_OFF",
        }
    }

    pub fn command(self) -> Option<FanCommand> {
        match self {
            Self::None => None,
            Self::TurnOn => Some(FanCommand::TurnOn),
            Self::TurnOff => Some(FanCommand::TurnOff),
        }
    }
}

/// The dispatchable subset of [`FanAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FanCommand {
    TurnOn,
    TurnOff,
}

impl FanCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TurnOn => "TURN_ON",
            Self::TurnOff => "TURN_OFF",
        }
    }

    /// State the fans are in once this command has been acknowledged.
    pub fn target_state(self) -> ActuatorState {
        match self {
            Self::TurnOn => ActuatorState::On,
            Self::TurnOff => ActuatorState::Off,
        }
    }
}

impl From<FanCommand> for FanAction {
    fn from(command: FanCommand) -> Self {
        match command {
            FanCommand::TurnOn => Self::TurnOn,
            FanCommand::TurnOff => Self::TurnOff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureSample {
    pub value: f64,
    #[serde(rename = "sensorId")]
    pub sensor_id: String,
    #[serde(rename = "observedAt")]
    pub observed_at: Option<DateTime<Utc>>,
}

impl TemperatureSample {
    pub fn new(sensor_id: impl Into<String>, value: f64) -> Self {
        Self {
            value,
            sensor_id: sensor_id.into(),
            observed_at: None,
        }
    }

    pub fn observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = Some(observed_at);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlDecision {
    #[serde(rename = "nextState")]
    pub next_state: ActuatorState,
    pub action: FanAction,
}

impl ControlDecision {
    pub fn hold(current: ActuatorState) -> Self {
        Self {
            next_state: current,
            action: FanAction::None,
        }
    }
}
