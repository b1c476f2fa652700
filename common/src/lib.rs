pub mod config;
pub mod error;
pub mod hysteresis;
pub mod names;
pub mod types;

pub use config::{Configuration, EventNames, ThresholdConfig};
pub use error::{ConfigError, ControlError};
pub use hysteresis::{decide, HysteresisController};
pub use names::*;
pub use types::{ActuatorState, ControlDecision, FanAction, FanCommand, TemperatureSample};
