use crate::{
    config::ThresholdConfig,
    error::ControlError,
    types::{ActuatorState, ControlDecision, FanAction, TemperatureSample},
};

/// Bang-bang fan control with a deadband between the two triggers.
///
/// Holds thresholds only. The fan state is supplied by the caller on every
/// decision, so identical inputs always produce identical decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisController {
    thresholds: ThresholdConfig,
}

impl HysteresisController {
    pub fn new(thresholds: ThresholdConfig) -> Result<Self, ControlError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        self.thresholds
    }

    pub fn decide(
        &self,
        sample: &TemperatureSample,
        current: ActuatorState,
    ) -> Result<ControlDecision, ControlError> {
        if !sample.value.is_finite() {
            return Err(ControlError::InvalidSample(sample.value));
        }

        // Boundary readings stay in the band.
        let decision = match current {
            ActuatorState::Off if sample.value > self.thresholds.high_trigger => ControlDecision {
                next_state: ActuatorState::On,
                action: FanAction::TurnOn,
            },
            ActuatorState::On if sample.value < self.thresholds.low_trigger => ControlDecision {
                next_state: ActuatorState::Off,
                action: FanAction::TurnOff,
            },
            _ => ControlDecision::hold(current),
        };

        Ok(decision)
    }
}

/// One-shot form of [`HysteresisController::decide`] that validates `thresholds`
/// before looking at the sample.
pub fn decide(
    sample: &TemperatureSample,
    current: ActuatorState,
    thresholds: ThresholdConfig,
) -> Result<ControlDecision, ControlError> {
    HysteresisController::new(thresholds)?.decide(sample, current)
}
