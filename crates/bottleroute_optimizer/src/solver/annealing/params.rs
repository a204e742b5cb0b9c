use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

use super::cooling::CoolingSchedule;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SaParams {
    pub initial_temperature: f64,
    pub final_temperature: f64,
    /// Multiplicative factor for the geometric schedules, in `(0, 1)`.
    pub cooling_rate: f64,
    pub schedule: CoolingSchedule,
    /// Moves attempted before each cooling step.
    pub iterations_per_temperature: usize,
    /// Acceptance rate below which a reheat becomes possible.
    pub min_acceptance_rate: f64,
    /// Reheat ceiling as a fraction of the initial temperature.
    pub reheat_threshold: f64,
    pub max_iterations: usize,
    pub time_limit: Option<SignedDuration>,
    pub seed: Option<u64>,
}

impl Default for SaParams {
    fn default() -> Self {
        SaParams {
            initial_temperature: 1000.0,
            final_temperature: 0.1,
            cooling_rate: 0.95,
            schedule: CoolingSchedule::Exponential,
            iterations_per_temperature: 50,
            min_acceptance_rate: 0.1,
            reheat_threshold: 0.5,
            max_iterations: 5000,
            time_limit: None,
            seed: None,
        }
    }
}

impl SaParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.initial_temperature <= 0.0 {
            return Err(ConfigurationError::NonPositiveTemperature(
                self.initial_temperature,
            ));
        }
        if !(0.0..1.0).contains(&self.cooling_rate) || self.cooling_rate == 0.0 {
            return Err(ConfigurationError::CoolingRateOutOfRange(self.cooling_rate));
        }
        if self.iterations_per_temperature == 0 {
            return Err(ConfigurationError::NoIterationsAtTemperature);
        }
        if self.max_iterations == 0 {
            return Err(ConfigurationError::NoIterations(self.max_iterations));
        }
        Ok(())
    }
}
