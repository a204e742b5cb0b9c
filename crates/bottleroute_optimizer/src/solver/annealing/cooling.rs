use serde::{Deserialize, Serialize};

use super::params::SaParams;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CoolingSchedule {
    /// Subtract a fixed step derived from the cooling rate.
    Linear,
    /// Multiply by the cooling rate.
    Exponential,
    /// `T0 / ln(1 + iteration)`, very slow tail.
    Logarithmic,
    /// Exponential with the factor nudged by the current acceptance rate:
    /// cools faster while acceptance is above 0.6, slower below.
    Adaptive,
    /// `T0 / (1 + iteration)`.
    Cauchy,
}

/// Next temperature after a cooling step. Never drops below the configured
/// final temperature.
pub fn next_temperature(
    params: &SaParams,
    current: f64,
    iteration: usize,
    acceptance_rate: f64,
) -> f64 {
    let cooled = match params.schedule {
        CoolingSchedule::Linear => {
            current - params.initial_temperature * (1.0 - params.cooling_rate)
        }
        CoolingSchedule::Exponential => current * params.cooling_rate,
        CoolingSchedule::Logarithmic => {
            let denominator = (1.0 + iteration as f64).ln();
            if denominator <= f64::EPSILON {
                current
            } else {
                params.initial_temperature / denominator
            }
        }
        CoolingSchedule::Adaptive => {
            let factor = if acceptance_rate > 0.6 {
                params.cooling_rate * 0.95
            } else {
                (params.cooling_rate * 1.05).min(0.999)
            };
            current * factor
        }
        CoolingSchedule::Cauchy => params.initial_temperature / (1.0 + iteration as f64),
    };

    cooled.max(params.final_temperature)
}
