use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::{error::ConfigurationError, solver::Threads};

use super::{crossover::CrossoverKind, mutation::MutationKind, selection::SelectionKind};

/// Genetic engine knobs. Rates are percentages in `0..=100`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GaParams {
    pub population_size: usize,
    pub elite_percent: f64,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub tournament_size: usize,
    pub selection: SelectionKind,
    pub crossover: CrossoverKind,
    pub mutation: MutationKind,
    /// Nudge the mutation rate up under stagnation and back down while the
    /// search is still improving.
    pub adaptive_rates: bool,
    pub max_iterations: usize,
    pub time_limit: Option<SignedDuration>,
    pub seed: Option<u64>,
    pub threads: Threads,
}

impl Default for GaParams {
    fn default() -> Self {
        GaParams {
            population_size: 50,
            elite_percent: 10.0,
            mutation_rate: 5.0,
            crossover_rate: 80.0,
            tournament_size: 5,
            selection: SelectionKind::Tournament,
            crossover: CrossoverKind::Order,
            mutation: MutationKind::TwoOpt,
            adaptive_rates: true,
            max_iterations: 200,
            time_limit: None,
            seed: None,
            threads: Threads::Auto,
        }
    }
}

impl GaParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.population_size < 10 {
            return Err(ConfigurationError::PopulationTooSmall(self.population_size));
        }
        if self.max_iterations == 0 {
            return Err(ConfigurationError::NoIterations(self.max_iterations));
        }
        for (name, value) in [
            ("elite_percent", self.elite_percent),
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigurationError::RateOutOfRange { name, value });
            }
        }
        Ok(())
    }

    pub fn elite_count(&self) -> usize {
        ((self.population_size as f64 * self.elite_percent / 100.0).round() as usize)
            .clamp(1, self.population_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GaParams::default().validate().is_ok());
    }

    #[test]
    fn test_tiny_population_rejected() {
        let params = GaParams {
            population_size: 4,
            ..GaParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigurationError::PopulationTooSmall(4))
        ));
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let params = GaParams {
            mutation_rate: 130.0,
            ..GaParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigurationError::RateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_elite_count_never_zero() {
        let params = GaParams {
            population_size: 10,
            elite_percent: 0.0,
            ..GaParams::default()
        };
        assert_eq!(params.elite_count(), 1);
    }
}
