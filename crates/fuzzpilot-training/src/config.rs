//! Genetic algorithm configuration.
//!
//! Every field has a default, so a JSON file only needs the values it changes:
//!
//! ```
//! # use fuzzpilot_training::config::GaConfig;
//! let config: GaConfig = serde_json::from_str(r#"{ "population_size": 12 }"#).unwrap();
//! assert_eq!(config.population_size, 12);
//! assert_eq!(config.stagnation_threshold, 20);
//! ```

use serde::{Deserialize, Serialize};

use crate::{genes::MutationOp, pool::PoolBuildError};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be at least 2, got {size}")]
    PopulationTooSmall { size: usize },
    #[display("generation count must be positive")]
    NoGenerations,
    #[display("tournament size must be positive")]
    EmptyTournament,
    #[display("{name} must lie in [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[display("stagnation boost must be finite and at least 1, got {boost}")]
    InvalidBoost { boost: f64 },
    #[display("mutation radius must be finite and non-negative, got {radius}")]
    InvalidRadius { radius: f64 },
    #[display("no genes to optimize")]
    NoGenes,
    #[display("gene {index} has an empty range [{min}, {max}]")]
    InvalidGeneRange { index: usize, min: f64, max: f64 },
    #[display("seed chromosome {index} has {actual} genes, expected {expected}")]
    SeedLength {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[display("{message}")]
    Pool { message: String },
}

impl From<PoolBuildError> for ConfigError {
    fn from(err: PoolBuildError) -> Self {
        Self::Pool {
            message: err.to_string(),
        }
    }
}

/// A rate that moves linearly from `start` at the first generation to `end` at the last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub start: f64,
    pub end: f64,
}

impl RateSchedule {
    #[must_use]
    pub const fn constant(rate: f64) -> Self {
        Self {
            start: rate,
            end: rate,
        }
    }

    /// The rate at `generation` out of `generations`.
    ///
    /// ```
    /// # use fuzzpilot_training::config::RateSchedule;
    /// let schedule = RateSchedule { start: 0.3, end: 0.1 };
    /// assert_eq!(schedule.at(0, 11), 0.3);
    /// assert!((schedule.at(5, 11) - 0.2).abs() < 1e-12);
    /// assert_eq!(schedule.at(10, 11), 0.1);
    /// ```
    #[must_use]
    pub fn at(&self, generation: usize, generations: usize) -> f64 {
        lerp(self.start, self.end, progress(generation, generations))
    }
}

fn progress(generation: usize, generations: usize) -> f64 {
    if generations <= 1 {
        return 0.0;
    }
    #[expect(clippy::cast_precision_loss)]
    let t = generation.min(generations - 1) as f64 / (generations - 1) as f64;
    t
}

fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start * (1.0 - t) + end * t
}

/// How a gene chosen for mutation changes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationStrategy {
    /// Draw a fresh value from the gene's range.
    #[default]
    Reset,
    /// Add uniform noise of at most `radius × range width`, the radius shrinking from
    /// `initial_radius` to `final_radius` over the run.
    Perturb {
        initial_radius: f64,
        final_radius: f64,
    },
}

impl MutationStrategy {
    /// The concrete operator for `generation`.
    #[must_use]
    pub fn operator(&self, generation: usize, generations: usize) -> MutationOp {
        match *self {
            Self::Reset => MutationOp::Reset,
            Self::Perturb {
                initial_radius,
                final_radius,
            } => MutationOp::Perturb {
                radius: lerp(
                    initial_radius,
                    final_radius,
                    progress(generation, generations),
                ),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    pub population_size: usize,
    pub generations: usize,
    pub tournament_size: usize,
    /// Per-gene mutation probability.
    pub mutation: RateSchedule,
    /// Probability that two parents are recombined rather than cloned.
    pub crossover: RateSchedule,
    pub mutation_strategy: MutationStrategy,
    /// Generations without a change of the generation best before the mutation rate is
    /// boosted.
    pub stagnation_threshold: usize,
    pub stagnation_boost: f64,
    pub max_mutation_rate: f64,
    /// Evaluation threads; all available cores when unset.
    pub threads: Option<usize>,
    /// RNG seed; OS entropy when unset.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            generations: 100,
            tournament_size: 5,
            mutation: RateSchedule {
                start: 0.3,
                end: 0.05,
            },
            crossover: RateSchedule {
                start: 0.7,
                end: 0.95,
            },
            mutation_strategy: MutationStrategy::Reset,
            stagnation_threshold: 20,
            stagnation_boost: 2.0,
            max_mutation_rate: 0.9,
            threads: None,
            seed: None,
        }
    }
}

impl GaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall {
                size: self.population_size,
            });
        }
        if self.generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        if self.tournament_size == 0 {
            return Err(ConfigError::EmptyTournament);
        }
        let rates = [
            ("mutation start", self.mutation.start),
            ("mutation end", self.mutation.end),
            ("crossover start", self.crossover.start),
            ("crossover end", self.crossover.end),
            ("max mutation rate", self.max_mutation_rate),
        ];
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        if !(self.stagnation_boost.is_finite() && self.stagnation_boost >= 1.0) {
            return Err(ConfigError::InvalidBoost {
                boost: self.stagnation_boost,
            });
        }
        if let MutationStrategy::Perturb {
            initial_radius,
            final_radius,
        } = self.mutation_strategy
        {
            for radius in [initial_radius, final_radius] {
                if !(radius.is_finite() && radius >= 0.0) {
                    return Err(ConfigError::InvalidRadius { radius });
                }
            }
        }
        Ok(())
    }
}
