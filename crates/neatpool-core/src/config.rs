//! Static configuration for an evolver run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when validating an [`EvolverConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Tunables for genome construction, mutation, speciation, and episodes.
///
/// Everything stochastic flows from `rng_seed`, so a seeded config replays
/// an identical evolution run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvolverConfig {
    /// Length of the sensor vector supplied each tick.
    pub input_size: usize,
    /// Length of the control vector returned each tick.
    pub output_size: usize,
    /// Number of genomes per generation.
    pub population_size: usize,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
    /// Minimum link mutations applied when constructing a genome.
    pub initial_link_min: usize,
    /// Maximum link mutations applied when constructing a genome.
    pub initial_link_max: usize,
    /// New connection weights are drawn uniformly from `[0, weight_span)`.
    pub weight_span: f64,
    /// Point mutation nudges a weight by a uniform draw from `[-point_delta, point_delta)`.
    pub point_delta: f64,
    /// Bounded retry budget for the random-search mutation operators.
    pub mutation_attempts: usize,
    /// Probability that a mutation pass fires the point operator.
    pub point_prob: f64,
    /// Probability that a mutation pass fires the link operator.
    pub link_prob: f64,
    /// Probability that a mutation pass fires the node-split operator.
    pub node_prob: f64,
    /// Probability that a mutation pass fires the enable/disable toggle.
    pub toggle_prob: f64,
    /// Weight-importance coefficient `c` in the compatibility formula.
    pub compat_weight_coeff: f64,
    /// Genetic distance below which two genomes share a species.
    pub compat_threshold: f64,
    /// Fraction of a species copied verbatim into the next generation.
    pub elite_fraction: f64,
    /// Samples allowed per episode before the RESET signal is raised.
    pub episode_cap: u64,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            input_size: 9,
            output_size: 6,
            population_size: 50,
            rng_seed: None,
            initial_link_min: 15,
            initial_link_max: 30,
            weight_span: 10.0,
            point_delta: 0.1,
            mutation_attempts: 10,
            point_prob: 0.25,
            link_prob: 0.25,
            node_prob: 0.25,
            toggle_prob: 0.25,
            compat_weight_coeff: 0.4,
            compat_threshold: 10.5,
            elite_fraction: 0.2,
            // 60 seconds of episode at 30 samples per second.
            episode_cap: 1800,
        }
    }
}

impl EvolverConfig {
    /// Validates every tunable, returning the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_size == 0 {
            return Err(ConfigError::Invalid("input_size must be non-zero"));
        }
        if self.output_size == 0 {
            return Err(ConfigError::Invalid("output_size must be non-zero"));
        }
        if self.population_size == 0 {
            return Err(ConfigError::Invalid("population_size must be non-zero"));
        }
        if self.initial_link_min > self.initial_link_max {
            return Err(ConfigError::Invalid(
                "initial link range must not be inverted",
            ));
        }
        if self.weight_span <= 0.0 {
            return Err(ConfigError::Invalid("weight_span must be positive"));
        }
        if self.point_delta <= 0.0 {
            return Err(ConfigError::Invalid("point_delta must be positive"));
        }
        if self.mutation_attempts == 0 {
            return Err(ConfigError::Invalid("mutation_attempts must be non-zero"));
        }
        let probabilities = [
            self.point_prob,
            self.link_prob,
            self.node_prob,
            self.toggle_prob,
        ];
        if probabilities.iter().any(|prob| !(0.0..=1.0).contains(prob)) {
            return Err(ConfigError::Invalid(
                "mutation probabilities must lie in [0, 1]",
            ));
        }
        if self.compat_weight_coeff < 0.0 {
            return Err(ConfigError::Invalid(
                "compat_weight_coeff must be non-negative",
            ));
        }
        if self.compat_threshold <= 0.0 {
            return Err(ConfigError::Invalid("compat_threshold must be positive"));
        }
        if !(self.elite_fraction > 0.0 && self.elite_fraction <= 1.0) {
            return Err(ConfigError::Invalid("elite_fraction must lie in (0, 1]"));
        }
        if self.episode_cap == 0 {
            return Err(ConfigError::Invalid("episode_cap must be non-zero"));
        }
        Ok(())
    }
}
