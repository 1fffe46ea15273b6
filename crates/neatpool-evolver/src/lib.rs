//! Generational population driver for the neatpool evolver.
//!
//! The surrounding environment calls [`Population::iterate`] once per
//! simulation tick to obtain a control vector for the active genome, then
//! [`Population::report_score`] at the episode boundary. Once every genome in
//! the pool has been scored, the population speciates, recombines, and
//! replaces the pool in a single synchronous step. Evaluation order is
//! strictly sequential; parallel evaluation is deliberately out of scope.

use std::cmp::Reverse;
use std::collections::HashMap;

use ordered_float::OrderedFloat;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use neatpool_core::{
    ConfigError, EvolverConfig, Genome, InnovationId, InnovationRegistry, compatible,
};

/// Signal returned to the environment alongside each control vector.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    /// Keep driving the current genome.
    #[default]
    Continue,
    /// The episode-length cap was exceeded; the environment should reset and
    /// report a score.
    Reset,
}

fn restored_rng() -> SmallRng {
    SmallRng::from_os_rng()
}

/// Pool of genomes evolved through evaluate, speciate, and crossover cycles.
///
/// Owns the innovation registry shared by every genome it breeds, plus the
/// seedable RNG all stochastic decisions flow through. Serializable for
/// external persistence; the RNG is reseeded on restore.
#[derive(Debug, Serialize, Deserialize)]
pub struct Population {
    config: EvolverConfig,
    pool: Vec<Genome>,
    registry: InnovationRegistry,
    generation: u64,
    cursor: usize,
    sample: u64,
    signal: Signal,
    species_count: usize,
    #[serde(skip, default = "restored_rng")]
    rng: SmallRng,
}

impl Population {
    /// Build a population of freshly seeded sparse genomes.
    pub fn new(config: EvolverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let mut registry = InnovationRegistry::new();
        let mut pool = Vec::with_capacity(config.population_size);
        for _ in 0..config.population_size {
            pool.push(Genome::new(&config, &mut registry, &mut rng));
        }
        Ok(Self {
            config,
            pool,
            registry,
            generation: 0,
            cursor: 0,
            sample: 0,
            signal: Signal::Continue,
            species_count: 0,
            rng,
        })
    }

    /// One simulation tick: evaluate the active genome against `inputs`.
    ///
    /// The returned signal flips to [`Signal::Reset`] once the per-episode
    /// sample counter exceeds the configured cap; the output vector is still
    /// produced either way.
    pub fn iterate(&mut self, inputs: &[f64]) -> (Vec<f64>, Signal) {
        self.sample += 1;
        self.signal = if self.sample > self.config.episode_cap {
            Signal::Reset
        } else {
            Signal::Continue
        };
        (self.pool[self.cursor].output(inputs), self.signal)
    }

    /// End the active genome's episode with its fitness score.
    ///
    /// Advances the evaluation cursor; when the last genome of the generation
    /// has been scored this triggers speciation, crossover, and wholesale
    /// pool replacement.
    pub fn report_score(&mut self, score: f64) {
        self.pool[self.cursor].set_score(score);
        self.signal = Signal::Continue;
        self.cursor += 1;
        self.sample = 0;
        if self.cursor == self.pool.len() {
            self.advance_generation();
        }
    }

    fn advance_generation(&mut self) {
        self.generation += 1;
        self.cursor = 0;

        // Best first; the sort is stable, so tied scores keep their
        // insertion order instead of nudging the key.
        self.pool
            .sort_by_key(|genome| Reverse(OrderedFloat(genome.score())));
        let best_score = self.pool.first().map_or(0.0, Genome::score);

        let species = self.speciate();
        self.species_count = species.len();
        debug!(
            generation = self.generation,
            species = self.species_count,
            best_score,
            innovations = self.registry.len(),
            "generation rollover"
        );

        let mut next = Vec::with_capacity(self.config.population_size);
        for members in species {
            self.cross_species(members, &mut next);
        }
        self.pool = next;
    }

    /// Group the ranked pool into species: each genome joins the first
    /// species whose representative (its first-ever member) it is compatible
    /// with, otherwise it founds a new one. Species are never empty.
    fn speciate(&mut self) -> Vec<Vec<Genome>> {
        let mut species: Vec<Vec<Genome>> = Vec::new();
        for genome in self.pool.drain(..) {
            match species
                .iter_mut()
                .find(|members| compatible(&members[0], &genome, &self.config))
            {
                Some(members) => members.push(genome),
                None => species.push(vec![genome]),
            }
        }
        species
    }

    /// Breed one species into the next generation's pool.
    ///
    /// A lone genome survives through a single mutation pass. Otherwise the
    /// top `ceil(elite_fraction * size)` members are copied verbatim and
    /// every remaining member is recombined with a random elite, the
    /// higher-scoring parent primary, then mutated once.
    fn cross_species(&mut self, mut members: Vec<Genome>, next: &mut Vec<Genome>) {
        if members.len() == 1 {
            if let Some(mut lone) = members.pop() {
                lone.mutate(&self.config, &mut self.registry, &mut self.rng);
                next.push(lone);
            }
            return;
        }

        let elite = (members.len() as f64 * self.config.elite_fraction).ceil() as usize;
        let elite = elite.clamp(1, members.len());
        for genome in &members[..elite] {
            next.push(genome.clone());
        }

        for index in elite..members.len() {
            let partner = self.rng.random_range(0..elite);
            let (primary, secondary) = if members[partner].score() > members[index].score() {
                (&members[partner], &members[index])
            } else {
                (&members[index], &members[partner])
            };
            let mut hybrid = recombine(primary, secondary, &mut self.rng);
            hybrid.mutate(&self.config, &mut self.registry, &mut self.rng);
            next.push(hybrid);
        }
    }

    /// Generations completed so far.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Index of the genome currently receiving ticks.
    #[must_use]
    pub const fn current_genome_index(&self) -> usize {
        self.cursor
    }

    /// Ticks consumed by the current episode.
    #[must_use]
    pub const fn current_sample(&self) -> u64 {
        self.sample
    }

    /// Signal produced by the most recent tick.
    #[must_use]
    pub const fn signal(&self) -> Signal {
        self.signal
    }

    /// Species discovered during the most recent reproduction.
    #[must_use]
    pub const fn species_count(&self) -> usize {
        self.species_count
    }

    /// Highest score currently recorded in the pool.
    #[must_use]
    pub fn best_score(&self) -> f64 {
        self.pool
            .iter()
            .map(Genome::score)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    #[must_use]
    pub fn genomes(&self) -> &[Genome] {
        &self.pool
    }

    #[must_use]
    pub const fn registry(&self) -> &InnovationRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn config(&self) -> &EvolverConfig {
        &self.config
    }
}

/// Gene-level recombination: clone the primary parent, then for every
/// secondary connection whose innovation id the primary also carries, inherit
/// the secondary's weight with probability one half.
fn recombine(primary: &Genome, secondary: &Genome, rng: &mut SmallRng) -> Genome {
    let mut hybrid = primary.clone();
    let slots: HashMap<InnovationId, usize> = primary
        .connections()
        .iter()
        .enumerate()
        .map(|(slot, connection)| (connection.innovation, slot))
        .collect();
    for connection in secondary.connections() {
        if let Some(&slot) = slots.get(&connection.innovation) {
            if rng.random::<bool>() {
                hybrid.connections_mut()[slot].weight = connection.weight;
            }
        }
    }
    hybrid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_config(population_size: usize) -> EvolverConfig {
        EvolverConfig {
            input_size: 4,
            output_size: 3,
            population_size,
            rng_seed: Some(0xBEEF),
            ..EvolverConfig::default()
        }
    }

    #[test]
    fn construction_validates_config() {
        let config = EvolverConfig {
            population_size: 0,
            ..EvolverConfig::default()
        };
        assert!(Population::new(config).is_err());
    }

    #[test]
    fn seeded_populations_replay_identically() {
        let mut a = Population::new(seeded_config(3)).expect("population a");
        let mut b = Population::new(seeded_config(3)).expect("population b");
        let inputs = [0.5, 0.25, -0.75, 1.0];
        for _ in 0..4 {
            assert_eq!(a.iterate(&inputs), b.iterate(&inputs));
        }
    }

    #[test]
    fn recombine_inherits_only_matching_genes() {
        let mut population = Population::new(seeded_config(2)).expect("population");
        let primary = population.pool[0].clone();
        let secondary = population.pool[1].clone();
        let hybrid = recombine(&primary, &secondary, &mut population.rng);

        assert_eq!(hybrid.connections().len(), primary.connections().len());
        let secondary_weights: HashMap<InnovationId, f64> = secondary
            .connections()
            .iter()
            .map(|connection| (connection.innovation, connection.weight))
            .collect();
        for (original, inherited) in primary.connections().iter().zip(hybrid.connections()) {
            assert_eq!(original.innovation, inherited.innovation);
            assert_eq!(original.source, inherited.source);
            assert_eq!(original.destination, inherited.destination);
            let from_secondary = secondary_weights.get(&original.innovation);
            assert!(
                inherited.weight == original.weight
                    || from_secondary.is_some_and(|weight| *weight == inherited.weight)
            );
        }
    }

    #[test]
    fn recombine_tolerates_bare_parents() {
        let config = EvolverConfig {
            initial_link_min: 0,
            initial_link_max: 0,
            ..seeded_config(2)
        };
        let mut population = Population::new(config).expect("population");
        let primary = population.pool[0].clone();
        let secondary = population.pool[1].clone();
        let hybrid = recombine(&primary, &secondary, &mut population.rng);
        assert!(hybrid.connections().is_empty());
    }

    #[test]
    fn snapshot_round_trips_pool_and_registry() {
        let mut population = Population::new(seeded_config(2)).expect("population");
        population.report_score(1.0);
        let json = serde_json::to_string(&population).expect("serialize");
        let restored: Population = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.generation(), population.generation());
        assert_eq!(restored.current_genome_index(), population.current_genome_index());
        assert_eq!(restored.genomes(), population.genomes());
        assert_eq!(restored.registry().next_id(), population.registry().next_id());
    }
}
