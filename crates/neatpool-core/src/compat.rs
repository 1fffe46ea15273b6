//! Genetic distance between genomes, used to group the pool into species.

use std::collections::HashMap;

use crate::config::EvolverConfig;
use crate::gene::InnovationId;
use crate::genome::Genome;

/// Compatibility distance between two genomes.
///
/// Connections are aligned by innovation id; disjoint genes and the summed
/// weight difference over shared genes (scaled by `weight_coeff`) are
/// normalized by the size of the union of both gene sets. Two genomes with no
/// connections at all have an empty union and are defined to be at distance
/// zero rather than dividing by it.
#[must_use]
pub fn compatibility(a: &Genome, b: &Genome, weight_coeff: f64) -> f64 {
    let weights_a: HashMap<InnovationId, f64> = a
        .connections()
        .iter()
        .map(|connection| (connection.innovation, connection.weight))
        .collect();
    let weights_b: HashMap<InnovationId, f64> = b
        .connections()
        .iter()
        .map(|connection| (connection.innovation, connection.weight))
        .collect();

    let mut shared = 0usize;
    let mut weight_delta = 0.0;
    for (innovation, weight) in &weights_a {
        if let Some(other) = weights_b.get(innovation) {
            shared += 1;
            weight_delta += (weight - other).abs();
        }
    }

    let union = weights_a.len() + weights_b.len() - shared;
    if union == 0 {
        return 0.0;
    }
    let disjoint = (weights_a.len() + weights_b.len() - 2 * shared) as f64;
    (disjoint + weight_coeff * weight_delta) / union as f64
}

/// Whether two genomes fall inside the configured species threshold.
#[must_use]
pub fn compatible(a: &Genome, b: &Genome, config: &EvolverConfig) -> bool {
    compatibility(a, b, config.compat_weight_coeff) < config.compat_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innovation::InnovationRegistry;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn sample_genome(seed: u64, registry: &mut InnovationRegistry) -> Genome {
        let mut rng = SmallRng::seed_from_u64(seed);
        Genome::new(&EvolverConfig::default(), registry, &mut rng)
    }

    #[test]
    fn self_distance_is_zero() {
        let mut registry = InnovationRegistry::new();
        let genome = sample_genome(42, &mut registry);
        assert_eq!(compatibility(&genome, &genome, 0.4), 0.0);
    }

    #[test]
    fn empty_genomes_are_compatible() {
        let config = EvolverConfig {
            initial_link_min: 0,
            initial_link_max: 0,
            ..EvolverConfig::default()
        };
        let mut registry = InnovationRegistry::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let a = Genome::new(&config, &mut registry, &mut rng);
        let b = Genome::new(&config, &mut registry, &mut rng);
        assert_eq!(compatibility(&a, &b, 0.4), 0.0);
        assert!(compatible(&a, &b, &config));
    }

    #[test]
    fn distance_is_symmetric() {
        let mut registry = InnovationRegistry::new();
        let a = sample_genome(7, &mut registry);
        let b = sample_genome(8, &mut registry);
        let forward = compatibility(&a, &b, 0.4);
        let backward = compatibility(&b, &a, 0.4);
        assert!((forward - backward).abs() < 1e-12);
        assert!(forward >= 0.0);
    }

    #[test]
    fn diverged_weights_increase_distance() {
        let mut registry = InnovationRegistry::new();
        let genome = sample_genome(13, &mut registry);
        let mut diverged = genome.clone();
        for connection in diverged.connections_mut() {
            connection.weight += 5.0;
        }
        let near = compatibility(&genome, &genome, 0.4);
        let far = compatibility(&genome, &diverged, 0.4);
        assert!(far > near);
    }
}
