//! Genome representation, forward evaluation, and mutation operators.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

use crate::config::EvolverConfig;
use crate::gene::{ConnectionGene, NodeGene, NodeKind};
use crate::innovation::InnovationRegistry;

/// Activation applied once per visited node.
///
/// Note the exponent sign: this is the mirrored logistic curve the evolver
/// has always used, so `sigmoid(0) == 0.5` but large positive accumulators
/// saturate toward 0.
fn sigmoid(value: f64) -> f64 {
    1.0 / (1.0 + value.exp())
}

/// One candidate network: topology, weights, enable flags, and latest score.
///
/// Node indices are dense and monotone: inputs first, then outputs, with
/// hidden nodes appended by node mutation. Connections always reference valid
/// node indices, but nothing forbids cycles; evaluation truncates cyclic
/// feedback instead of resolving it (see [`Genome::output`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genome {
    input_size: usize,
    output_size: usize,
    nodes: Vec<NodeGene>,
    connections: Vec<ConnectionGene>,
    /// Ordered pairs already wired in this genome; link mutation rejects
    /// duplicates against this set.
    registered: HashSet<(usize, usize)>,
    score: f64,
}

impl Genome {
    /// Construct a genome with fixed input/output nodes and a sparse random
    /// initial topology.
    ///
    /// A uniform random count of link mutations seeds the connections, so the
    /// initial network is always two-layer; duplicate or invalid structural
    /// attempts are silently skipped.
    pub fn new(
        config: &EvolverConfig,
        registry: &mut InnovationRegistry,
        rng: &mut dyn RngCore,
    ) -> Self {
        let mut nodes = Vec::with_capacity(config.input_size + config.output_size);
        for index in 0..config.input_size {
            nodes.push(NodeGene::new(index, NodeKind::Input));
        }
        for offset in 0..config.output_size {
            nodes.push(NodeGene::new(config.input_size + offset, NodeKind::Output));
        }

        let mut genome = Self {
            input_size: config.input_size,
            output_size: config.output_size,
            nodes,
            connections: Vec::new(),
            registered: HashSet::new(),
            score: 0.0,
        };

        let seed_links = rng.random_range(config.initial_link_min..=config.initial_link_max);
        for _ in 0..seed_links {
            genome.mutate_link(config, registry, rng);
        }
        genome
    }

    /// Forward-evaluate the network for one tick.
    ///
    /// Breadth-first from the input nodes: each node is visited at most once,
    /// its accumulator passed through the activation exactly once, then
    /// distributed along every outgoing connection (the enabled flag is
    /// deliberately ignored here, matching the evolver's historical
    /// behavior). A cycle back into an already-visited node still deposits
    /// into its accumulator but never re-activates it, so cyclic feedback is
    /// silently truncated rather than iterated.
    ///
    /// A wrong-length input vector is reported and evaluated best-effort;
    /// output slots whose nodes were never reached read as `sigmoid(0)`.
    #[must_use]
    pub fn output(&self, inputs: &[f64]) -> Vec<f64> {
        if inputs.len() != self.input_size {
            warn!(
                expected = self.input_size,
                supplied = inputs.len(),
                "input vector dimension mismatch; evaluating best-effort"
            );
        }

        let mut outgoing: HashMap<usize, SmallVec<[usize; 4]>> = HashMap::new();
        for (slot, connection) in self.connections.iter().enumerate() {
            outgoing.entry(connection.source).or_default().push(slot);
        }

        let mut values = vec![0.0_f64; self.nodes.len()];
        for (slot, input) in values.iter_mut().take(self.input_size).zip(inputs) {
            *slot = *input;
        }

        let mut enqueued = vec![false; self.nodes.len()];
        let mut activated = vec![false; self.nodes.len()];
        let mut queue = VecDeque::with_capacity(self.nodes.len());
        for index in 0..self.input_size {
            queue.push_back(index);
            enqueued[index] = true;
        }

        while let Some(node) = queue.pop_front() {
            values[node] = sigmoid(values[node]);
            activated[node] = true;
            let Some(edges) = outgoing.get(&node) else {
                continue;
            };
            for &slot in edges {
                let connection = &self.connections[slot];
                values[connection.destination] += values[node] * connection.weight;
                if !enqueued[connection.destination] {
                    enqueued[connection.destination] = true;
                    queue.push_back(connection.destination);
                }
            }
        }

        let mut outputs = Vec::with_capacity(self.output_size);
        for index in self.input_size..self.input_size + self.output_size {
            let value = values[index];
            outputs.push(if activated[index] { value } else { sigmoid(value) });
        }
        outputs
    }

    /// Point mutation: nudge the weight of a random *enabled* connection.
    ///
    /// Retries a bounded number of times when it lands on disabled
    /// connections, then gives up silently. A connection-less genome is a
    /// no-op.
    pub fn mutate_point(&mut self, config: &EvolverConfig, rng: &mut dyn RngCore) {
        if self.connections.is_empty() {
            return;
        }
        for _ in 0..config.mutation_attempts {
            let pick = rng.random_range(0..self.connections.len());
            if self.connections[pick].enabled {
                let delta = rng.random_range(-config.point_delta..config.point_delta);
                self.connections[pick].nudge_weight(delta);
                return;
            }
        }
    }

    /// Link mutation: wire a new random connection.
    ///
    /// A pair is rejected only when both ends are inputs or both are outputs;
    /// self-loops, back edges, and output-to-input links are all legal, which
    /// is where cycles come from. Pairs already wired in this genome are
    /// rejected too. Gives up silently after the retry budget.
    pub fn mutate_link(
        &mut self,
        config: &EvolverConfig,
        registry: &mut InnovationRegistry,
        rng: &mut dyn RngCore,
    ) {
        for _ in 0..config.mutation_attempts {
            let source = rng.random_range(0..self.nodes.len());
            let destination = rng.random_range(0..self.nodes.len());
            let source_kind = self.nodes[source].kind;
            let destination_kind = self.nodes[destination].kind;
            if source_kind == NodeKind::Input && destination_kind == NodeKind::Input {
                continue;
            }
            if source_kind == NodeKind::Output && destination_kind == NodeKind::Output {
                continue;
            }
            if self.registered.contains(&(source, destination)) {
                continue;
            }

            let weight = rng.random_range(0.0..config.weight_span);
            let innovation = registry.id_for(source, destination);
            self.connections
                .push(ConnectionGene::new(innovation, source, destination, weight));
            self.registered.insert((source, destination));
            return;
        }
    }

    /// Node mutation: split a random connection through a fresh hidden node.
    ///
    /// The split connection is disabled (not removed) and replaced by
    /// `source -> new` with weight 1.0 and `new -> destination` carrying the
    /// original weight, both enabled with fresh innovation ids.
    pub fn mutate_node(&mut self, registry: &mut InnovationRegistry, rng: &mut dyn RngCore) {
        if self.connections.is_empty() {
            return;
        }
        let pick = rng.random_range(0..self.connections.len());
        let (source, destination, weight) = {
            let split = &mut self.connections[pick];
            split.enabled = false;
            (split.source, split.destination, split.weight)
        };

        let fresh = self.nodes.len();
        self.nodes.push(NodeGene::new(fresh, NodeKind::Hidden));

        let inbound = registry.id_for(source, fresh);
        self.connections
            .push(ConnectionGene::new(inbound, source, fresh, 1.0));
        let outbound = registry.id_for(fresh, destination);
        self.connections
            .push(ConnectionGene::new(outbound, fresh, destination, weight));

        self.registered.insert((source, fresh));
        self.registered.insert((fresh, destination));
    }

    /// Flip the enabled flag on a random connection. No-op when empty.
    pub fn mutate_toggle(&mut self, rng: &mut dyn RngCore) {
        if self.connections.is_empty() {
            return;
        }
        let pick = rng.random_range(0..self.connections.len());
        self.connections[pick].toggle();
    }

    /// One mutation pass: each operator rolls independently against its
    /// configured probability, so zero or several may fire in the same call.
    pub fn mutate(
        &mut self,
        config: &EvolverConfig,
        registry: &mut InnovationRegistry,
        rng: &mut dyn RngCore,
    ) {
        if rng.random::<f64>() < config.point_prob {
            self.mutate_point(config, rng);
        }
        if rng.random::<f64>() < config.link_prob {
            self.mutate_link(config, registry, rng);
        }
        if rng.random::<f64>() < config.node_prob {
            self.mutate_node(registry, rng);
        }
        if rng.random::<f64>() < config.toggle_prob {
            self.mutate_toggle(rng);
        }
    }

    #[must_use]
    pub const fn input_size(&self) -> usize {
        self.input_size
    }

    #[must_use]
    pub const fn output_size(&self) -> usize {
        self.output_size
    }

    #[must_use]
    pub fn nodes(&self) -> &[NodeGene] {
        &self.nodes
    }

    #[must_use]
    pub fn connections(&self) -> &[ConnectionGene] {
        &self.connections
    }

    /// Mutable access used by crossover to inherit matching-gene weights.
    pub fn connections_mut(&mut self) -> &mut [ConnectionGene] {
        &mut self.connections
    }

    /// Fitness recorded by the most recent episode; higher is better.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    pub fn set_score(&mut self, score: f64) {
        self.score = score;
    }

    /// Hidden nodes appended since construction.
    #[must_use]
    pub fn hidden_count(&self) -> usize {
        self.nodes.len() - self.input_size - self.output_size
    }
}
