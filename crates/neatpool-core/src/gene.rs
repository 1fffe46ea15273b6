//! Gene-level entities: nodes and connections with historical markings.

use serde::{Deserialize, Serialize};

/// Role a node plays in the network topology.
///
/// Input and output counts are fixed for a genome's lifetime; hidden nodes
/// are only ever appended by node mutation, never removed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Input,
    Output,
    Hidden,
}

/// Stable historical marking shared by homologous connections across genomes.
///
/// Two connections carrying the same id are treated as the same edge role
/// during crossover and speciation even when their weights have diverged.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct InnovationId(pub u32);

/// A single node gene. Identity is immutable after creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeGene {
    /// Dense index, unique within the owning genome, assigned in creation order.
    pub index: usize,
    pub kind: NodeKind,
}

impl NodeGene {
    #[must_use]
    pub const fn new(index: usize, kind: NodeKind) -> Self {
        Self { index, kind }
    }
}

/// A directed, weighted connection gene between two node indices.
///
/// Connections are never physically removed; disabling preserves the
/// evolutionary record. Nothing here forbids self-loops or back edges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConnectionGene {
    pub innovation: InnovationId,
    pub source: usize,
    pub destination: usize,
    pub weight: f64,
    pub enabled: bool,
}

impl ConnectionGene {
    /// New connections always start enabled.
    #[must_use]
    pub const fn new(
        innovation: InnovationId,
        source: usize,
        destination: usize,
        weight: f64,
    ) -> Self {
        Self {
            innovation,
            source,
            destination,
            weight,
            enabled: true,
        }
    }

    /// Nudge the weight in place (point mutation).
    pub fn nudge_weight(&mut self, delta: f64) {
        self.weight += delta;
    }

    /// Flip the enabled flag.
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }
}
