//! Core genome machinery for the neatpool evolver.
//!
//! This crate owns the gene-level entities (nodes and connections with
//! historical markings), the population-scoped innovation registry, the
//! genome representation with its forward evaluation over mutable topology,
//! the four structural mutation operators, and the genetic-distance function
//! used for speciation. The generational lifecycle lives in
//! `neatpool-evolver`; physics, rendering, and persistence formats are
//! external collaborators and never appear here.

pub mod compat;
pub mod config;
pub mod gene;
pub mod genome;
pub mod innovation;

pub use compat::{compatibility, compatible};
pub use config::{ConfigError, EvolverConfig};
pub use gene::{ConnectionGene, InnovationId, NodeGene, NodeKind};
pub use genome::Genome;
pub use innovation::InnovationRegistry;
