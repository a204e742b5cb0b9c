mod chromosome;
mod crossover;
mod engine;
mod fitness;
mod mutation;
mod params;
mod selection;

pub use chromosome::{Chromosome, Gene};
pub use crossover::CrossoverKind;
pub use engine::GeneticAlgorithm;
pub use mutation::MutationKind;
pub use params::GaParams;
pub use selection::SelectionKind;
