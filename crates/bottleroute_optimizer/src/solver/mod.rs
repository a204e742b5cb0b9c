pub mod annealing;
pub mod genetic;
pub mod greedy;
pub mod result;
pub mod seeds;

use serde::{Deserialize, Serialize};

/// Thread budget for parallel population evaluation.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Threads {
    Single,
    /// Let rayon size the pool from the machine.
    #[default]
    Auto,
    Fixed(usize),
}

impl Threads {
    /// Zero means "let rayon decide".
    pub fn num_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Auto => 0,
            Threads::Fixed(count) => *count,
        }
    }
}
