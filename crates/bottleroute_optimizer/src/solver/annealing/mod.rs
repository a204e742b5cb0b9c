mod cooling;
mod engine;
mod neighborhood;
mod params;

pub use cooling::CoolingSchedule;
pub use engine::SimulatedAnnealing;
pub use neighborhood::NeighborhoodMove;
pub use params::SaParams;
