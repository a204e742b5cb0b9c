pub mod solution;
pub mod tour;
pub mod violation;
