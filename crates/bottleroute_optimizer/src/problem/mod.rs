pub mod constraints;
pub mod geometry;
pub mod location;
pub mod routing_problem;
pub mod stop;
pub mod time_window;
pub mod travel_matrix;
