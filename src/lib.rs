pub mod board;
pub mod render;
pub mod solver;
pub mod types;
