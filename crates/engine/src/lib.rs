pub mod board;
pub mod constants;
pub mod movegen;
pub mod moves;
pub mod score;
