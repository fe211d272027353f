pub mod extract;
pub mod middleware;
pub mod prediction;
pub mod schedule;
