pub mod scoring;
pub mod session_stats;
