pub mod cache;
pub mod error;
pub mod jwt;
pub mod openf1;
pub mod prediction;
pub mod session;
