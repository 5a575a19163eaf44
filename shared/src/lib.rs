pub mod error;
pub mod models;
pub mod stats;
pub mod timestamp;
pub mod validation;
pub mod user_info;

pub use error::ErrorCode;
pub use models::*;
pub use stats::{compute_stats, leaderboard, sort_standings};
pub use timestamp::{LegacyTimestamp, Timestamp};
pub use validation::*;
pub use user_info::*;

#[cfg(test)]
mod tests;
