//! Command handlers for the medbill CLI.
//!
//! Each subcommand lives in its own submodule.

pub mod combos;
pub mod optimize;
pub mod recommend;
pub mod search;
pub mod stats;

// Re-export command types for convenience
pub use combos::CombosCommand;
pub use optimize::OptimizeCommand;
pub use recommend::RecommendCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;
