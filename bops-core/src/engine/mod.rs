//! Simulation engine — bar-by-bar loop over one series with one position.
//!
//! The loop precomputes the policy's indicators, waits out the warm-up, then
//! per bar resolves bracket exits before evaluating entries. All state (the
//! position, cash, the trade log) is owned by a single run.

pub mod config;
pub mod error;
pub mod execution;
pub mod loop_runner;
pub mod position_manager;
pub mod state;

pub use config::{ConfigError, EngineConfig, RiskConfig};
pub use error::EngineError;
pub use execution::{resolve_bracket, BracketExit, CostModel};
pub use loop_runner::run;
pub use position_manager::PositionManager;
pub use state::{RunOutcome, RunResult, SkipReason};
