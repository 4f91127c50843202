//! Execution — bracket fills and trading costs.
//!
//! Stateless: everything here is a function of the position, the bar and
//! configuration. Mutation happens in the position manager.

pub mod cost_model;
pub mod path_policy;

pub use cost_model::CostModel;
pub use path_policy::{resolve_bracket, BracketExit};
