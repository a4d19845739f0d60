//! Command pipeline
//!
//! Typed line -> CommandResolver -> Command -> CommandExecutor -> CommandOutcome

pub mod diplomacy;
pub mod executor;
pub mod house_mgmt;
pub mod local;
pub mod resolver;
pub mod training;
pub mod travel;
pub mod types;

pub use executor::CommandExecutor;
pub use resolver::{CharacterMatch, CommandResolver, MatchReason};
pub use types::{Command, CommandOutcome};
