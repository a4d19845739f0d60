pub mod calendar;
pub mod config;
pub mod error;
pub mod rng;
pub mod types;

pub use calendar::{abs_turn, AbsTurn, GameDate};
pub use rng::GameRng;
