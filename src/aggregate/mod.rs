//! The world aggregate and the systems that advance it
//!
//! `WorldState` owns every live house and character. Systems in `systems/`
//! mutate it through explicit `&mut` borrows; `simulation::advance_turn`
//! runs them in order once per turn.

pub mod character;
pub mod events;
pub mod house;
pub mod output;
pub mod simulation;
pub mod systems;
pub mod world;

pub use character::{Character, MaritalStatus, RenownTier};
pub use events::{Chronicle, ChronicleEntry, NarrationFeed};
pub use house::House;
pub use output::ChronicleExport;
pub use simulation::{advance_turn, TurnReport};
pub use world::{MenuOption, WorldState};
