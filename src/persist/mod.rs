//! Persistence: save slots and format migration

pub mod migrate;
pub mod save;

pub use migrate::{migrate, restore};
pub use save::{SaveFile, SaveSlot, SLOTS};
