use thiserror::Error;

use crate::core::types::{CharacterId, HouseId, LocationId};

#[derive(Error, Debug)]
pub enum ChronicleError {
    #[error("House not found: {0}")]
    HouseNotFound(HouseId),

    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),

    #[error("Location not found: {0}")]
    LocationNotFound(LocationId),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Suzerain cycle through house {0}")]
    SuzerainCycle(HouseId),

    #[error("World not initialized: {0}")]
    Uninitialized(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Save slot {0} is empty")]
    EmptySlot(u8),

    #[error("Invalid save slot {0} (expected 1..=3)")]
    InvalidSlot(u8),

    #[error("Save migration failed: {0}")]
    Migration(String),

    #[error("The game is over: {0}")]
    GameOver(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ChronicleError>;
