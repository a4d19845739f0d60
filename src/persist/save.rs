//! Save slots on disk
//!
//! One JSON file holds up to three slots. Slot states are migrated on load, so
//! a file written by an older build opens with the current world format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::aggregate::world::WorldState;
use crate::core::error::{ChronicleError, Result};
use crate::persist::migrate::migrate;

pub const SAVE_FILE_VERSION: u32 = 1;
pub const SLOTS: std::ops::RangeInclusive<u8> = 1..=3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveSlot {
    pub slot: u8,
    /// Unix seconds
    pub updated_at: u64,
    pub state: WorldState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    pub slots: BTreeMap<u8, SaveSlot>,
}

/// On-disk shape before the slot states are migrated
#[derive(Deserialize)]
struct RawSaveFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    slots: BTreeMap<u8, RawSlot>,
}

#[derive(Deserialize)]
struct RawSlot {
    slot: u8,
    #[serde(default)]
    updated_at: u64,
    state: serde_json::Value,
}

impl Default for SaveFile {
    fn default() -> Self {
        Self {
            version: SAVE_FILE_VERSION,
            slots: BTreeMap::new(),
        }
    }
}

fn check_slot(slot: u8) -> Result<()> {
    if SLOTS.contains(&slot) {
        Ok(())
    } else {
        Err(ChronicleError::InvalidSlot(slot))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl SaveFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawSaveFile = serde_json::from_str(content)?;
        let mut slots = BTreeMap::new();
        for (key, raw_slot) in raw.slots {
            check_slot(key)?;
            let state = migrate(raw_slot.state)?;
            slots.insert(
                key,
                SaveSlot {
                    slot: raw_slot.slot,
                    updated_at: raw_slot.updated_at,
                    state,
                },
            );
        }
        tracing::debug!(file_version = raw.version, slots = slots.len(), "Save file parsed");
        Ok(Self {
            version: SAVE_FILE_VERSION,
            slots,
        })
    }

    /// Reads a save file; a missing file is an empty one
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), "Saved");
        Ok(())
    }

    pub fn store(&mut self, slot: u8, state: &WorldState) -> Result<()> {
        check_slot(slot)?;
        self.slots.insert(
            slot,
            SaveSlot {
                slot,
                updated_at: unix_now(),
                state: state.clone(),
            },
        );
        Ok(())
    }

    pub fn slot(&self, slot: u8) -> Result<&SaveSlot> {
        check_slot(slot)?;
        self.slots.get(&slot).ok_or(ChronicleError::EmptySlot(slot))
    }

    pub fn clear(&mut self, slot: u8) -> Result<Option<SaveSlot>> {
        check_slot(slot)?;
        Ok(self.slots.remove(&slot))
    }

    /// One line per slot, empty ones included
    pub fn describe(&self) -> Vec<String> {
        SLOTS
            .map(|n| match self.slots.get(&n) {
                Some(s) => format!(
                    "[{}] {} | {} of {}{}",
                    n,
                    s.state.date,
                    s.state.player().map_or("nobody", |p| p.name.as_str()),
                    s.state.player_house().map_or("no house", |h| h.name.as_str()),
                    if s.state.status.over { " (ended)" } else { "" }
                ),
                None => format!("[{}] empty", n),
            })
            .collect()
    }
}
