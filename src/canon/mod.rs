//! Scripted history: definitions, per-save reconciliation state and the
//! engine that folds one into the other

pub mod defs;
pub mod engine;
pub mod state;

pub use defs::{CanonEventDef, CanonEventKind, CanonPack, CanonPersonDef, CanonWarDef};
pub use engine::{apply_turn, bootstrap, canon_character_id, ensure_person, kill_canonical, touch_character};
pub use state::{CanonMode, CanonState};
