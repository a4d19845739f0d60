//! Read-only realm data: geography, heraldry and name pools

pub mod gazetteer;
pub mod loader;

pub use gazetteer::Gazetteer;
pub use loader::{load_data_dir, RealmData};
