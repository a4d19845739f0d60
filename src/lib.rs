//! Realm Chronicle - turn-based dynastic simulation with canonical history

pub mod aggregate;
pub mod canon;
pub mod command;
pub mod core;
pub mod data;
pub mod persist;
pub mod session;

pub use session::Session;
