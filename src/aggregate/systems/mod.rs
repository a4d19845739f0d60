//! Simulation systems
//!
//! Each system is a set of free functions over `&mut WorldState`. The turn
//! orchestrator in `aggregate::simulation` calls them in a fixed order.

pub mod economy;
pub mod generation;
pub mod lifecycle;
pub mod loans;
pub mod marriage;
pub mod missions;
pub mod pregnancy;
pub mod rumors;
pub mod succession;
pub mod tournaments;
pub mod warfare;

pub use economy::{tick_economy, tick_house_ai};
pub use generation::{build_initial_state, initialize_relations, NewGameParams};
pub use lifecycle::{resolve_death, tick_ages_and_deaths, tick_progression};
pub use loans::tick_loans;
pub use marriage::{apply_marriage, tick_arranged_marriages, Lineage};
pub use missions::{ensure_missions, tick_missions};
pub use pregnancy::{tick_conceptions, tick_pregnancies};
pub use rumors::{fire_scheduled_events, tick_rumors};
pub use succession::{apply_succession, compute_successor};
pub use tournaments::tick_tournaments;
pub use warfare::resolve_canon_wars;
