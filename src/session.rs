//! Game session facade
//!
//! Owns the world, its generator and the canon pack. Front ends read the state
//! through [`Session::state`] and poll [`Session::changed_since`] with the last
//! revision they rendered; every mutation bumps the revision.

use crate::aggregate::simulation::{advance_turn, TurnReport};
use crate::aggregate::world::WorldState;
use crate::canon::CanonPack;
use crate::command::{Command, CommandExecutor, CommandOutcome};
use crate::core::error::Result;
use crate::core::rng::GameRng;
use crate::persist::migrate::restore;

pub struct Session {
    world: WorldState,
    rng: GameRng,
    canon: CanonPack,
    revision: u64,
}

impl Session {
    pub fn new(world: WorldState, rng: GameRng, canon: CanonPack) -> Self {
        Self {
            world,
            rng,
            canon,
            revision: 0,
        }
    }

    /// Opens a saved world; the generator is re-derived from its turn
    pub fn from_saved(world: &WorldState, canon: CanonPack) -> Result<Self> {
        let mut session = Self::new(WorldState::new(world.gazetteer.clone()), GameRng::new(0), canon);
        session.replace_state(serde_json::to_value(world)?)?;
        Ok(session)
    }

    pub fn state(&self) -> &WorldState {
        &self.world
    }

    pub fn canon(&self) -> &CanonPack {
        &self.canon
    }

    pub fn rng_seed(&self) -> u32 {
        self.rng.seed()
    }

    /// Swaps in a raw saved world, migrating it first
    pub fn replace_state(&mut self, raw: serde_json::Value) -> Result<()> {
        let (world, rng) = restore(raw)?;
        self.world = world;
        self.rng = rng;
        self.bump();
        Ok(())
    }

    pub fn execute(&mut self, command: &Command) -> CommandOutcome {
        let outcome = CommandExecutor::execute(&mut self.world, &mut self.rng, &self.canon, command);
        // A rejection still narrates
        self.bump();
        outcome
    }

    pub fn end_turn(&mut self) -> Result<TurnReport> {
        let report = advance_turn(&mut self.world, &mut self.rng, &self.canon)?;
        self.bump();
        Ok(report)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn changed_since(&self, revision: u64) -> bool {
        self.revision > revision
    }

    pub fn into_state(self) -> WorldState {
        self.world
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::character::Character;
    use crate::aggregate::house::House;
    use crate::command::types::{CanonControl, TrainingOption};
    use crate::core::types::{CharacterId, Gender, HouseId, LocationId, RegionId};
    use crate::data::gazetteer::Gazetteer;

    fn session() -> Session {
        let mut world = WorldState::new(Gazetteer::default());
        world.add_house(House::new(HouseId::new("h"), "House H", RegionId::new("r"), LocationId::new("s"), 50));
        world.add_character(Character::new(CharacterId::new("p"), "Player", Gender::Female, 20.0, HouseId::new("h"), LocationId::new("s")));
        world.player_id = CharacterId::new("p");
        world.player_house_id = HouseId::new("h");
        Session::new(world, GameRng::new(1), CanonPack::default())
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let mut s = session();
        let seen = s.revision();
        assert!(!s.changed_since(seen));
        s.execute(&Command::Canon(CanonControl::SetEnabled(false)));
        assert!(s.changed_since(seen));
        assert!(!s.state().canon.enabled);
    }

    #[test]
    fn test_rejected_command_keeps_gold() {
        let mut s = session();
        let outcome = s.execute(&Command::Train(TrainingOption::Yard));
        assert!(!outcome.is_applied());
        assert_eq!(s.state().player_house().unwrap().resources.gold, 0);
    }

    #[test]
    fn test_replace_state_reseeds() {
        let mut s = session();
        s.world.date.advance();
        s.world.date.advance();
        let saved = serde_json::to_value(s.state()).unwrap();
        let turn = s.state().now();

        let mut other = session();
        other.replace_state(saved).unwrap();
        assert_eq!(other.state().now(), turn);
        assert_eq!(other.rng_seed(), GameRng::for_turn(turn).seed());
    }
}
