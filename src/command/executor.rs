//! Command execution - applies player commands to the world

use crate::aggregate::simulation::{advance_turn, refresh_menu};
use crate::aggregate::systems::{loans, missions, tournaments};
use crate::aggregate::world::WorldState;
use crate::canon::{self, CanonPack};
use crate::command::types::{
    BankAction, CanonControl, Command, CommandOutcome, DiplomacyAction, MissionAction,
};
use crate::command::{diplomacy, house_mgmt, local, training, travel};
use crate::core::rng::GameRng;
use crate::core::types::CharacterId;

/// Applies commands between turns
pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute one command
    ///
    /// A refused command leaves the world as it was and narrates the reason.
    pub fn execute(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack, command: &Command) -> CommandOutcome {
        if world.status.over {
            let reason = format!("The chronicle has ended: {}", world.status.reason);
            return reject(world, reason);
        }
        tracing::debug!(?command, turn = world.now(), "Executing command");

        let result = match command {
            Command::Travel { to } => travel::travel(world, rng, to),
            Command::Mission(action) => run_mission(world, action),
            Command::Diplomacy(action) => run_diplomacy(world, rng, action),
            Command::Local { target, action } => local::interact(world, rng, target, *action),
            Command::Train(option) => training::train(world, rng, *option),
            Command::Manage(action) => house_mgmt::manage(world, rng, pack, *action),
            Command::JoinTournament { id } => tournaments::join_tournament(world, rng, id).map(|outcome| {
                tracing::debug!(?outcome, "Joust resolved");
            }),
            Command::Canon(control) => {
                match control {
                    CanonControl::SetEnabled(enabled) => canon::engine::set_enabled(world, *enabled),
                    CanonControl::SetMode(mode) => canon::engine::set_mode(world, *mode),
                }
                Ok(())
            }
            Command::NameChild { child, name } => name_child(world, child, name),
            Command::EndTurn => advance_turn(world, rng, pack).map(|_| ()).map_err(|e| e.to_string()),
        };

        match result {
            Ok(()) => {
                refresh_menu(world);
                CommandOutcome::Applied
            }
            Err(reason) => reject(world, reason),
        }
    }
}

fn reject(world: &mut WorldState, reason: String) -> CommandOutcome {
    tracing::debug!(%reason, "Command rejected");
    world.narrate(reason.clone());
    CommandOutcome::Rejected { reason }
}

fn run_mission(world: &mut WorldState, action: &MissionAction) -> std::result::Result<(), String> {
    match action {
        MissionAction::Accept(id) => missions::accept_mission(world, id),
        MissionAction::Complete(id) => missions::complete_mission(world, id),
        MissionAction::Delegate { id, to } => missions::delegate_mission(world, id, to),
        MissionAction::Abandon(id) => missions::abandon_mission(world, id),
    }
}

fn run_diplomacy(world: &mut WorldState, rng: &mut GameRng, action: &DiplomacyAction) -> std::result::Result<(), String> {
    match action {
        DiplomacyAction::Talk { target } => diplomacy::talk(world, rng, target),
        DiplomacyAction::Gift { target } => diplomacy::gift(world, rng, target),
        DiplomacyAction::Audience { house } => diplomacy::audience(world, rng, house),
        DiplomacyAction::ProposeMarriage { house } => diplomacy::propose_marriage(world, rng, house),
        DiplomacyAction::Bank(BankAction::Loan(amount)) => loans::take_loan(world, *amount),
        DiplomacyAction::Bank(BankAction::PayMinimum) => loans::pay_minimum(world).map(|_| ()),
        DiplomacyAction::Bank(BankAction::PayAll) => loans::pay_all(world).map(|_| ()),
    }
}

fn name_child(world: &mut WorldState, child: &CharacterId, name: &str) -> std::result::Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("A name cannot be empty.".into());
    }
    let Some(pos) = world.ui.pending_name_queue.iter().position(|id| id == child) else {
        return Err("That child is not waiting for a name.".into());
    };
    let c = world.character_mut(child).ok_or_else(|| "Unknown child.".to_string())?;
    c.name = name.to_string();
    world.ui.pending_name_queue.remove(pos);
    world.narrate(format!("The child is named {}.", name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::character::Character;
    use crate::aggregate::house::House;
    use crate::canon::CanonMode;
    use crate::command::types::TrainingOption;
    use crate::core::types::{Gender, HouseId, LocationId, RegionId};
    use crate::data::gazetteer::Gazetteer;

    fn world() -> WorldState {
        let mut world = WorldState::new(Gazetteer::default());
        let mut house = House::new(HouseId::new("h"), "House H", RegionId::new("r"), LocationId::new("s"), 50);
        house.resources.gold = 10;
        world.add_house(house);
        world.add_character(Character::new(CharacterId::new("p"), "Player", Gender::Male, 30.0, HouseId::new("h"), LocationId::new("s")));
        world.add_character(Character::new(CharacterId::new("baby"), "Unnamed", Gender::Female, 0.0, HouseId::new("h"), LocationId::new("s")));
        world.player_id = CharacterId::new("p");
        world.player_house_id = HouseId::new("h");
        world
    }

    #[test]
    fn test_rejection_is_narrated_and_harmless() {
        let mut world = world();
        let mut rng = GameRng::new(1);
        let before = serde_json::to_string(&world.houses).unwrap();
        let outcome = CommandExecutor::execute(&mut world, &mut rng, &CanonPack::default(), &Command::Train(TrainingOption::Drill));
        assert!(!outcome.is_applied());
        assert_eq!(serde_json::to_string(&world.houses).unwrap(), before);
        assert!(world.narration.last().is_some());
    }

    #[test]
    fn test_name_child_clears_queue() {
        let mut world = world();
        let mut rng = GameRng::new(1);
        let baby = CharacterId::new("baby");
        world.ui.pending_name_queue.push(baby.clone());
        let cmd = Command::NameChild {
            child: baby.clone(),
            name: "  Rhaenys ".into(),
        };
        assert!(CommandExecutor::execute(&mut world, &mut rng, &CanonPack::default(), &cmd).is_applied());
        assert_eq!(world.character(&baby).unwrap().name, "Rhaenys");
        assert!(world.ui.pending_name_queue.is_empty());
        assert!(!CommandExecutor::execute(&mut world, &mut rng, &CanonPack::default(), &cmd).is_applied());
    }

    #[test]
    fn test_canon_controls() {
        let mut world = world();
        let mut rng = GameRng::new(1);
        let pack = CanonPack::default();
        CommandExecutor::execute(&mut world, &mut rng, &pack, &Command::Canon(CanonControl::SetMode(CanonMode::Anchors)));
        assert_eq!(world.canon.mode, CanonMode::Anchors);
        CommandExecutor::execute(&mut world, &mut rng, &pack, &Command::Canon(CanonControl::SetEnabled(false)));
        assert!(!world.canon.enabled);
    }

    #[test]
    fn test_nothing_after_game_over() {
        let mut world = world();
        let mut rng = GameRng::new(1);
        world.set_game_over("the line ended");
        let outcome = CommandExecutor::execute(&mut world, &mut rng, &CanonPack::default(), &Command::EndTurn);
        assert!(matches!(outcome, CommandOutcome::Rejected { .. }));
    }
}
