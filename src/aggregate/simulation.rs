//! Turn orchestrator
//!
//! `advance_turn` is the only place the calendar moves. It runs every system
//! once, in a fixed order, and never re-enters itself.

use serde::{Deserialize, Serialize};

use crate::aggregate::systems::{self, loans::PaymentOutcome, pregnancy::Delivery, rumors::RumorKind};
use crate::aggregate::world::{MenuOption, WorldState};
use crate::canon::{self, CanonPack};
use crate::core::calendar::GameDate;
use crate::core::error::{ChronicleError, Result};
use crate::core::rng::GameRng;

/// What one turn did, for the CLI and for tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReport {
    pub from: GameDate,
    pub to: GameDate,
    pub chronicle_entries: usize,
    pub births: usize,
    pub scheduled_events: usize,
    #[serde(skip)]
    pub rumor: Option<RumorKind>,
    #[serde(skip)]
    pub loan: Option<PaymentOutcome>,
    pub game_over: bool,
}

impl TurnReport {
    pub fn summary(&self) -> String {
        format!(
            "{} -> {}: {} chronicle entries, {} births{}",
            self.from,
            self.to,
            self.chronicle_entries,
            self.births,
            if self.game_over { ", game over" } else { "" }
        )
    }
}

/// Runs one full turn
///
/// Fails when the game is already over or the world was never populated.
pub fn advance_turn(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack) -> Result<TurnReport> {
    if world.status.over {
        return Err(ChronicleError::GameOver(world.status.reason.clone()));
    }
    if world.player().is_none() || world.player_house().is_none() {
        return Err(ChronicleError::Uninitialized("no player character or house".into()));
    }
    let from = world.date;
    let chronicle_before = world.chronicle.len();

    // 1. Canonical history
    canon::apply_turn(world, rng, pack);

    // 2. Dated events from the realm data
    let scheduled_events = systems::fire_scheduled_events(world);

    // 3. Court rumors
    let rumor = systems::tick_rumors(world, rng);

    // 4. Economy and house AI
    systems::tick_economy(world, rng);

    // 5. Aging and natural deaths
    systems::tick_ages_and_deaths(world, rng);

    // 6. Arranged marriages
    systems::tick_arranged_marriages(world, rng);

    // 7. Progression
    systems::tick_progression(world, rng);

    // 8. Conception and pregnancy
    systems::tick_conceptions(world, rng);
    let births = systems::tick_pregnancies(world, rng)
        .iter()
        .filter(|d| matches!(d, Delivery::Born(_) | Delivery::ChildBornMotherLost(_)))
        .count();

    // 9. Missions
    systems::tick_missions(world, rng);

    // 10. Tournaments
    systems::tick_tournaments(world, rng);

    // 11. Loans
    let loan = systems::tick_loans(world);

    // 12. Calendar
    world.date.advance();

    // 13. Menu for the next turn
    refresh_menu(world);

    let report = TurnReport {
        from,
        to: world.date,
        chronicle_entries: world.chronicle.len() - chronicle_before,
        births,
        scheduled_events,
        rumor,
        loan,
        game_over: world.status.over,
    };
    tracing::debug!(turn = world.now(), summary = %report.summary(), "Turn advanced");
    Ok(report)
}

/// Options open to the player in the current state
pub fn available_menu(world: &WorldState) -> Vec<MenuOption> {
    if world.status.over {
        return vec![MenuOption::Chronicle];
    }
    let mut menu = vec![MenuOption::Travel, MenuOption::Missions, MenuOption::Diplomacy];
    if let Some(player) = world.player() {
        let company = world
            .characters
            .iter()
            .any(|c| c.alive && c.id != player.id && c.location_id == player.location_id);
        if company {
            menu.push(MenuOption::Local);
        }
    }
    menu.push(MenuOption::Training);
    if world.player_is_leader() {
        menu.push(MenuOption::HouseManagement);
    }
    if world.tournaments.iter().any(|t| t.is_open()) {
        menu.push(MenuOption::Tournaments);
    }
    menu.push(MenuOption::Chronicle);
    menu.push(MenuOption::EndTurn);
    menu
}

pub fn refresh_menu(world: &mut WorldState) {
    world.ui.menu = available_menu(world);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::systems::generation::{build_initial_state, NewGameParams};
    use crate::core::types::{Gender, HouseId, LocationId, RegionId};
    use crate::data::gazetteer::{Gazetteer, HouseDef, Location, LocationKind, NamePools, Region};

    fn gazetteer() -> Gazetteer {
        let house = |id: &str, seat: &str, crown: bool, suzerain: Option<&str>| HouseDef {
            id: HouseId::new(id),
            name: format!("House {}", id),
            region_id: RegionId::new("crownlands"),
            seat_id: LocationId::new(seat),
            prestige_base: if crown { 90 } else { 50 },
            is_crown: crown,
            suzerain_id: suzerain.map(HouseId::new),
            title_male: None,
            title_female: None,
        };
        Gazetteer {
            regions: vec![Region {
                id: RegionId::new("crownlands"),
                name: "Crownlands".into(),
                encounter_risk: 0.1,
            }],
            locations: ["capital", "rosby", "stokeworth"]
                .iter()
                .map(|id| Location {
                    id: LocationId::new(*id),
                    name: id.to_string(),
                    region_id: RegionId::new("crownlands"),
                    kind: LocationKind::Seat,
                })
                .collect(),
            routes: Vec::new(),
            houses: vec![
                house("throne", "capital", true, None),
                house("rosby", "rosby", false, Some("throne")),
                house("stokeworth", "stokeworth", false, Some("throne")),
            ],
            names: NamePools {
                male: vec!["Aemon".into(), "Jaehaerys".into()],
                female: vec!["Alysanne".into(), "Rhaena".into()],
                epithets: Vec::new(),
            },
            scheduled_events: Vec::new(),
        }
    }

    fn new_world(seed: u32) -> (WorldState, GameRng, CanonPack) {
        let pack = CanonPack::default();
        let mut rng = GameRng::new(seed);
        let params = NewGameParams {
            house_id: HouseId::new("rosby"),
            gender: Gender::Male,
        };
        let world = build_initial_state(gazetteer(), &pack, &params, &mut rng).unwrap();
        (world, rng, pack)
    }

    #[test]
    fn test_turn_advances_calendar_once() {
        let (mut world, mut rng, pack) = new_world(3);
        let before = world.now();
        let report = advance_turn(&mut world, &mut rng, &pack).unwrap();
        assert_eq!(world.now(), before + 1);
        assert_eq!(report.to.absolute_turn, before + 1);
        assert!(world.ui.menu.contains(&MenuOption::EndTurn));
    }

    #[test]
    fn test_same_seed_same_history() {
        let (mut a, mut ra, pack) = new_world(9);
        let (mut b, mut rb, _) = new_world(9);
        for _ in 0..30 {
            if a.status.over {
                break;
            }
            advance_turn(&mut a, &mut ra, &pack).unwrap();
            advance_turn(&mut b, &mut rb, &pack).unwrap();
        }
        let ta: Vec<_> = a.chronicle.entries.iter().map(|e| e.body.clone()).collect();
        let tb: Vec<_> = b.chronicle.entries.iter().map(|e| e.body.clone()).collect();
        assert_eq!(ta, tb);
    }

    #[test]
    fn test_game_over_rejects_turns() {
        let (mut world, mut rng, pack) = new_world(4);
        world.set_game_over("test");
        assert!(matches!(
            advance_turn(&mut world, &mut rng, &pack),
            Err(ChronicleError::GameOver(_))
        ));
        assert_eq!(available_menu(&world), vec![MenuOption::Chronicle]);
    }

    #[test]
    fn test_empty_world_is_uninitialized() {
        let mut world = WorldState::new(Gazetteer::default());
        let mut rng = GameRng::new(1);
        assert!(matches!(
            advance_turn(&mut world, &mut rng, &CanonPack::default()),
            Err(ChronicleError::Uninitialized(_))
        ));
    }
}
