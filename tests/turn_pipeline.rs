//! Integration tests for whole turns over the shipped realm

use std::path::Path;

use realm_chronicle::aggregate::simulation::advance_turn;
use realm_chronicle::aggregate::systems::generation::{build_initial_state, NewGameParams};
use realm_chronicle::aggregate::world::{MenuOption, WorldState};
use realm_chronicle::canon::CanonPack;
use realm_chronicle::command::resolver::CommandResolver;
use realm_chronicle::command::types::TrainingOption;
use realm_chronicle::command::{Command, CommandExecutor, CommandOutcome};
use realm_chronicle::core::error::ChronicleError;
use realm_chronicle::core::rng::GameRng;
use realm_chronicle::core::types::{Gender, HouseId, LocationId};
use realm_chronicle::data::loader::{load_data_dir, RealmData};

fn data() -> RealmData {
    load_data_dir(&Path::new(env!("CARGO_MANIFEST_DIR")).join("data")).expect("shipped data loads")
}

fn new_world(house: &str, gender: Gender, seed: u32) -> (WorldState, CanonPack, GameRng) {
    let data = data();
    let mut rng = GameRng::new(seed);
    let params = NewGameParams {
        house_id: HouseId::new(house),
        gender,
    };
    let world = build_initial_state(data.gazetteer, &data.canon, &params, &mut rng).expect("world builds");
    (world, data.canon, rng)
}

/// Runs up to `turns` turns, stopping early if the line ends
fn run(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack, turns: usize) -> usize {
    for done in 0..turns {
        match advance_turn(world, rng, pack) {
            Ok(_) => {}
            Err(ChronicleError::GameOver(_)) => return done,
            Err(e) => panic!("turn failed: {}", e),
        }
    }
    turns
}

fn assert_invariants(world: &WorldState) {
    assert!(world.spouse_links_are_mutual(), "spouse links diverged at {}", world.date);
    for house in &world.houses {
        assert!((1..=100).contains(&house.prestige), "{} prestige {}", house.id, house.prestige);
        assert!(house.resources.gold >= 0);
        assert!(house.resources.food >= 0);
        assert!(house.army.levies >= 0);
        if let Some(leader) = &house.leader_id {
            assert!(world.character(leader).map_or(false, |c| c.alive), "{} led by the dead", house.id);
        }
    }
    for c in world.characters.iter().filter(|c| c.alive) {
        assert!(world.house(&c.current_house_id).is_some(), "{} in unknown house", c.id);
        assert!(c.age >= 0.0);
    }
}

#[test]
fn test_shipped_data_is_consistent() {
    let data = data();
    assert_eq!(data.gazetteer.houses.len(), 16);
    assert_eq!(data.gazetteer.houses.iter().filter(|h| h.is_crown).count(), 1);
    assert!(!data.canon.people.is_empty());
    assert!(!data.canon.wars.is_empty());
    for house in &data.gazetteer.houses {
        assert!(data.gazetteer.location(&house.seat_id).is_some());
    }
}

#[test]
fn test_new_world_starts_on_turn_one() {
    let (world, _, _) = new_world("lannister", Gender::Female, 42);
    assert_eq!(world.now(), 1);
    let player = world.player().unwrap();
    assert_eq!(player.gender, Gender::Female);
    assert_eq!(world.player_house_id, HouseId::new("lannister"));
    assert!(world.house(&HouseId::new("targaryen_throne")).unwrap().leader_id.is_some());
    assert_invariants(&world);
}

#[test]
fn test_unknown_house_is_refused() {
    let data = data();
    let mut rng = GameRng::new(1);
    let params = NewGameParams {
        house_id: HouseId::new("bolton"),
        gender: Gender::Male,
    };
    let result = build_initial_state(data.gazetteer, &data.canon, &params, &mut rng);
    assert!(matches!(result, Err(ChronicleError::HouseNotFound(_))));
}

#[test]
fn test_two_years_keep_the_world_consistent() {
    let (mut world, pack, mut rng) = new_world("stark", Gender::Male, 42);
    let mut last = world.now();
    for _ in 0..40 {
        match advance_turn(&mut world, &mut rng, &pack) {
            Ok(report) => {
                assert_eq!(report.from.absolute_turn, last);
                assert_eq!(report.to.absolute_turn, last + 1);
                last = report.to.absolute_turn;
            }
            Err(ChronicleError::GameOver(_)) => break,
            Err(e) => panic!("turn failed: {}", e),
        }
        assert_invariants(&world);
    }
    assert!(world.chronicle.len() > 0);
}

#[test]
fn test_scheduled_event_fires_on_its_date() {
    let (mut world, pack, mut rng) = new_world("tully", Gender::Male, 8);
    run(&mut world, &mut rng, &pack, 2);
    assert!(world.chronicle.entries_tagged("rumor").any(|e| e.title == "Rumors at Court"));
}

#[test]
fn test_same_seed_same_history() {
    let history = |seed: u32| {
        let (mut world, pack, _) = new_world("arryn", Gender::Male, seed);
        let mut rng = GameRng::new(seed + 1);
        run(&mut world, &mut rng, &pack, 20);
        world.chronicle.entries.iter().map(|e| e.title.clone()).collect::<Vec<_>>()
    };
    assert_eq!(history(17), history(17));
}

#[test]
fn test_menu_tracks_the_player() {
    let (mut world, pack, mut rng) = new_world("stark", Gender::Male, 42);
    run(&mut world, &mut rng, &pack, 1);
    assert_eq!(world.ui.menu.last(), Some(&MenuOption::EndTurn));
    assert!(world.ui.menu.contains(&MenuOption::Travel));
    assert_eq!(world.ui.menu.contains(&MenuOption::HouseManagement), world.player_is_leader());
}

#[test]
fn test_resolved_commands_drive_the_world() {
    let (mut world, pack, mut rng) = new_world("stark", Gender::Male, 42);

    let train = CommandResolver::new(&world).resolve("train yard").unwrap();
    assert_eq!(train, Command::Train(TrainingOption::Yard));
    let gold = world.player_house().unwrap().resources.gold;
    let outcome = CommandExecutor::execute(&mut world, &mut rng, &pack, &train);
    if gold >= TrainingOption::Yard.cost() {
        assert!(outcome.is_applied());
        assert_eq!(world.player_house().unwrap().resources.gold, gold - TrainingOption::Yard.cost());
    } else {
        assert!(!outcome.is_applied());
    }

    let end = CommandResolver::new(&world).resolve("end").unwrap();
    let turn = world.now();
    CommandExecutor::execute(&mut world, &mut rng, &pack, &end);
    assert_eq!(world.now(), turn + 1);
}

#[test]
fn test_travel_without_road_is_rejected() {
    let (mut world, pack, mut rng) = new_world("stark", Gender::Male, 42);
    let from = world.player().unwrap().location_id.clone();
    // Winterfell and Sunspear share no road
    let outcome = CommandExecutor::execute(
        &mut world,
        &mut rng,
        &pack,
        &Command::Travel {
            to: LocationId::new("sunspear"),
        },
    );
    assert!(matches!(outcome, CommandOutcome::Rejected { .. }));
    assert_eq!(world.player().unwrap().location_id, from);
}

#[test]
fn test_unknown_words_do_not_resolve() {
    let (world, _, _) = new_world("stark", Gender::Male, 42);
    let resolver = CommandResolver::new(&world);
    assert!(resolver.resolve("dance wildly").is_err());
    assert!(resolver.resolve("travel atlantis").is_err());
    assert!(resolver.resolve("loan lots").is_err());
}
