//! Integration tests for canonical wars: attrition, battles, settlement and aid

use realm_chronicle::aggregate::character::Character;
use realm_chronicle::aggregate::house::House;
use realm_chronicle::aggregate::systems::warfare::{resolve_canon_wars, settle_war, WarResult};
use realm_chronicle::aggregate::world::WorldState;
use realm_chronicle::canon::defs::{WarIntensity, WarSide};
use realm_chronicle::canon::{CanonPack, CanonWarDef};
use realm_chronicle::command::types::HouseAction;
use realm_chronicle::command::{Command, CommandExecutor};
use realm_chronicle::core::calendar::GameDate;
use realm_chronicle::core::rng::GameRng;
use realm_chronicle::core::types::{CharacterId, Gender, HouseId, LocationId, RegionId, WarId};
use realm_chronicle::data::gazetteer::Gazetteer;

fn war(intensity: WarIntensity) -> CanonWarDef {
    CanonWarDef {
        id: WarId::new("rebellion"),
        name: "The Rebellion".into(),
        from_year: 150,
        from_turn: Some(1),
        to_year: Some(150),
        to_turn: Some(10),
        side_a: vec![HouseId::new("loyal")],
        side_b: vec![HouseId::new("rebel")],
        intensity,
        tags: vec!["rebellion".into()],
    }
}

fn armed(id: &str) -> House {
    let mut h = House::new(HouseId::new(id), format!("House {}", id), RegionId::new("r"), LocationId::new(id), 50);
    h.army.levies = 400;
    h.army.men_at_arms = 80;
    h.army.knights = 10;
    h.resources.gold = 300;
    h.resources.food = 900;
    h.resources.goods = 120;
    h
}

fn world_at_war() -> WorldState {
    let mut world = WorldState::new(Gazetteer::default());
    for id in ["loyal", "rebel", "neutral"] {
        world.add_house(armed(id));
    }
    let player = world.add_character(Character::new(
        CharacterId::new("player"),
        "Player",
        Gender::Male,
        30.0,
        HouseId::new("loyal"),
        LocationId::new("loyal"),
    ));
    world.set_leader(&HouseId::new("loyal"), &player);
    world.player_id = player;
    world.player_house_id = HouseId::new("loyal");
    world
}

fn pack(intensity: WarIntensity) -> CanonPack {
    CanonPack::new(vec![], vec![], vec![], vec![war(intensity)])
}

fn run_turns(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack, turns: std::ops::RangeInclusive<u8>) {
    for turn in turns {
        world.date = GameDate::new(150, turn);
        resolve_canon_wars(world, rng, pack);
    }
}

#[test]
fn test_war_bleeds_participants_only() {
    let mut world = world_at_war();
    let mut rng = GameRng::new(11);
    let pack = pack(WarIntensity::Low);
    run_turns(&mut world, &mut rng, &pack, 1..=3);

    let levies = |id: &str| world.house(&HouseId::new(id)).unwrap().army.levies;
    assert!(levies("loyal") < 400);
    assert!(levies("rebel") < 400);
    assert_eq!(levies("neutral"), 400);
    assert_eq!(world.canon.active_war_ids, vec![WarId::new("rebellion")]);
    assert_eq!(world.chronicle.entries_tagged("war").filter(|e| e.title == "War: The Rebellion").count(), 1);
}

#[test]
fn test_war_settles_once_after_it_ends() {
    let mut world = world_at_war();
    let mut rng = GameRng::new(5);
    let pack = pack(WarIntensity::High);
    run_turns(&mut world, &mut rng, &pack, 1..=12);

    assert!(world.canon.active_war_ids.is_empty());
    assert!(world.canon.is_applied("war_end:rebellion"));
    let endings = world
        .chronicle
        .entries_tagged("end")
        .filter(|e| e.title == "War ends: The Rebellion")
        .count();
    assert_eq!(endings, 1);
    assert_eq!(settle_war(&mut world, &war(WarIntensity::High)), None);
}

#[test]
fn test_settlement_moves_prestige_by_score() {
    let mut world = world_at_war();
    let state = world.canon.war_state_mut(&WarId::new("rebellion"));
    state.score_a = 1;
    state.score_b = 4;

    let result = settle_war(&mut world, &war(WarIntensity::Medium));
    assert_eq!(result, Some(WarResult::Side(WarSide::B)));
    let prestige = |id: &str| world.house(&HouseId::new(id)).unwrap().prestige;
    assert_eq!(prestige("rebel"), 52);
    assert_eq!(prestige("loyal"), 48);
    assert_eq!(prestige("neutral"), 50);
}

#[test]
fn test_level_score_is_a_stalemate() {
    let mut world = world_at_war();
    let result = settle_war(&mut world, &war(WarIntensity::Low));
    assert_eq!(result, Some(WarResult::Stalemate));
    assert_eq!(world.house(&HouseId::new("loyal")).unwrap().prestige, 50);
}

#[test]
fn test_war_aid_scores_for_the_player_side() {
    let mut world = world_at_war();
    let mut rng = GameRng::new(2);
    let pack = pack(WarIntensity::Low);
    world.date = GameDate::new(150, 1);
    resolve_canon_wars(&mut world, &mut rng, &pack);
    let before = world.canon.war_state_mut(&WarId::new("rebellion")).score_a;

    let outcome = CommandExecutor::execute(&mut world, &mut rng, &pack, &Command::Manage(HouseAction::WarAid));
    assert!(outcome.is_applied());
    assert_eq!(world.canon.war_state_mut(&WarId::new("rebellion")).score_a, before + 1);
    assert_eq!(world.house(&HouseId::new("loyal")).unwrap().resources.goods, 80);
}

#[test]
fn test_war_aid_refused_in_peace() {
    let mut world = world_at_war();
    let mut rng = GameRng::new(2);
    let outcome = CommandExecutor::execute(&mut world, &mut rng, &CanonPack::default(), &Command::Manage(HouseAction::WarAid));
    assert!(!outcome.is_applied());
    assert_eq!(world.house(&HouseId::new("loyal")).unwrap().resources.goods, 120);
}
