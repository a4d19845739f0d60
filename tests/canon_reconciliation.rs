//! Integration tests for folding the shipped history into a live world

use std::path::Path;

use realm_chronicle::aggregate::character::MaritalStatus;
use realm_chronicle::aggregate::systems::generation::{build_initial_state, NewGameParams};
use realm_chronicle::aggregate::world::WorldState;
use realm_chronicle::canon::{self, canon_character_id, touch_character, CanonMode, CanonPack};
use realm_chronicle::core::calendar::GameDate;
use realm_chronicle::core::rng::GameRng;
use realm_chronicle::core::types::{CanonId, CharacterId, Gender, HouseId};
use realm_chronicle::data::loader::load_data_dir;

fn shipped(house: &str) -> (WorldState, CanonPack, GameRng) {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let data = load_data_dir(&dir).expect("shipped data loads");
    let mut rng = GameRng::new(7);
    let params = NewGameParams {
        house_id: HouseId::new(house),
        gender: Gender::Male,
    };
    let world = build_initial_state(data.gazetteer, &data.canon, &params, &mut rng).expect("world builds");
    (world, data.canon, rng)
}

fn canon_char(id: &str) -> CharacterId {
    canon_character_id(&CanonId::new(id))
}

fn jump(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack, year: i32, turn: u8) {
    world.date = GameDate::new(year, turn);
    canon::apply_turn(world, rng, pack);
}

fn crown_leader(world: &WorldState) -> Option<CharacterId> {
    world.house(&HouseId::new("targaryen_throne")).and_then(|h| h.leader_id.clone())
}

#[test]
fn test_bootstrap_seats_recorded_rulers() {
    let (world, _, _) = shipped("stark");

    assert_eq!(crown_leader(&world), Some(canon_char("aegon_iii")));
    let king = world.character(&canon_char("aegon_iii")).unwrap();
    assert_eq!(king.spouse_id, Some(canon_char("daenaera")));
    assert_eq!(king.marital_status, MaritalStatus::Married);
    assert!(king.known_to_player);

    let stark = world.house(&HouseId::new("stark")).unwrap();
    assert_eq!(stark.leader_id, Some(canon_char("cregan_stark")));
    assert!(world.chronicle.entries_tagged("start").any(|e| e.title == "The Chronicle Begins"));
}

#[test]
fn test_unborn_and_dead_are_absent_at_start() {
    let (world, _, _) = shipped("tully");
    assert!(world.character(&canon_char("elaena")).is_none());
    assert!(world.character(&canon_char("daeron_ii")).is_none());
    assert!(world.character(&canon_char("daemon_blackfyre")).is_none());
    // Ranged birth years are not due yet either
    assert!(world.character(&canon_char("maron_martell")).is_none());
}

#[test]
fn test_birth_arrives_on_recorded_turn() {
    let (mut world, pack, mut rng) = shipped("stark");
    jump(&mut world, &mut rng, &pack, 150, 10);

    let elaena = world.character(&canon_char("elaena")).expect("born");
    assert_eq!(elaena.age, 0.0);
    assert_eq!(elaena.father_id, Some(canon_char("aegon_iii")));
    assert_eq!(elaena.mother_id, Some(canon_char("daenaera")));
    assert!(world.canon.is_applied("150_elaena_birth"));
}

#[test]
fn test_recorded_death_passes_the_throne() {
    let (mut world, pack, mut rng) = shipped("stark");
    jump(&mut world, &mut rng, &pack, 157, 10);

    assert!(!world.character(&canon_char("aegon_iii")).unwrap().alive);
    assert_eq!(
        world.character(&canon_char("daenaera")).unwrap().marital_status,
        MaritalStatus::Widowed
    );
    assert_eq!(crown_leader(&world), Some(canon_char("daeron_i")));
    assert!(world.chronicle.entries_tagged("death").any(|e| e.title == "Death of Aegon III"));
    assert!(!world
        .chronicle
        .entries_tagged("divergence")
        .any(|e| e.title.contains("Aegon III")));
}

#[test]
fn test_diverged_king_survives_his_date() {
    let (mut world, pack, mut rng) = shipped("stark");
    let king = canon_char("aegon_iii");
    touch_character(&mut world, &king, "marriage", 5);
    assert!(world.canon.is_diverged(&CanonId::new("aegon_iii")));

    jump(&mut world, &mut rng, &pack, 157, 10);
    assert!(world.character(&king).unwrap().alive);
    assert!(world.canon.death_bypassed.contains(&CanonId::new("aegon_iii")));
    assert!(world
        .chronicle
        .entries_tagged("divergence")
        .any(|e| e.title == "Death of Aegon III (divergent fate)"));
}

#[test]
fn test_disabled_canon_skips_history() {
    let (mut world, pack, mut rng) = shipped("stark");
    canon::engine::set_enabled(&mut world, false);
    jump(&mut world, &mut rng, &pack, 157, 10);

    assert!(world.character(&canon_char("aegon_iii")).unwrap().alive);
    assert_eq!(crown_leader(&world), Some(canon_char("aegon_iii")));
    assert!(!world.canon.is_applied("157_aegon_iii_death"));
}

#[test]
fn test_anchor_mode_skips_minor_people() {
    let (mut world, pack, mut rng) = shipped("stark");
    canon::engine::set_mode(&mut world, CanonMode::Anchors);
    jump(&mut world, &mut rng, &pack, 160, 18);

    // Neither royal nor of an anchored house
    assert!(world.character(&canon_char("lyonel_tyrell")).unwrap().alive);
}

#[test]
fn test_events_apply_once() {
    let (mut world, pack, mut rng) = shipped("stark");
    jump(&mut world, &mut rng, &pack, 153, 10);
    let entries = world.chronicle.len();
    canon::apply_turn(&mut world, &mut rng, &pack);
    assert_eq!(world.chronicle.len(), entries);
}
