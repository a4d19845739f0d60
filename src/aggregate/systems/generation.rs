//! World seeding
//!
//! Turns the read-only gazetteer into a live world: rolled economies and
//! armies, starting relations and trade partners, a small procedural family
//! per house, and the player as the youngest child of the chosen house.
//! The canonical bootstrap runs last so scripted people join a populated realm.

use crate::aggregate::character::Character;
use crate::aggregate::house::{Army, Economy, House, Resources};
use crate::aggregate::world::WorldState;
use crate::canon::defs::CanonPack;
use crate::canon::engine;
use crate::core::config::config;
use crate::core::error::{ChronicleError, Result};
use crate::core::rng::GameRng;
use crate::core::types::{CharacterId, Gender, HouseId, LocationId};
use crate::data::gazetteer::{Gazetteer, HouseDef};

/// Choices made on the new-game screen
#[derive(Debug, Clone)]
pub struct NewGameParams {
    pub house_id: HouseId,
    pub gender: Gender,
}

/// Builds a fresh world on turn 1
pub fn build_initial_state(
    gazetteer: Gazetteer,
    pack: &CanonPack,
    params: &NewGameParams,
    rng: &mut GameRng,
) -> Result<WorldState> {
    gazetteer.validate()?;
    if gazetteer.house_def(&params.house_id).is_none() {
        return Err(ChronicleError::HouseNotFound(params.house_id.clone()));
    }
    let defs = gazetteer.houses.clone();
    let mut world = WorldState::new(gazetteer);

    // 1. Houses
    for def in &defs {
        world.add_house(seed_house(def, rng));
    }

    // 2. Relations
    initialize_relations(&mut world, rng);

    // 3. Families and trade partners
    let house_ids = world.house_ids();
    for house_id in &house_ids {
        seed_family(&mut world, rng, house_id);
        pick_trade_partners(&mut world, rng, house_id);
    }

    // 4. Player
    seed_player(&mut world, rng, params)?;
    world.validate_hierarchy()?;

    tracing::info!(
        houses = world.houses.len(),
        characters = world.characters.len(),
        player_house = %world.player_house_id,
        "World built"
    );

    // 5. Canon
    engine::bootstrap(&mut world, rng, pack);
    Ok(world)
}

fn seed_house(def: &HouseDef, rng: &mut GameRng) -> House {
    let mut house = House::new(
        def.id.clone(),
        def.name.clone(),
        def.region_id.clone(),
        def.seat_id.clone(),
        def.prestige_base,
    );
    house.is_crown = def.is_crown;
    house.suzerain_id = def.suzerain_id.clone();

    let tier = house.tier_gold();
    let tf = tier as f64 / 200.0;
    let scaled = |k: f64| (k * tf).floor() as i64;

    house.economy = Economy {
        peasants: rng.int(scaled(420.0), scaled(760.0)),
        soldiers: rng.int(scaled(45.0), scaled(85.0)),
        farms: rng.int(1 + scaled(0.8), 2 + scaled(1.6)),
        training_grounds: rng.int(0, 1),
        walls: rng.int(0, 1),
        tax_rate: if def.suzerain_id.is_some() { config().vassal_tax_rate } else { 0.0 },
        trade_partners: Vec::new(),
        last_delegation_turn: 0,
    };
    house.resources = Resources {
        gold: rng.int((tier as f64 * 0.8).floor() as i64, (tier as f64 * 1.6).floor() as i64),
        food: rng.int(scaled(520.0), scaled(980.0)),
        goods: rng.int((tier as f64 * 0.18).floor() as i64, (tier as f64 * 0.55).floor() as i64),
    };
    house.army = Army {
        levies: rng.int(scaled(45.0), scaled(95.0)),
        men_at_arms: rng.int(scaled(12.0), scaled(30.0)),
        squires: rng.int(0, scaled(6.0)),
        knights: rng.int(0, scaled(3.0)),
        dragons: 0,
        stationed_ratio: 0.7,
    };
    house
}

/// Starting opinion of every house toward every other
pub fn initialize_relations(world: &mut WorldState, rng: &mut GameRng) {
    let n = world.houses.len();
    for a in 0..n {
        for b in 0..n {
            if a == b {
                continue;
            }
            let (ha, hb) = (&world.houses[a], &world.houses[b]);
            let mut relation = 45;
            if hb.is_crown {
                relation = 60;
            }
            if ha.is_crown {
                relation = 55;
            }
            if ha.region_id == hb.region_id {
                relation = 58;
            }
            if ha.suzerain_id.as_ref() == Some(&hb.id) {
                relation = 62;
            }
            if hb.suzerain_id.as_ref() == Some(&ha.id) {
                relation = 55;
            }
            relation -= ((hb.prestige_base - ha.prestige_base).abs() / 12).min(10);
            let other = hb.id.clone();
            let value = relation + rng.int(-6, 6) as i32;
            world.houses[a].set_relation(&other, value);
        }
    }
}

/// Rolls a procedural character around a martial base
fn mk_char(
    world: &mut WorldState,
    rng: &mut GameRng,
    house: &HouseId,
    gender: Gender,
    age: i64,
    location: &LocationId,
    martial_base: i64,
) -> CharacterId {
    let crown = world.house(house).map_or(false, |h| h.is_crown);
    let name = world.gazetteer.names.generate(rng, gender);
    let beauty = rng.int(25, 65) + if martial_base > 60 { 8 } else { 0 };
    let charm = rng.int(25, 70);
    let likability = rng.int(25, 75);
    let martial = (martial_base + rng.int(-10, 10)).clamp(0, 100);
    let prestige = rng.int(6, 22) + if martial > 60 { 6 } else { 0 } + if crown { 6 } else { 0 };
    let sterile = rng.chance(0.05);
    let gold = rng.int(15, 45);

    let id = world.next_character_id();
    let mut c = Character::new(id, name, gender, age as f64, house.clone(), location.clone());
    c.beauty = beauty.clamp(0, 100) as i32;
    c.charm = charm.clamp(0, 100) as i32;
    c.likability = likability.clamp(0, 100) as i32;
    c.martial = martial as i32;
    c.personal_prestige = prestige.clamp(0, 100) as i32;
    c.fertile = !sterile;
    c.personal_gold = gold;
    c.refresh_renown();
    world.add_character(c)
}

fn seed_family(world: &mut WorldState, rng: &mut GameRng, house_id: &HouseId) {
    let Some(seat) = world.house(house_id).map(|h| h.seat_id.clone()) else {
        return;
    };

    let leader_gender = if rng.chance(0.18) { Gender::Female } else { Gender::Male };
    let leader_age = rng.int(38, 58);
    let martial = rng.int(35, 72);
    let leader = mk_char(world, rng, house_id, leader_gender, leader_age, &seat, martial);
    world.set_leader(house_id, &leader);

    let spouse_gender = leader_gender.opposite();
    let spouse_age = rng.int(30, 52);
    let martial = rng.int(15, 45);
    let spouse = mk_char(world, rng, house_id, spouse_gender, spouse_age, &seat, martial);
    if let Some(c) = world.character_mut(&spouse) {
        c.title = Some(match spouse_gender {
            Gender::Female => "Lady Consort".to_string(),
            Gender::Male => "Lord Consort".to_string(),
        });
    }
    world.link_spouses(&leader, &spouse);

    let (father, mother) = match leader_gender {
        Gender::Male => (leader.clone(), spouse.clone()),
        Gender::Female => (spouse.clone(), leader.clone()),
    };
    for _ in 0..rng.int(2, 4) {
        let gender = if rng.chance(0.55) { Gender::Male } else { Gender::Female };
        let age = rng.int(8, 24);
        let martial = rng.int(10, 35);
        let child = mk_char(world, rng, house_id, gender, age, &seat, martial);
        if let Some(c) = world.character_mut(&child) {
            c.father_id = Some(father.clone());
            c.mother_id = Some(mother.clone());
        }
    }

    let gender = if rng.chance(0.55) { Gender::Male } else { Gender::Female };
    let age = rng.int(30, 55);
    let martial = rng.int(20, 55);
    let sibling = mk_char(world, rng, house_id, gender, age, &seat, martial);
    if let Some(c) = world.character_mut(&sibling) {
        c.title = Some("Kin of the House".to_string());
    }
}

fn pick_trade_partners(world: &mut WorldState, rng: &mut GameRng, house_id: &HouseId) {
    let Some(house) = world.house(house_id) else {
        return;
    };
    let mut same_region: Vec<HouseId> = world
        .houses
        .iter()
        .filter(|h| &h.id != house_id && h.region_id == house.region_id)
        .map(|h| h.id.clone())
        .collect();
    let max = match house.tier_gold() {
        700 => 5,
        500 => 4,
        350 => 3,
        _ => 2,
    };
    let want = if same_region.is_empty() {
        0
    } else {
        rng.int(1, max.min(same_region.len() as i64)) as usize
    };
    let mut partners = Vec::with_capacity(want);
    while partners.len() < want {
        let Some(i) = rng.pick_index(same_region.len()) else {
            break;
        };
        partners.push(same_region.swap_remove(i));
    }
    if let Some(h) = world.house_mut(house_id) {
        h.economy.trade_partners = partners;
        h.economy.last_delegation_turn = 0;
    }
}

fn seed_player(world: &mut WorldState, rng: &mut GameRng, params: &NewGameParams) -> Result<()> {
    let house = world
        .house(&params.house_id)
        .ok_or_else(|| ChronicleError::HouseNotFound(params.house_id.clone()))?;
    let seat = house.seat_id.clone();
    let region = house.region_id.clone();
    let leader_id = house
        .leader_id
        .clone()
        .ok_or_else(|| ChronicleError::Uninitialized(format!("house {} has no leader", params.house_id)))?;

    let martial = rng.int(22, 45);
    let player = mk_char(world, rng, &params.house_id, params.gender, 18, &seat, martial);

    let (leader_gender, spouse) = match world.character(&leader_id) {
        Some(l) => (l.gender, l.spouse_id.clone()),
        None => return Err(ChronicleError::CharacterNotFound(leader_id)),
    };
    let spouse_gender = spouse.as_ref().and_then(|s| world.character(s)).map(|s| s.gender);
    if let Some(c) = world.character_mut(&player) {
        c.title = Some(match params.gender {
            Gender::Male => "Distant Heir".to_string(),
            Gender::Female => "Distant Heiress".to_string(),
        });
        match (spouse, spouse_gender) {
            (Some(spouse), Some(g)) if g != leader_gender => {
                if leader_gender == Gender::Male {
                    c.father_id = Some(leader_id.clone());
                    c.mother_id = Some(spouse);
                } else {
                    c.mother_id = Some(leader_id.clone());
                    c.father_id = Some(spouse);
                }
            }
            _ => c.father_id = Some(leader_id.clone()),
        }
    }

    for i in 0..world.characters.len() {
        let c = &world.characters[i];
        let local = c.location_id == seat
            && world
                .house(&c.current_house_id)
                .map_or(false, |h| h.region_id == region);
        if local {
            let rel = (35 + rng.int(-10, 10) as i32).clamp(0, 100);
            let c = &mut world.characters[i];
            c.known_to_player = true;
            c.relationship_to_player = rel;
        }
    }
    if let Some(c) = world.character_mut(&player) {
        c.known_to_player = true;
        c.relationship_to_player = 50;
    }

    world.player_id = player;
    world.player_house_id = params.house_id.clone();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::gazetteer::{Location, LocationKind, NamePools, Region};
    use crate::core::types::RegionId;

    fn gazetteer() -> Gazetteer {
        let house = |id: &str, prestige: i32, crown: bool, suzerain: Option<&str>| HouseDef {
            id: HouseId::new(id),
            name: format!("House {}", id),
            region_id: RegionId::new("crownlands"),
            seat_id: LocationId::new(format!("{}_seat", id)),
            prestige_base: prestige,
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
            locations: ["throne", "rosby", "stokeworth"]
                .iter()
                .map(|id| Location {
                    id: LocationId::new(format!("{}_seat", id)),
                    name: id.to_string(),
                    region_id: RegionId::new("crownlands"),
                    kind: LocationKind::Seat,
                })
                .collect(),
            routes: vec![],
            houses: vec![
                house("throne", 95, true, None),
                house("rosby", 40, false, Some("throne")),
                house("stokeworth", 55, false, Some("throne")),
            ],
            names: NamePools {
                male: vec!["Aemon".into(), "Jaehaerys".into()],
                female: vec!["Alysanne".into(), "Rhaena".into()],
                epithets: vec!["the Bold".into()],
            },
            scheduled_events: vec![],
        }
    }

    fn build(seed: u32) -> WorldState {
        let params = NewGameParams {
            house_id: HouseId::new("rosby"),
            gender: Gender::Female,
        };
        let mut rng = GameRng::new(seed);
        build_initial_state(gazetteer(), &CanonPack::default(), &params, &mut rng).unwrap()
    }

    #[test]
    fn test_every_house_has_a_family_and_leader() {
        let world = build(42);
        for house in &world.houses {
            let leader = house.leader_id.as_ref().unwrap();
            assert_eq!(world.character(leader).unwrap().current_house_id, house.id);
            assert!(world.alive_count(&house.id) >= 5);
        }
        assert!(world.spouse_links_are_mutual());
    }

    #[test]
    fn test_player_is_youngest_child() {
        let world = build(7);
        let player = world.player().unwrap();
        assert_eq!(player.age, 18.0);
        assert_eq!(player.gender, Gender::Female);
        assert_eq!(player.current_house_id, HouseId::new("rosby"));
        let leader = world.player_house().unwrap().leader_id.clone().unwrap();
        assert!(player.father_id.as_ref() == Some(&leader) || player.mother_id.as_ref() == Some(&leader));
        assert!(!world.player_is_leader());
    }

    #[test]
    fn test_tax_only_for_vassals() {
        let world = build(3);
        assert_eq!(world.house(&HouseId::new("throne")).unwrap().economy.tax_rate, 0.0);
        assert_eq!(world.house(&HouseId::new("rosby")).unwrap().economy.tax_rate, 0.15);
    }

    #[test]
    fn test_seed_rolls_stay_in_tier_bounds() {
        let world = build(11);
        let crown = world.house(&HouseId::new("throne")).unwrap();
        assert!((560..=1120).contains(&crown.resources.gold));
        assert!(crown.economy.trade_partners.len() <= 2);
        for (_, &rel) in &crown.relations {
            assert!((0..=100).contains(&rel));
        }
    }

    #[test]
    fn test_same_seed_same_world() {
        let a = build(99);
        let b = build(99);
        let names_a: Vec<_> = a.characters.iter().map(|c| c.name.clone()).collect();
        let names_b: Vec<_> = b.characters.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn test_unknown_house_rejected() {
        let params = NewGameParams {
            house_id: HouseId::new("nowhere"),
            gender: Gender::Male,
        };
        let mut rng = GameRng::new(1);
        let result = build_initial_state(gazetteer(), &CanonPack::default(), &params, &mut rng);
        assert!(matches!(result, Err(ChronicleError::HouseNotFound(_))));
    }
}
