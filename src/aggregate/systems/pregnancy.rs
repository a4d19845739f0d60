//! Conception, pregnancy and childbirth

use crate::aggregate::character::{Character, MaritalStatus, Pregnancy};
use crate::aggregate::systems::lifecycle::resolve_death;
use crate::aggregate::world::WorldState;
use crate::core::config::config;
use crate::core::rng::GameRng;
use crate::core::types::{CharacterId, Gender};

/// How a delivery ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    MotherAndChildLost,
    ChildBornMotherLost(CharacterId),
    Stillborn,
    Born(CharacterId),
}

/// Starts a pregnancy unless the mother already carries one
pub fn begin_pregnancy(world: &mut WorldState, mother: &CharacterId, father: &CharacterId, legitimate: bool) -> bool {
    let now = world.now();
    let turns = config().pregnancy_turns;
    let Some(m) = world.character_mut(mother) else {
        return false;
    };
    if m.pregnancy.is_some() {
        return false;
    }
    m.pregnancy = Some(Pregnancy {
        father_id: father.clone(),
        conceived_turn: now,
        turns_left: turns,
        legitimate,
    });
    if mother == &world.player_id || father == &world.player_id {
        let kind = if legitimate { "legitimate" } else { "bastard" };
        world.narrate(format!("A pregnancy begins ({}). The birth is expected in about {} turns.", kind, turns));
    }
    true
}

/// Married couples with a fertile wife may conceive
pub fn tick_conceptions(world: &mut WorldState, rng: &mut GameRng) {
    let chance = config().conception_chance;
    let couples: Vec<(CharacterId, CharacterId)> = world
        .characters
        .iter()
        .filter(|c| c.alive && c.gender == Gender::Male && c.marital_status == MaritalStatus::Married)
        .filter_map(|husband| {
            let wife = world.character(husband.spouse_id.as_ref()?)?;
            let fertile_pair = wife.marital_status == MaritalStatus::Married
                && wife.gender == Gender::Female
                && wife.is_fertile_female()
                && husband.is_adult_male()
                && wife.pregnancy.is_none();
            fertile_pair.then(|| (husband.id.clone(), wife.id.clone()))
        })
        .collect();

    for (father, mother) in couples {
        if rng.chance(chance) {
            begin_pregnancy(world, &mother, &father, true);
        }
    }
}

/// Creates a newborn in the father's house at the mother's location
pub fn spawn_newborn(
    world: &mut WorldState,
    rng: &mut GameRng,
    father: &CharacterId,
    mother: &CharacterId,
    gender: Gender,
    bastard: bool,
) -> Option<CharacterId> {
    let house = world.character(father)?.current_house_id.clone();
    let location = world.character(mother)?.location_id.clone();
    let name = world.gazetteer.names.generate(rng, gender);
    let id = world.next_character_id();

    let mut child = Character::new(id.clone(), name, gender, 0.0, house, location);
    child.father_id = Some(father.clone());
    child.mother_id = Some(mother.clone());
    child.martial = rng.int(0, 5) as i32;
    child.charm = rng.int(0, 5) as i32;
    child.beauty = rng.int(0, 5) as i32;
    child.fertile = !rng.chance(0.05);
    child.likability = rng.int(10, 40) as i32;
    child.personal_prestige = 0;
    child.is_bastard = bastard;
    child.refresh_renown();
    Some(world.add_character(child))
}

/// Chronicles a birth; the player's own children wait in the naming queue
fn announce_birth(world: &mut WorldState, baby: &CharacterId, father: &CharacterId, mother: &CharacterId) {
    let player_parent = father == &world.player_id || mother == &world.player_id;
    if !player_parent {
        let (name, house) = match world.character(baby) {
            Some(c) => (c.name.clone(), world.house_name(&c.current_house_id)),
            None => return,
        };
        world.record("Birth", format!("{} is born to {}.", name, house), &["birth"]);
        return;
    }
    if let Some(c) = world.character_mut(baby) {
        c.name = "(unnamed)".to_string();
        c.known_to_player = true;
    }
    world.ui.pending_name_queue.push(baby.clone());
    world.narrate("A child is born to your line. Choose a first name.");
    world.record("Birth in your family", "A child is born into your line.", &["birth"]);
}

fn deliver(
    world: &mut WorldState,
    rng: &mut GameRng,
    mother: &CharacterId,
    pregnancy: &Pregnancy,
) -> Option<Delivery> {
    let father = &pregnancy.father_id;
    if !world.character(father).map_or(false, |f| f.alive) {
        return None;
    }
    let roll = rng.next();
    let gender = if rng.chance(0.55) { Gender::Male } else { Gender::Female };
    let bastard = !pregnancy.legitimate;
    let involves_player = mother == &world.player_id || father == &world.player_id;

    if roll < 0.03 {
        resolve_death(world, mother, "died in childbirth with the child");
        return Some(Delivery::MotherAndChildLost);
    }
    if roll < 0.08 {
        let baby = spawn_newborn(world, rng, father, mother, gender, bastard)?;
        resolve_death(world, mother, "died in childbirth");
        if !world.status.over {
            announce_birth(world, &baby, father, mother);
        }
        return Some(Delivery::ChildBornMotherLost(baby));
    }
    if roll < 0.13 {
        if involves_player {
            world.narrate("The baby did not survive the birth.");
        }
        return Some(Delivery::Stillborn);
    }
    let baby = spawn_newborn(world, rng, father, mother, gender, bastard)?;
    if involves_player {
        let kind = if bastard { "bastard" } else { "legitimate" };
        world.narrate(format!("A {} child is born.", kind));
    }
    announce_birth(world, &baby, father, mother);
    Some(Delivery::Born(baby))
}

/// Advances every pregnancy by one turn and delivers the ones that are due
pub fn tick_pregnancies(world: &mut WorldState, rng: &mut GameRng) -> Vec<Delivery> {
    let miscarriage = config().miscarriage_chance;
    let mut deliveries = Vec::new();
    let mothers: Vec<CharacterId> = world
        .characters
        .iter()
        .filter(|c| c.pregnancy.is_some())
        .map(|c| c.id.clone())
        .collect();

    for mother in mothers {
        let Some(m) = world.character_mut(&mother) else {
            continue;
        };
        if !m.alive {
            m.pregnancy = None;
            continue;
        }
        if rng.chance(miscarriage) {
            let father = m.pregnancy.take().map(|p| p.father_id);
            if mother == world.player_id || father.as_ref() == Some(&world.player_id) {
                world.narrate("A tragedy: the pregnancy is lost.");
            }
            continue;
        }
        let Some(pregnancy) = m.pregnancy.as_mut() else {
            continue;
        };
        pregnancy.turns_left = pregnancy.turns_left.saturating_sub(1);
        if pregnancy.turns_left > 0 {
            continue;
        }
        let Some(due) = m.pregnancy.take() else {
            continue;
        };
        if let Some(delivery) = deliver(world, rng, &mother, &due) {
            deliveries.push(delivery);
        }
        if world.status.over {
            break;
        }
    }
    deliveries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::house::House;
    use crate::core::types::{HouseId, LocationId, RegionId};
    use crate::data::gazetteer::{Gazetteer, NamePools};

    fn world() -> WorldState {
        let gazetteer = Gazetteer {
            names: NamePools {
                male: vec!["Aemon".into()],
                female: vec!["Rhaena".into()],
                epithets: vec![],
            },
            ..Gazetteer::default()
        };
        let mut world = WorldState::new(gazetteer);
        world.add_house(House::new(
            HouseId::new("a"),
            "House A",
            RegionId::new("r"),
            LocationId::new("seat"),
            50,
        ));
        world
    }

    fn couple(world: &mut WorldState) -> (CharacterId, CharacterId) {
        let husband = world.next_character_id();
        world.add_character(Character::new(
            husband.clone(),
            "Husband",
            Gender::Male,
            30.0,
            HouseId::new("a"),
            LocationId::new("seat"),
        ));
        let wife = world.next_character_id();
        world.add_character(Character::new(
            wife.clone(),
            "Wife",
            Gender::Female,
            25.0,
            HouseId::new("a"),
            LocationId::new("tower"),
        ));
        world.link_spouses(&husband, &wife);
        (husband, wife)
    }

    #[test]
    fn test_pregnancy_is_not_doubled() {
        let mut world = world();
        let (husband, wife) = couple(&mut world);
        assert!(begin_pregnancy(&mut world, &wife, &husband, true));
        assert!(!begin_pregnancy(&mut world, &wife, &husband, true));
    }

    #[test]
    fn test_pregnancy_ends_within_term() {
        let mut world = world();
        let (husband, wife) = couple(&mut world);
        begin_pregnancy(&mut world, &wife, &husband, false);
        let mut rng = GameRng::new(77);
        for _ in 0..config().pregnancy_turns {
            tick_pregnancies(&mut world, &mut rng);
        }
        assert!(world.character(&wife).unwrap().pregnancy.is_none());
    }

    #[test]
    fn test_newborn_inherits_house_location_and_bastardy() {
        let mut world = world();
        let (husband, wife) = couple(&mut world);
        let mut rng = GameRng::new(1);
        let baby = spawn_newborn(&mut world, &mut rng, &husband, &wife, Gender::Female, true).unwrap();
        let c = world.character(&baby).unwrap();
        assert_eq!(c.current_house_id, HouseId::new("a"));
        assert_eq!(c.location_id, LocationId::new("tower"));
        assert_eq!(c.age, 0.0);
        assert!(c.is_bastard);
        assert!((0..=5).contains(&c.martial));
        assert_eq!(c.mother_id.as_ref(), Some(&wife));
    }

    #[test]
    fn test_player_child_goes_to_naming_queue() {
        let mut world = world();
        let (husband, wife) = couple(&mut world);
        world.player_id = husband.clone();
        world.player_house_id = HouseId::new("a");
        let mut rng = GameRng::new(1);
        let baby = spawn_newborn(&mut world, &mut rng, &husband, &wife, Gender::Male, false).unwrap();
        announce_birth(&mut world, &baby, &husband, &wife);
        assert_eq!(world.ui.pending_name_queue, vec![baby]);
    }

    #[test]
    fn test_conception_needs_fertile_wife() {
        let mut world = world();
        let (_husband, wife) = couple(&mut world);
        world.character_mut(&wife).unwrap().age = 44.0;
        let mut rng = GameRng::new(3);
        for _ in 0..2000 {
            tick_conceptions(&mut world, &mut rng);
        }
        assert!(world.character(&wife).unwrap().pregnancy.is_none());
    }
}
