//! Succession resolver
//!
//! `compute_successor` is pure: it only reads the world. `apply_succession`
//! performs the escheat transfer, installs the heir and narrates the result.

use crate::aggregate::character::Character;
use crate::aggregate::world::WorldState;
use crate::core::config::config;
use crate::core::types::{CharacterId, Gender, HouseId};

/// How the heir was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuccessionPath {
    /// From the house's own members
    Lineage,
    /// Granted by the suzerain after the local line died out
    Escheat { from: HouseId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Successor {
    pub id: CharacterId,
    pub path: SuccessionPath,
}

fn by_age_desc(list: &mut [&Character]) {
    list.sort_by(|a, b| b.age.total_cmp(&a.age));
}

/// Picks the heir of `house_id` without mutating anything
///
/// Candidates are living, legitimate members whose current house is the
/// house. Order: sons, brothers, other male kin, daughters, sisters, other
/// female kin, each tier eldest first. With no candidate, the strongest
/// adult of the suzerain's house is chosen.
pub fn compute_successor(world: &WorldState, house_id: &HouseId) -> Option<Successor> {
    let house = world.house(house_id)?;
    let leader = house.leader_id.as_ref().and_then(|id| world.character(id));

    let candidates: Vec<&Character> = world
        .members_of(house_id)
        .filter(|c| !c.is_bastard)
        .filter(|c| leader.map_or(true, |l| l.id != c.id))
        .collect();

    let is_child = |c: &Character| {
        leader.map_or(false, |l| {
            c.father_id.as_ref() == Some(&l.id) || c.mother_id.as_ref() == Some(&l.id)
        })
    };
    let is_sibling = |c: &Character| {
        leader.map_or(false, |l| l.father_id.is_some() && c.father_id == l.father_id)
    };

    let mut tiers: [Vec<&Character>; 6] = Default::default();
    for &c in &candidates {
        let male = c.gender == Gender::Male;
        let tier = if is_child(c) {
            if male { 0 } else { 3 }
        } else if is_sibling(c) {
            if male { 1 } else { 4 }
        } else if male {
            2
        } else {
            5
        };
        tiers[tier].push(c);
    }
    for tier in tiers.iter_mut() {
        by_age_desc(tier);
    }
    if let Some(heir) = tiers.iter().flat_map(|t| t.iter()).next() {
        return Some(Successor {
            id: heir.id.clone(),
            path: SuccessionPath::Lineage,
        });
    }

    let suzerain_id = house.suzerain_id.as_ref()?;
    world.house(suzerain_id)?;
    let adult_age = config().adult_age;
    let mut pool: Vec<&Character> = world
        .members_of(suzerain_id)
        .filter(|c| c.age >= adult_age && !c.is_bastard)
        .collect();
    pool.sort_by(|a, b| {
        (b.personal_prestige + b.martial).cmp(&(a.personal_prestige + a.martial))
    });
    pool.first().map(|c| Successor {
        id: c.id.clone(),
        path: SuccessionPath::Escheat {
            from: suzerain_id.clone(),
        },
    })
}

/// Resolves the succession of `house_id` and installs the heir
///
/// Returns the new leader, or `None` when the house is left leaderless.
pub fn apply_succession(world: &mut WorldState, house_id: &HouseId) -> Option<CharacterId> {
    let Some(successor) = compute_successor(world, house_id) else {
        if let Some(house) = world.house_mut(house_id) {
            house.leader_id = None;
        }
        let name = world.house_name(house_id);
        tracing::debug!(house = %house_id, "House left without a leader");
        world.narrate(format!("{} has no heir; the seat stands empty.", name));
        world.record(
            format!("Line extinct: {}", name),
            format!("No living heir remains to lead {}.", name),
            &["politics", "succession"],
        );
        return None;
    };

    if let SuccessionPath::Escheat { from } = &successor.path {
        if let Some(heir) = world.character_mut(&successor.id) {
            heir.current_house_id = house_id.clone();
            heir.keeps_birth_name = false;
        }
        let (house_name, suzerain_name) = (world.house_name(house_id), world.house_name(from));
        let heir_name = world.character_name(&successor.id);
        world.record(
            format!("Grant: {}", house_name),
            format!(
                "{} grants {} to {} after the local line dies out.",
                suzerain_name, house_name, heir_name
            ),
            &["politics", "succession"],
        );
    }

    world.set_leader(house_id, &successor.id);
    let (heir_name, house_name) = (world.character_name(&successor.id), world.house_name(house_id));
    tracing::debug!(house = %house_id, heir = %successor.id, "Succession resolved");
    world.narrate(format!("{} becomes leader of {}.", heir_name, house_name));
    Some(successor.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::house::House;
    use crate::core::types::{LocationId, RegionId};
    use crate::data::gazetteer::Gazetteer;

    fn world_with(houses: &[&str]) -> WorldState {
        let mut world = WorldState::new(Gazetteer::default());
        for id in houses {
            world.add_house(House::new(
                HouseId::new(*id),
                format!("House {}", id),
                RegionId::new("r"),
                LocationId::new("seat"),
                50,
            ));
        }
        world
    }

    fn add(world: &mut WorldState, house: &str, gender: Gender, age: f64) -> CharacterId {
        let id = world.next_character_id();
        world.add_character(Character::new(
            id.clone(),
            id.to_string(),
            gender,
            age,
            HouseId::new(house),
            LocationId::new("seat"),
        ))
    }

    fn child_of(world: &mut WorldState, parent: &CharacterId, house: &str, gender: Gender, age: f64) -> CharacterId {
        let id = add(world, house, gender, age);
        world.character_mut(&id).unwrap().father_id = Some(parent.clone());
        id
    }

    #[test]
    fn test_eldest_son_before_older_daughter() {
        let mut world = world_with(&["a"]);
        let lord = add(&mut world, "a", Gender::Male, 60.0);
        world.set_leader(&HouseId::new("a"), &lord);
        let _daughter = child_of(&mut world, &lord, "a", Gender::Female, 30.0);
        let _young_son = child_of(&mut world, &lord, "a", Gender::Male, 18.0);
        let elder_son = child_of(&mut world, &lord, "a", Gender::Male, 25.0);

        let succ = compute_successor(&world, &HouseId::new("a")).unwrap();
        assert_eq!(succ.id, elder_son);
        assert_eq!(succ.path, SuccessionPath::Lineage);
    }

    #[test]
    fn test_brother_before_daughter() {
        let mut world = world_with(&["a"]);
        let grandfather = add(&mut world, "a", Gender::Male, 90.0);
        world.character_mut(&grandfather).unwrap().alive = false;
        let lord = child_of(&mut world, &grandfather, "a", Gender::Male, 50.0);
        world.set_leader(&HouseId::new("a"), &lord);
        let brother = child_of(&mut world, &grandfather, "a", Gender::Male, 45.0);
        let _daughter = child_of(&mut world, &lord, "a", Gender::Female, 20.0);

        let succ = compute_successor(&world, &HouseId::new("a")).unwrap();
        assert_eq!(succ.id, brother);
    }

    #[test]
    fn test_bastards_and_other_houses_excluded() {
        let mut world = world_with(&["a", "b"]);
        let lord = add(&mut world, "a", Gender::Male, 60.0);
        world.set_leader(&HouseId::new("a"), &lord);
        let bastard = child_of(&mut world, &lord, "a", Gender::Male, 30.0);
        world.character_mut(&bastard).unwrap().is_bastard = true;
        let married_out = child_of(&mut world, &lord, "b", Gender::Female, 28.0);
        let niece = add(&mut world, "a", Gender::Female, 12.0);

        let succ = compute_successor(&world, &HouseId::new("a")).unwrap();
        assert_eq!(succ.id, niece);
        assert_ne!(succ.id, married_out);
    }

    #[test]
    fn test_escheat_to_suzerain_house() {
        let mut world = world_with(&["liege", "vassal"]);
        world.house_mut(&HouseId::new("vassal")).unwrap().suzerain_id = Some(HouseId::new("liege"));
        let lord = add(&mut world, "vassal", Gender::Male, 70.0);
        world.set_leader(&HouseId::new("vassal"), &lord);
        world.character_mut(&lord).unwrap().alive = false;

        let weak = add(&mut world, "liege", Gender::Male, 30.0);
        let strong = add(&mut world, "liege", Gender::Female, 35.0);
        world.character_mut(&strong).unwrap().martial = 80;
        let _child = add(&mut world, "liege", Gender::Male, 10.0);

        let succ = compute_successor(&world, &HouseId::new("vassal")).unwrap();
        assert_eq!(succ.id, strong);
        assert_ne!(succ.id, weak);
        assert!(matches!(succ.path, SuccessionPath::Escheat { .. }));

        let leader = apply_succession(&mut world, &HouseId::new("vassal")).unwrap();
        assert_eq!(world.character(&leader).unwrap().current_house_id, HouseId::new("vassal"));
        assert_eq!(world.house(&HouseId::new("vassal")).unwrap().leader_id, Some(leader));
    }

    #[test]
    fn test_leaderless_house_is_terminal() {
        let mut world = world_with(&["a"]);
        let lord = add(&mut world, "a", Gender::Male, 70.0);
        world.set_leader(&HouseId::new("a"), &lord);
        world.character_mut(&lord).unwrap().alive = false;

        assert!(compute_successor(&world, &HouseId::new("a")).is_none());
        assert!(apply_succession(&mut world, &HouseId::new("a")).is_none());
        assert!(world.house(&HouseId::new("a")).unwrap().leader_id.is_none());
        assert!(world.chronicle.last().unwrap().has_tag("succession"));
    }
}
