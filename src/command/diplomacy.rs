//! Diplomacy: courting people and houses from afar

use crate::aggregate::character::Character;
use crate::aggregate::world::WorldState;
use crate::canon::engine::touch_character;
use crate::core::rng::GameRng;
use crate::core::types::{CharacterId, Gender, HouseId};

pub const GIFT_COST: i64 = 35;
pub const MIN_PROPOSAL_RELATION: i32 = 50;

fn known_target(world: &WorldState, target: &CharacterId) -> std::result::Result<HouseId, String> {
    let c = world
        .character(target)
        .filter(|c| c.alive && c.known_to_player && c.id != world.player_id)
        .ok_or_else(|| "That person is not available.".to_string())?;
    Ok(c.current_house_id.clone())
}

fn bump_house_relation(world: &mut WorldState, other: &HouseId, delta: i32) {
    let player_house = world.player_house_id.clone();
    if &player_house == other {
        return;
    }
    if let Some(h) = world.house_mut(&player_house) {
        h.adjust_relation(other, delta);
    }
}

pub fn talk(world: &mut WorldState, rng: &mut GameRng, target: &CharacterId) -> std::result::Result<(), String> {
    let their_house = known_target(world, target)?;
    let gain = rng.int(2, 6) as i32;
    if let Some(c) = world.character_mut(target) {
        c.adjust_relationship(gain);
    }
    touch_character(world, target, "diplomacy_talk", 1);
    bump_house_relation(world, &their_house, 1);
    world.narrate(format!(
        "{}: \"The world is wide and dangerous. Good to have friends.\" Relationship +{}, house relation +1.",
        world.character_name(target),
        gain
    ));
    Ok(())
}

pub fn gift(world: &mut WorldState, rng: &mut GameRng, target: &CharacterId) -> std::result::Result<(), String> {
    let their_house = known_target(world, target)?;
    let house = world.player_house_mut().ok_or_else(|| "You have no house.".to_string())?;
    if house.resources.gold < GIFT_COST {
        return Err("Not enough gold for a worthy gift.".into());
    }
    house.resources.gold -= GIFT_COST;

    let gain = rng.int(6, 14) as i32;
    if let Some(c) = world.character_mut(target) {
        c.adjust_relationship(gain);
    }
    touch_character(world, target, "diplomacy_gift", 2);
    let house_gain = rng.int(2, 5) as i32;
    bump_house_relation(world, &their_house, house_gain);
    world.narrate(format!(
        "You spend {} gold on a gift for {}. Relationship +{}.",
        GIFT_COST,
        world.character_name(target),
        gain
    ));
    Ok(())
}

/// Chance that a house grants an audience
pub fn audience_chance(prestige_gap: i32, relation: i32) -> f64 {
    let base = 0.45 - (prestige_gap as f64 / 120.0).clamp(0.0, 0.35) + ((relation - 50) as f64 / 200.0).clamp(-0.10, 0.20);
    base.clamp(0.08, 0.75)
}

/// Chance that a house accepts a marriage alliance
pub fn proposal_chance(prestige_gap: i32, relation: i32) -> f64 {
    let base = 0.55 - (prestige_gap as f64 / 120.0).clamp(-0.10, 0.35) + (relation - 50) as f64 / 120.0;
    base.clamp(0.15, 0.90)
}

/// Prestige lost when a proposal is refused
pub fn refusal_penalty(prestige_gap: i32) -> i32 {
    (2 + prestige_gap.max(0) / 18).clamp(2, 10)
}

/// (prestige gap, our relation toward them)
fn standing(world: &WorldState, other: &HouseId) -> std::result::Result<(i32, i32), String> {
    if other == &world.player_house_id {
        return Err("That is your own house.".into());
    }
    let theirs = world.house(other).ok_or_else(|| "Unknown house.".to_string())?;
    let ours = world.player_house().ok_or_else(|| "You have no house.".to_string())?;
    Ok((theirs.prestige - ours.prestige, ours.relation(other)))
}

pub fn audience(world: &mut WorldState, rng: &mut GameRng, other: &HouseId) -> std::result::Result<(), String> {
    let (gap, relation) = standing(world, other)?;
    let their_name = world.house_name(other);

    if rng.chance(audience_chance(gap, relation)) {
        let location = world.player().map(|p| p.location_id.clone()).ok_or_else(|| "No player character.".to_string())?;
        let envoy = spawn_envoy(world, rng, other, location);
        let gain = rng.int(2, 6) as i32;
        bump_house_relation(world, other, gain);
        world.narrate(format!(
            "You are granted an audience. {} of {} receives you.",
            world.character_name(&envoy),
            their_name
        ));
    } else {
        let loss = rng.int(1, 4) as i32;
        if let Some(h) = world.player_house_mut() {
            h.adjust_relation(other, -loss);
            h.adjust_prestige(-1);
        }
        world.narrate("Guards and servants keep you waiting, and the door never opens. Prestige -1.");
    }
    Ok(())
}

fn spawn_envoy(world: &mut WorldState, rng: &mut GameRng, house: &HouseId, location: crate::core::types::LocationId) -> CharacterId {
    let gender = if rng.chance(0.55) { Gender::Male } else { Gender::Female };
    let name = world.gazetteer.names.generate(rng, gender);
    let id = world.next_character_id();
    let age = rng.int(20, 45) as f64;

    let mut envoy = Character::new(id, name, gender, age, house.clone(), location);
    envoy.martial = rng.int(20, 55) as i32;
    envoy.charm = rng.int(30, 70) as i32;
    envoy.beauty = rng.int(30, 70) as i32;
    envoy.fertile = !rng.chance(0.05);
    envoy.likability = rng.int(25, 75) as i32;
    envoy.personal_prestige = rng.int(0, 12) as i32;
    envoy.refresh_renown();
    envoy.known_to_player = true;
    envoy.relationship_to_player = (30 + rng.int(-5, 10) as i32).clamp(0, 100);
    envoy.title = Some("Envoy".into());
    world.add_character(envoy)
}

/// Proposes a marriage alliance to another house
pub fn propose_marriage(world: &mut WorldState, rng: &mut GameRng, other: &HouseId) -> std::result::Result<(), String> {
    let (gap, relation) = standing(world, other)?;
    if relation < MIN_PROPOSAL_RELATION {
        return Err(format!(
            "Relations are too cold for a serious proposal ({} of {} needed).",
            relation, MIN_PROPOSAL_RELATION
        ));
    }
    let ours = world.player_house_id.clone();
    let (our_name, their_name) = (world.house_name(&ours), world.house_name(other));

    if rng.chance(proposal_chance(gap, relation)) {
        let a_to_b = rng.int(10, 18) as i32;
        let b_to_a = rng.int(8, 14) as i32;
        world.adjust_relations(&ours, other, a_to_b, b_to_a);
        if let Some(h) = world.player_house_mut() {
            h.adjust_prestige(2);
        }
        world.record(
            "Alliance sealed",
            format!("{} and {} agree on a marriage pact and swear mutual support.", our_name, their_name),
            &["alliance", "marriage"],
        );
        world.narrate(format!("Proposal accepted. A marriage alliance with {} is sealed.", their_name));
    } else {
        let penalty = refusal_penalty(gap);
        let cooled = rng.int(4, 10) as i32;
        if let Some(h) = world.player_house_mut() {
            h.adjust_prestige(-penalty);
            h.adjust_relation(other, -cooled);
        }
        world.narrate(format!("Proposal refused. The refusal echoes through the halls. Prestige -{}.", penalty));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::house::House;
    use crate::core::types::{LocationId, RegionId};
    use crate::data::gazetteer::Gazetteer;

    fn world() -> WorldState {
        let mut world = WorldState::new(Gazetteer::default());
        for (id, prestige) in [("ours", 50), ("theirs", 80)] {
            let mut h = House::new(HouseId::new(id), id, RegionId::new("r"), LocationId::new("seat"), prestige);
            h.resources.gold = 100;
            world.add_house(h);
        }
        world.add_character(Character::new(CharacterId::new("p"), "Player", Gender::Male, 25.0, HouseId::new("ours"), LocationId::new("seat")));
        let mut stranger = Character::new(CharacterId::new("s"), "Stranger", Gender::Female, 25.0, HouseId::new("theirs"), LocationId::new("seat"));
        stranger.known_to_player = true;
        stranger.relationship_to_player = 30;
        world.add_character(stranger);
        world.player_id = CharacterId::new("p");
        world.player_house_id = HouseId::new("ours");
        world
    }

    #[test]
    fn test_audience_chance_formula() {
        assert!((audience_chance(0, 50) - 0.45).abs() < 1e-9);
        assert!((audience_chance(60, 50) - 0.10).abs() < 1e-9);
        assert_eq!(audience_chance(200, 0), 0.08);
    }

    #[test]
    fn test_proposal_chance_and_penalty() {
        assert!((proposal_chance(0, 50) - 0.55).abs() < 1e-9);
        assert_eq!(proposal_chance(-200, 100), 0.90);
        assert_eq!(refusal_penalty(-30), 2);
        assert_eq!(refusal_penalty(36), 4);
        assert_eq!(refusal_penalty(500), 10);
    }

    #[test]
    fn test_gift_costs_gold_and_raises_relationship() {
        let mut world = world();
        let mut rng = GameRng::new(3);
        gift(&mut world, &mut rng, &CharacterId::new("s")).unwrap();
        assert_eq!(world.player_house().unwrap().resources.gold, 100 - GIFT_COST);
        assert!(world.character(&CharacterId::new("s")).unwrap().relationship_to_player >= 36);
        assert!(world.player_house().unwrap().relation(&HouseId::new("theirs")) >= 52);
    }

    #[test]
    fn test_gift_without_gold_changes_nothing() {
        let mut world = world();
        let mut rng = GameRng::new(3);
        world.player_house_mut().unwrap().resources.gold = 10;
        assert!(gift(&mut world, &mut rng, &CharacterId::new("s")).is_err());
        assert_eq!(world.character(&CharacterId::new("s")).unwrap().relationship_to_player, 30);
    }

    #[test]
    fn test_proposal_needs_warm_relations() {
        let mut world = world();
        let mut rng = GameRng::new(4);
        world.player_house_mut().unwrap().set_relation(&HouseId::new("theirs"), 40);
        assert!(propose_marriage(&mut world, &mut rng, &HouseId::new("theirs")).is_err());
        assert_eq!(world.player_house().unwrap().prestige, 50);
    }
}
