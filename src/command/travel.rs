//! Travel along the road network, with the occasional ambush

use crate::aggregate::house::House;
use crate::aggregate::systems::lifecycle;
use crate::aggregate::world::WorldState;
use crate::core::rng::GameRng;
use crate::core::types::{LocationId, RegionId};

/// Share of the house's troops that escorts the player
pub const ESCORT_SHARE: f64 = 0.6;
pub const MAX_NEW_ACQUAINTANCES: usize = 6;

pub fn escort_size(house: &House) -> i64 {
    (house.army.mass() as f64 * ESCORT_SHARE).round() as i64
}

/// Chance of an ambush when leaving a location in `region`
pub fn encounter_risk(world: &WorldState, region: &RegionId, escort: i64, prestige: i32) -> f64 {
    let base = world.gazetteer.encounter_risk(region);
    let army_factor = (1.0 - escort as f64 / 260.0).clamp(0.25, 1.0);
    let prestige_factor = (1.0 - prestige as f64 / 250.0).clamp(0.6, 1.0);
    (base * army_factor * prestige_factor).clamp(0.02, 0.25)
}

pub fn travel(world: &mut WorldState, rng: &mut GameRng, to: &LocationId) -> std::result::Result<(), String> {
    let player = world.player().ok_or_else(|| "No player character.".to_string())?;
    let from = player.location_id.clone();
    if world.gazetteer.route_between(&from, to).is_none() {
        return Err(format!("No road leads from {} to {}.", world.gazetteer.location_name(&from), world.gazetteer.location_name(to)));
    }
    let house = world.player_house().ok_or_else(|| "You have no house.".to_string())?;
    let escort = escort_size(house);
    let region = world
        .location(&from)
        .map(|l| l.region_id.clone())
        .unwrap_or_else(|| house.region_id.clone());
    let risk = encounter_risk(world, &region, escort, house.prestige);

    world.narrate(format!("You set out for {}.", world.gazetteer.location_name(to)));
    if rng.chance(risk) {
        ambush(world, rng, escort);
        if world.player().map_or(true, |p| !p.alive) {
            return Ok(());
        }
    } else {
        world.narrate("The road is quiet. Only wind and crows for company.");
    }

    if let Some(p) = world.player_mut() {
        p.location_id = to.clone();
    }
    meet_locals(world, rng, to);
    Ok(())
}

fn ambush(world: &mut WorldState, rng: &mut GameRng, escort: i64) {
    let bandits = rng.int(18, 120);
    let bandit_power = bandits * rng.int(1, 3);
    let martial = world.player().map_or(0, |p| p.martial as i64);
    let player_power = match world.player_house() {
        Some(h) => escort * 2 + h.army.knights * 12 + h.army.squires * 6 + h.army.men_at_arms * 4 + martial * 2,
        None => martial * 2,
    };
    world.narrate(format!("Ambush on the road! {} bandits try to surround your company.", bandits));

    let win_chance = (player_power as f64 / (player_power + bandit_power).max(1) as f64).clamp(0.1, 0.9);
    if rng.chance(win_chance) {
        let gold = rng.int(20, 120);
        let food = rng.int(30, 140);
        if let Some(h) = world.player_house_mut() {
            h.resources.gold += gold;
            h.resources.food += food;
            h.adjust_prestige(1);
        }
        world.narrate(format!("You drive off the bandits and take their spoils: +{} gold, +{} food. Prestige +1.", gold, food));
        return;
    }

    let death_chance = (0.30 + (bandit_power - player_power) as f64 / 900.0).clamp(0.25, 0.80);
    if rng.chance(death_chance) {
        let player_id = world.player_id.clone();
        tracing::debug!(bandits, "Player killed in an ambush");
        lifecycle::resolve_death(world, &player_id, "killed in an ambush");
        return;
    }
    let gold_roll = rng.int(40, 180);
    let food_roll = rng.int(60, 220);
    if let Some(h) = world.player_house_mut() {
        let gold = h.resources.take_gold(gold_roll);
        let food = h.resources.take_food(food_roll);
        h.adjust_prestige(-2);
        world.narrate(format!("You escape, at a price: -{} gold, -{} food. Prestige -2.", gold, food));
    }
}

/// Introduces the player to a few people of the local houses
fn meet_locals(world: &mut WorldState, rng: &mut GameRng, at: &LocationId) {
    let Some(region) = world.location(at).map(|l| l.region_id.clone()) else {
        return;
    };
    let player_id = world.player_id.clone();
    let locals: Vec<usize> = world
        .characters
        .iter()
        .enumerate()
        .filter(|(_, c)| c.alive && c.id != player_id && &c.location_id == at)
        .filter(|(_, c)| world.house(&c.current_house_id).map_or(false, |h| h.region_id == region))
        .map(|(i, _)| i)
        .take(MAX_NEW_ACQUAINTANCES)
        .collect();

    for i in locals {
        if world.characters[i].known_to_player {
            continue;
        }
        let relationship = (25 + rng.int(-5, 10) as i32).clamp(0, 100);
        let c = &mut world.characters[i];
        c.known_to_player = true;
        c.relationship_to_player = relationship;
        let (name, house) = (c.name.clone(), c.current_house_id.clone());
        let house_name = world.house_name(&house);
        world.narrate(format!("You make the acquaintance of {} ({}).", name, house_name));
    }
}
