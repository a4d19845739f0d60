//! Aging, natural death and personal progression

use crate::aggregate::character::MaritalStatus;
use crate::aggregate::systems::succession::{apply_succession, compute_successor, SuccessionPath};
use crate::aggregate::world::WorldState;
use crate::core::config::config;
use crate::core::rng::GameRng;
use crate::core::types::{CharacterId, Gender, HouseId};

/// Per-turn natural death chance for a given age
///
/// Zero below the threshold, then one step per started 5-year band.
pub fn death_chance(age: f64) -> f64 {
    let cfg = config();
    if age < cfg.death_age_threshold {
        return 0.0;
    }
    let step = ((age - cfg.death_age_threshold) / 5.0).floor() + 1.0;
    (step * cfg.death_chance_step).clamp(cfg.death_chance_step, cfg.death_chance_max)
}

/// Ages every living character and rolls natural deaths
///
/// Canonical characters whose recorded death lies in the future are spared
/// unless their fate has diverged.
pub fn tick_ages_and_deaths(world: &mut WorldState, rng: &mut GameRng) {
    let now = world.now();
    for i in 0..world.characters.len() {
        if !world.characters[i].alive {
            continue;
        }
        world.characters[i].age_one_turn();

        let c = &world.characters[i];
        if let Some(link) = &c.canon {
            let before_fate = link.death_turn.map_or(false, |d| now < d);
            if before_fate && !world.canon.is_diverged(&link.canon_id) {
                continue;
            }
        }

        let p = death_chance(c.age);
        if p > 0.0 && rng.chance(p) {
            let id = c.id.clone();
            let cause = format!("natural causes at {}", c.age.floor() as i64);
            resolve_death(world, &id, &cause);
            if world.status.over {
                return;
            }
        }
    }
}

/// Kills a character and settles everything that hangs off them
///
/// Widowhood, surname reversion of a widow, succession for every house the
/// character led, and the hand-over when the player dies. Returns false if
/// the character was already dead or unknown.
pub fn resolve_death(world: &mut WorldState, id: &CharacterId, cause: &str) -> bool {
    let Some(c) = world.character_mut(id) else {
        return false;
    };
    if !c.alive {
        return false;
    }
    c.alive = false;
    c.pregnancy = None;
    if c.marital_status == MaritalStatus::Married {
        c.marital_status = MaritalStatus::Widowed;
    }
    let name = c.name.clone();
    let spouse_id = c.spouse_id.clone();
    tracing::debug!(character = %id, cause, "Character died");
    world.narrate(format!("{} dies ({}).", name, cause));

    if let Some(spouse) = spouse_id.as_ref().and_then(|s| world.character_mut(s)) {
        if spouse.alive {
            spouse.marital_status = MaritalStatus::Widowed;
            if spouse.gender == Gender::Female && spouse.birth_house_id != spouse.current_house_id {
                spouse.current_house_id = spouse.birth_house_id.clone();
                spouse.keeps_birth_name = true;
            }
        }
    }

    let led: Vec<HouseId> = world
        .houses
        .iter()
        .filter(|h| h.leader_id.as_ref() == Some(id))
        .map(|h| h.id.clone())
        .collect();
    let mut player_house_heir = None;
    for house_id in &led {
        let heir = apply_succession(world, house_id);
        if house_id == &world.player_house_id {
            player_house_heir = Some(heir);
        }
    }

    if id == &world.player_id {
        handle_player_death(world, player_house_heir, cause);
    }
    true
}

/// Passes control to the heir of the player's house, or ends the game
///
/// `resolved` carries the outcome of a succession already run for the
/// player's house during this death.
pub fn handle_player_death(
    world: &mut WorldState,
    resolved: Option<Option<CharacterId>>,
    cause: &str,
) {
    let house_id = world.player_house_id.clone();
    let heir = match resolved {
        Some(heir) => heir,
        None => compute_successor(world, &house_id).map(|succ| {
            if let SuccessionPath::Escheat { .. } = succ.path {
                if let Some(c) = world.character_mut(&succ.id) {
                    c.current_house_id = house_id.clone();
                    c.keeps_birth_name = false;
                }
            }
            succ.id
        }),
    };

    match heir.and_then(|id| world.character(&id).map(|c| (id, c.current_house_id.clone()))) {
        Some((id, new_house)) => {
            world.player_id = id.clone();
            world.player_house_id = new_house.clone();
            if let Some(c) = world.character_mut(&id) {
                c.known_to_player = true;
            }
            let (name, house) = (world.character_name(&id), world.house_name(&new_house));
            tracing::info!(heir = %id, "Player control passes to heir");
            world.narrate(format!("Control passes to {} of {}. Cause: {}.", name, house, cause));
        }
        None => {
            world.set_game_over(format!("no eligible heir remains ({})", cause));
        }
    }
}

/// Slow drift of personal traits with age and means
pub fn tick_progression(world: &mut WorldState, rng: &mut GameRng) {
    for c in world.characters.iter_mut().filter(|c| c.alive) {
        let age = c.age;
        let growth = if age < 16.0 {
            1.0
        } else if age <= 28.0 {
            0.7
        } else if age <= 45.0 {
            0.35
        } else {
            0.12
        };
        let decline = if age >= 68.0 {
            0.45
        } else if age >= 56.0 {
            0.25
        } else {
            0.0
        };

        if rng.chance(0.22 * growth) {
            c.martial = (c.martial + rng.int(0, 2) as i32).clamp(0, 100);
        }
        if decline > 0.0 && rng.chance(decline) {
            c.martial = (c.martial - rng.int(0, 2) as i32).clamp(0, 100);
        }

        if rng.chance(if age < 50.0 { 0.18 } else { 0.08 }) {
            c.charm = (c.charm + rng.int(0, 1) as i32).clamp(0, 100);
        }
        if age >= 72.0 && rng.chance(0.20) {
            c.charm = (c.charm - 1).clamp(0, 100);
        }

        if c.personal_gold > 80 && rng.chance(0.16) {
            c.beauty = (c.beauty + 1).clamp(0, 100);
            c.personal_gold = (c.personal_gold - 5).max(0);
        } else if age >= 60.0 && rng.chance(0.17) {
            c.beauty = (c.beauty - 1).clamp(0, 100);
        }

        let build = ((c.martial + c.charm + c.beauty) as f64 / 3.0).round() as i32;
        let gain_chance = if build >= 72 {
            0.20
        } else if build >= 56 {
            0.14
        } else {
            0.08
        };
        if rng.chance(gain_chance) && c.personal_prestige < 85 {
            c.personal_prestige = (c.personal_prestige + 1).clamp(0, 100);
        }

        c.refresh_renown();
    }
}
