//! Canonical war simulation
//!
//! Wars come from the canon pack. Each active war bleeds its participants a
//! little every turn and, at a cadence set by its intensity, stages a battle
//! between one house from each side.

use crate::aggregate::world::WorldState;
use crate::canon::defs::{CanonPack, CanonWarDef, WarIntensity, WarSide};
use crate::core::config::config;
use crate::core::rng::GameRng;
use crate::core::types::{HouseId, LocationId};

/// Per-intensity war parameters
#[derive(Debug, Clone, Copy)]
pub struct IntensityProfile {
    pub levy_loss: f64,
    pub food_loss: f64,
    pub gold_loss: i64,
    /// Minimum turns between two battles
    pub every: i64,
    pub battle_chance: f64,
    pub winner_loss: (f64, f64),
    pub loser_loss: (f64, f64),
    pub points: u32,
}

pub fn profile(intensity: WarIntensity) -> IntensityProfile {
    match intensity {
        WarIntensity::High => IntensityProfile {
            levy_loss: 0.012,
            food_loss: 0.010,
            gold_loss: 6,
            every: 2,
            battle_chance: 0.85,
            winner_loss: (0.03, 0.08),
            loser_loss: (0.08, 0.16),
            points: 2,
        },
        WarIntensity::Medium => IntensityProfile {
            levy_loss: 0.008,
            food_loss: 0.006,
            gold_loss: 4,
            every: 3,
            battle_chance: 0.70,
            winner_loss: (0.02, 0.06),
            loser_loss: (0.06, 0.13),
            points: 1,
        },
        WarIntensity::Low => IntensityProfile {
            levy_loss: 0.004,
            food_loss: 0.003,
            gold_loss: 2,
            every: 5,
            battle_chance: 0.55,
            winner_loss: (0.01, 0.05),
            loser_loss: (0.04, 0.10),
            points: 1,
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattleOutcome {
    pub winner: HouseId,
    pub loser: HouseId,
    pub a_won: bool,
    pub winner_loss: f64,
    pub loser_loss: f64,
    pub sieged: bool,
    pub location: LocationId,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarResult {
    Side(WarSide),
    Stalemate,
}

/// Army power plus the leader's martial bonus
pub fn house_power(world: &WorldState, house_id: &HouseId) -> f64 {
    let cfg = config();
    let Some(house) = world.house(house_id) else {
        return 0.0;
    };
    let martial = house
        .leader_id
        .as_ref()
        .and_then(|id| world.character(id))
        .map_or(cfg.default_leader_martial, |c| c.martial);
    house.army.power() as f64 + martial as f64 * cfg.leader_bonus_per_martial
}

/// Probability that the side with power `pa` wins
pub fn win_chance(pa: f64, pb: f64) -> f64 {
    let cfg = config();
    if pa <= 0.0 && pb <= 0.0 {
        return 0.5;
    }
    (pa / (pa + pb)).clamp(cfg.win_chance_min, cfg.win_chance_max)
}

/// Per-turn drain on every participating house
pub fn apply_attrition(world: &mut WorldState, war: &CanonWarDef) {
    let p = profile(war.intensity);
    for house_id in war.side_a.iter().chain(war.side_b.iter()) {
        let Some(house) = world.house_mut(house_id) else {
            continue;
        };
        house.army.levies = ((house.army.levies as f64 * (1.0 - p.levy_loss)).floor() as i64).max(0);
        house.resources.food = ((house.resources.food as f64 * (1.0 - p.food_loss)).floor() as i64).max(0);
        house.resources.gold = (house.resources.gold - p.gold_loss).max(0);
    }
}

/// Stages a battle between `a` (side A) and `b` (side B)
pub fn fight_battle(
    world: &mut WorldState,
    rng: &mut GameRng,
    war: &CanonWarDef,
    a: &HouseId,
    b: &HouseId,
) -> Option<BattleOutcome> {
    let p = profile(war.intensity);
    let cfg = config();
    let now = world.now();
    let (seat_a, seat_b) = (world.house(a)?.seat_id.clone(), world.house(b)?.seat_id.clone());

    let chance_a = win_chance(house_power(world, a), house_power(world, b));
    let a_won = rng.chance(chance_a);
    let (winner, loser) = if a_won { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) };

    let winner_loss = rng.float(p.winner_loss.0, p.winner_loss.1);
    let loser_loss = rng.float(p.loser_loss.0, p.loser_loss.1);
    if let Some((w, l)) = world.house_pair_mut(&winner, &loser) {
        w.army.apply_loss(winner_loss);
        l.army.apply_loss(loser_loss);
    }

    let sieged = rng.chance(cfg.siege_chance);
    if sieged {
        if let Some(l) = world.house_mut(&loser) {
            l.economy.walls = (l.economy.walls - 1).max(0);
            l.resources.gold = (l.resources.gold - 10).max(0);
            l.resources.food = (l.resources.food - 25).max(0);
        }
        let loser_name = world.house_name(&loser);
        world.record(
            format!("Siege: {}", war.name),
            format!("{} is besieged after the battle. Walls and stores are worn down.", loser_name),
            &tagged(&["war", "siege", "canon"], &war.tags),
        );
    }

    let state = world.canon.war_state_mut(&war.id);
    if a_won {
        state.score_a += p.points;
    } else {
        state.score_b += p.points;
    }
    state.last_battle_turn = now;

    let location = if rng.chance(0.5) { seat_a } else { seat_b };
    let summary = format!(
        "Battle at {}: {} defeats {}.",
        world.gazetteer.location_name(&location),
        world.house_name(&winner),
        world.house_name(&loser)
    );
    world.canon.war_state_mut(&war.id).log_battle(now, summary.clone());
    world.record(
        format!("Battle: {}", war.name),
        format!(
            "{} Estimated losses: victor {:.0}%, vanquished {:.0}%.",
            summary,
            winner_loss * 100.0,
            loser_loss * 100.0
        ),
        &tagged(&["war", "battle", "canon"], &war.tags),
    );
    if a == &world.player_house_id || b == &world.player_house_id {
        world.narrate(summary.clone());
    }
    tracing::debug!(war = %war.id, winner = %winner, loser = %loser, "Battle fought");

    Some(BattleOutcome {
        winner,
        loser,
        a_won,
        winner_loss,
        loser_loss,
        sieged,
        location,
        summary,
    })
}

fn pick_house(world: &WorldState, rng: &mut GameRng, ids: &[HouseId]) -> Option<HouseId> {
    let present: Vec<&HouseId> = ids.iter().filter(|id| world.house(id).is_some()).collect();
    rng.pick(&present).map(|id| (*id).clone())
}

/// Battle cadence for one war: rolls only once the intensity's interval has passed
pub fn tick_war_battles(world: &mut WorldState, rng: &mut GameRng, war: &CanonWarDef) -> Option<BattleOutcome> {
    let p = profile(war.intensity);
    let now = world.now();
    let last = world.canon.war_state_mut(&war.id).last_battle_turn;
    if now - last < p.every {
        return None;
    }
    if !rng.chance(p.battle_chance) {
        return None;
    }
    let a = pick_house(world, rng, &war.side_a)?;
    let b = pick_house(world, rng, &war.side_b)?;
    fight_battle(world, rng, war, &a, &b)
}

/// Closes a war once: the higher score wins prestige, the other side loses it
pub fn settle_war(world: &mut WorldState, war: &CanonWarDef) -> Option<WarResult> {
    if !world.canon.mark_applied(format!("war_end:{}", war.id)) {
        return None;
    }
    let delta = config().war_settlement_prestige;
    let state = world.canon.war_state_mut(&war.id);
    let (score_a, score_b) = (state.score_a, state.score_b);
    let result = match score_a.cmp(&score_b) {
        std::cmp::Ordering::Greater => WarResult::Side(WarSide::A),
        std::cmp::Ordering::Less => WarResult::Side(WarSide::B),
        std::cmp::Ordering::Equal => WarResult::Stalemate,
    };

    if let WarResult::Side(side) = result {
        let (winners, losers) = match side {
            WarSide::A => (&war.side_a, &war.side_b),
            WarSide::B => (&war.side_b, &war.side_a),
        };
        for id in winners {
            if let Some(h) = world.house_mut(id) {
                h.adjust_prestige(delta);
            }
        }
        for id in losers {
            if let Some(h) = world.house_mut(id) {
                h.adjust_prestige(-delta);
            }
        }
    }

    let outcome = match result {
        WarResult::Stalemate => "The conflict ends without a clear victor.".to_string(),
        WarResult::Side(side) => format!("Victory for side {} (score {}-{}).", side, score_a, score_b),
    };
    world.record(
        format!("War ends: {}", war.name),
        outcome.clone(),
        &tagged(&["war", "canon", "end"], &war.tags),
    );
    world.narrate(format!("The war is over: {}. {}", war.name, outcome));
    tracing::debug!(war = %war.id, ?result, "War settled");
    Some(result)
}

/// Runs every canonical war for the current turn
///
/// Recomputes the active set, bleeds and fights the active wars, and settles
/// any war that dropped out of the active set since last turn.
pub fn resolve_canon_wars(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack) {
    let now = world.now();
    let previous = std::mem::take(&mut world.canon.active_war_ids);
    let active: Vec<&CanonWarDef> = pack.wars.iter().filter(|w| w.is_active(now)).collect();
    world.canon.active_war_ids = active.iter().map(|w| w.id.clone()).collect();

    for war in &active {
        apply_attrition(world, war);

        if world.canon.mark_applied(format!("war_announce:{}", war.id)) {
            world.narrate(format!("War in the realm: {}.", war.name));
            world.record(
                format!("War: {}", war.name),
                format!("The conflict is under way. ({})", war.tags.join(", ")),
                &tagged(&["canon", "war"], &war.tags),
            );
        }

        tick_war_battles(world, rng, war);
    }

    for id in previous {
        if world.canon.active_war_ids.contains(&id) {
            continue;
        }
        if let Some(war) = pack.war(&id) {
            settle_war(world, war);
        }
    }
}

/// The war the given house currently fights in, with its side
pub fn active_war_of<'a>(world: &WorldState, pack: &'a CanonPack, house: &HouseId) -> Option<(&'a CanonWarDef, WarSide)> {
    world
        .canon
        .active_war_ids
        .iter()
        .filter_map(|id| pack.war(id))
        .find_map(|war| war.side_of(house).map(|side| (war, side)))
}

fn tagged(base: &[&str], extra: &[String]) -> Vec<String> {
    base.iter()
        .map(|t| t.to_string())
        .chain(extra.iter().cloned())
        .collect()
}
