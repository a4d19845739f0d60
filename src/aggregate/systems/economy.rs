//! House economy and the house AI
//!
//! One pass per house, in world order: growth, food, goods, gold and trade,
//! tribute to the suzerain, famine, then the AI spending decision. The AI
//! runs for every house except the player's once the player leads it.

use crate::aggregate::house::House;
use crate::aggregate::world::WorldState;
use crate::core::config::config;
use crate::core::rng::GameRng;
use crate::core::types::HouseId;

/// Spending thresholds and odds for one economic tier
#[derive(Debug, Clone, Copy)]
pub struct TierPolicy {
    pub food_buffer: i64,
    pub desired_mass: i64,
    pub delegation_chance: f64,
    pub farm_chance: f64,
    pub recruit_chance: f64,
    pub train_chance: f64,
}

pub fn tier_policy(tier_gold: i64) -> TierPolicy {
    match tier_gold {
        700 => TierPolicy {
            food_buffer: 320,
            desired_mass: 320,
            delegation_chance: 0.90,
            farm_chance: 0.78,
            recruit_chance: 0.66,
            train_chance: 0.28,
        },
        500 => TierPolicy {
            food_buffer: 240,
            desired_mass: 250,
            delegation_chance: 0.90,
            farm_chance: 0.78,
            recruit_chance: 0.66,
            train_chance: 0.22,
        },
        350 => TierPolicy {
            food_buffer: 170,
            desired_mass: 190,
            delegation_chance: 0.82,
            farm_chance: 0.70,
            recruit_chance: 0.60,
            train_chance: 0.18,
        },
        _ => TierPolicy {
            food_buffer: 120,
            desired_mass: 150,
            delegation_chance: 0.75,
            farm_chance: 0.62,
            recruit_chance: 0.54,
            train_chance: 0.14,
        },
    }
}

/// Food production of a house this turn
pub fn food_production(house: &House) -> i64 {
    let cfg = config();
    (house.economy.peasants as f64 * cfg.food_per_peasant + house.economy.farms as f64 * cfg.food_per_farm)
        .round() as i64
}

/// Starvation losses when food went negative
///
/// Returns (peasants lost, levies lost), or `None` when there is no deficit.
pub fn apply_famine(house: &mut House) -> Option<(i64, i64)> {
    if house.resources.food >= 0 {
        return None;
    }
    let cfg = config();
    let deficit = house.resources.food.abs() as f64;
    house.resources.food = 0;

    let lost_peasants = house.economy.peasants.min((deficit / cfg.famine_peasant_divisor).ceil() as i64);
    house.economy.peasants -= lost_peasants;
    let lost_levies = house.army.levies.min((deficit / cfg.famine_levy_divisor).ceil() as i64);
    house.army.levies -= lost_levies;
    house.adjust_prestige(-cfg.famine_prestige_loss);
    Some((lost_peasants, lost_levies))
}

/// Runs the economy for every house
pub fn tick_economy(world: &mut WorldState, rng: &mut GameRng) {
    let cfg = config();
    let now = world.now();
    let player_leads = world.player_is_leader();

    for i in 0..world.houses.len() {
        let house = &mut world.houses[i];
        let econ = &mut house.economy;

        // 1. Growth
        let growth = ((econ.peasants as f64 * 0.001) + rng.int(-2, 4) as f64).floor() as i64;
        econ.peasants = (econ.peasants + growth.max(0)).max(0);
        if rng.chance(0.05) {
            econ.soldiers += 1;
        }

        // 2. Food and goods
        let production = food_production(house);
        let need = house.food_need();
        house.resources.food += production - need;
        let goods_produced = (production / 3).max(0);
        house.resources.goods += goods_produced;

        // 3. Gold and trade
        let econ = &mut house.economy;
        let base_gold = ((econ.peasants + econ.soldiers) as f64 * cfg.gold_per_head).round() as i64;
        let partners = econ.trade_partners.clone();
        let since_delegation = now - econ.last_delegation_turn;
        let mut trade_gold = 0;
        if !partners.is_empty() {
            if since_delegation <= cfg.trade_window {
                trade_gold = cfg.trade_base_bonus + partners.len() as i64 * cfg.trade_partner_bonus;
            } else {
                for partner in &partners {
                    house.adjust_relation(partner, -1);
                }
            }
        }
        house.resources.gold += base_gold + trade_gold;

        // 4. Tribute
        house.normalize_tax();
        let tax_rate = house.economy.tax_rate;
        let house_id = house.id.clone();
        if let Some(suzerain_id) = house.suzerain_id.clone() {
            pay_tribute(world, &house_id, &suzerain_id, goods_produced, tax_rate);
        }

        // 5. Famine
        let house = &mut world.houses[i];
        if let Some((peasants, levies)) = apply_famine(house) {
            if house_id == world.player_house_id {
                world.narrate(format!(
                    "Famine in your lands: {} peasants and {} levies lost. Prestige -{}.",
                    peasants, levies, cfg.famine_prestige_loss
                ));
            }
        }

        // 6. AI
        if house_id != world.player_house_id || !player_leads {
            tick_house_ai(world, rng, i);
        }
    }
}

fn pay_tribute(
    world: &mut WorldState,
    vassal_id: &HouseId,
    suzerain_id: &HouseId,
    goods_produced: i64,
    tax_rate: f64,
) {
    let due = (goods_produced as f64 * tax_rate).floor() as i64;
    if due <= 0 {
        return;
    }
    let Some((vassal, suzerain)) = world.house_pair_mut(vassal_id, suzerain_id) else {
        return;
    };
    let paid = vassal.resources.goods.min(due).max(0);
    vassal.resources.goods -= paid;
    suzerain.resources.goods += paid;
    let delta = if paid >= due { 1 } else { -2 };
    vassal.adjust_relation(suzerain_id, delta);
    suzerain.adjust_relation(vassal_id, delta);
    let suzerain_name = suzerain.name.clone();

    if vassal_id == &world.player_house_id {
        world.narrate(format!(
            "Tribute to {}: {} due, {} paid (rate {:.0}%).",
            suzerain_name,
            due,
            paid,
            tax_rate * 100.0
        ));
    }
}

/// One spending decision for the house at `index`
///
/// Delegations are independent; after that the house builds a farm, recruits
/// or trains, at most one of the three per turn.
pub fn tick_house_ai(world: &mut WorldState, rng: &mut GameRng, index: usize) {
    let now = world.now();
    let cfg = config();
    let house = &mut world.houses[index];
    let reserve = house.tier_gold();
    let policy = tier_policy(reserve);

    let partners = house.economy.trade_partners.clone();
    if !partners.is_empty()
        && now - house.economy.last_delegation_turn >= cfg.trade_window
        && house.resources.gold - 30 >= reserve
        && rng.chance(policy.delegation_chance)
    {
        house.resources.gold -= 30;
        house.economy.last_delegation_turn = now;
        let id = house.id.clone();
        for partner in &partners {
            world.adjust_relations(&id, partner, 1, 1);
        }
    }

    let house = &mut world.houses[index];
    let need = house.food_need();
    if house.resources.food < need + policy.food_buffer
        && house.resources.gold - 120 >= reserve
        && rng.chance(policy.farm_chance)
    {
        house.resources.gold -= 120;
        house.economy.farms += 1;
        house.economy.peasants += 35;
        house.adjust_prestige(1);
        return;
    }

    if house.army.mass() < policy.desired_mass
        && house.resources.gold - 60 >= reserve
        && rng.chance(policy.recruit_chance)
    {
        house.resources.gold -= 60;
        house.army.levies += 50;
        house.economy.soldiers += 15;
        return;
    }

    if house.resources.gold - 90 >= reserve && rng.chance(policy.train_chance) {
        house.resources.gold -= 90;
        let army = &mut house.army;
        let to_men = army.levies.min(rng.int(8, 18));
        army.levies -= to_men;
        army.men_at_arms += to_men;
        let to_squires = army.men_at_arms.min(rng.int(4, 10));
        army.men_at_arms -= to_squires;
        army.squires += to_squires;
        let to_knights = army.squires.min(rng.int(1, 3));
        army.squires -= to_knights;
        army.knights += to_knights;
    }
}
