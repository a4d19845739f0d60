//! Self-improvement paid from the house treasury

use crate::aggregate::world::WorldState;
use crate::command::types::TrainingOption;
use crate::core::rng::GameRng;

/// Risky sparring embarrasses the house one time in ten
pub const DUEL_SCANDAL_CHANCE: f64 = 0.10;

impl TrainingOption {
    pub fn cost(self) -> i64 {
        match self {
            TrainingOption::Yard => 20,
            TrainingOption::Drill => 55,
            TrainingOption::BasicAttire => 15,
            TrainingOption::Attire => 35,
            TrainingOption::NobleAttire => 90,
            TrainingOption::Duel => 0,
        }
    }
}

pub fn train(world: &mut WorldState, rng: &mut GameRng, option: TrainingOption) -> std::result::Result<(), String> {
    if world.player().is_none() {
        return Err("No player character.".into());
    }
    let cost = option.cost();
    let house = world.player_house_mut().ok_or_else(|| "You have no house.".to_string())?;
    if house.resources.gold < cost {
        return Err(format!("Not enough gold ({} needed).", cost));
    }
    house.resources.gold -= cost;

    let message = match option {
        TrainingOption::Yard => {
            let gain = rng.int(2, 6) as i32;
            improve(world, |p| p.adjust_martial(gain));
            format!("You train hard in the yard. Martial +{}.", gain)
        }
        TrainingOption::Drill => {
            let martial = rng.int(3, 8) as i32;
            let charm = rng.int(0, 2) as i32;
            improve(world, |p| {
                p.adjust_martial(martial);
                p.charm = (p.charm + charm).clamp(0, 100);
            });
            format!("A disciplined drill with a master-at-arms. Martial +{}, charm +{}.", martial, charm)
        }
        TrainingOption::BasicAttire | TrainingOption::Attire | TrainingOption::NobleAttire => {
            let (lo, hi) = match option {
                TrainingOption::BasicAttire => (1, 3),
                TrainingOption::Attire => (3, 8),
                _ => (6, 12),
            };
            let gain = rng.int(lo, hi) as i32;
            let noble = option == TrainingOption::NobleAttire;
            improve(world, |p| {
                p.beauty = (p.beauty + gain).clamp(0, 100);
                if noble {
                    p.personal_prestige = (p.personal_prestige + 1).clamp(0, 100);
                }
            });
            if noble {
                format!("Your robes turn heads across the region. Beauty +{}, personal prestige +1.", gain)
            } else {
                format!("You dress the part. Beauty +{}.", gain)
            }
        }
        TrainingOption::Duel => {
            let gain = rng.int(4, 10) as i32;
            improve(world, |p| p.adjust_martial(gain));
            if rng.chance(DUEL_SCANDAL_CHANCE) {
                if let Some(h) = world.player_house_mut() {
                    h.adjust_prestige(-1);
                }
                format!("You win, barely, and tongues wag about your recklessness. Martial +{}, prestige -1.", gain)
            } else {
                format!("Brutal, productive sparring. Martial +{}.", gain)
            }
        }
    };
    world.narrate(message);
    Ok(())
}

fn improve(world: &mut WorldState, f: impl FnOnce(&mut crate::aggregate::character::Character)) {
    if let Some(p) = world.player_mut() {
        f(p);
    }
}
