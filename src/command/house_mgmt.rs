//! Decisions only the head of the house may take

use crate::aggregate::systems::warfare::active_war_of;
use crate::aggregate::world::WorldState;
use crate::canon::defs::WarSide;
use crate::canon::CanonPack;
use crate::command::types::HouseAction;
use crate::core::rng::GameRng;

pub const FARM_COST: i64 = 120;
pub const RECRUIT_COST: i64 = 60;
pub const TRAIN_COST: i64 = 90;
pub const DELEGATION_COST: i64 = 30;
pub const WAR_AID_GOODS: i64 = 40;
pub const WAR_AID_LEVIES: i64 = 80;
pub const MAX_TRAINING_GROUNDS: i64 = 3;

pub fn manage(
    world: &mut WorldState,
    rng: &mut GameRng,
    pack: &CanonPack,
    action: HouseAction,
) -> std::result::Result<(), String> {
    if !world.player_is_leader() {
        return Err("You are not yet the head of your house.".into());
    }
    match action {
        HouseAction::Farm => farm(world),
        HouseAction::Recruit => recruit(world),
        HouseAction::Train => train_troops(world, rng),
        HouseAction::Delegation => delegation(world),
        HouseAction::WarAid => war_aid(world, pack),
    }
}

fn pay(world: &mut WorldState, cost: i64) -> std::result::Result<(), String> {
    let house = world.player_house_mut().ok_or_else(|| "You have no house.".to_string())?;
    if house.resources.gold < cost {
        return Err(format!("The treasury cannot spare {} gold.", cost));
    }
    house.resources.gold -= cost;
    Ok(())
}

fn farm(world: &mut WorldState) -> std::result::Result<(), String> {
    pay(world, FARM_COST)?;
    if let Some(h) = world.player_house_mut() {
        h.economy.farms += 1;
        h.economy.peasants += 40;
        h.adjust_prestige(1);
    }
    world.narrate("New fields are cleared and sown. Farms +1, peasants +40, prestige +1.");
    Ok(())
}

fn recruit(world: &mut WorldState) -> std::result::Result<(), String> {
    pay(world, RECRUIT_COST)?;
    if let Some(h) = world.player_house_mut() {
        h.army.levies += 50;
        h.economy.soldiers += 20;
    }
    world.narrate("The banners are called. Levies +50.");
    Ok(())
}

fn train_troops(world: &mut WorldState, rng: &mut GameRng) -> std::result::Result<(), String> {
    pay(world, TRAIN_COST)?;
    let (to_men, to_squires, to_knights) = (rng.int(12, 22), rng.int(6, 14), rng.int(1, 4));
    let new_ground = rng.chance(0.25);
    let Some(h) = world.player_house_mut() else {
        return Ok(());
    };
    let army = &mut h.army;

    // 1. Levies become men-at-arms
    let moved = to_men.min(army.levies);
    army.levies -= moved;
    army.men_at_arms += moved;

    // 2. Men-at-arms become squires
    let promoted = to_squires.min(army.men_at_arms);
    army.men_at_arms -= promoted;
    army.squires += promoted;

    // 3. Squires are knighted
    let knighted = to_knights.min(army.squires);
    army.squires -= knighted;
    army.knights += knighted;

    let ground = new_ground && h.economy.training_grounds < MAX_TRAINING_GROUNDS;
    if ground {
        h.economy.training_grounds += 1;
    }
    world.narrate(format!(
        "Drills in the yard: {} men-at-arms, {} squires and {} knights raised{}.",
        moved,
        promoted,
        knighted,
        if ground { ", and a new training ground" } else { "" }
    ));
    Ok(())
}

fn delegation(world: &mut WorldState) -> std::result::Result<(), String> {
    pay(world, DELEGATION_COST)?;
    let now = world.now();
    let ours = world.player_house_id.clone();
    let partners = match world.player_house_mut() {
        Some(h) => {
            h.economy.last_delegation_turn = now;
            h.economy.trade_partners.clone()
        }
        None => Vec::new(),
    };
    for partner in &partners {
        world.adjust_relations(&ours, partner, 1, 1);
    }
    world.narrate(format!(
        "A trade delegation sets out. Income improves for a few turns; relations with {} partners +1.",
        partners.len()
    ));
    Ok(())
}

fn war_aid(world: &mut WorldState, pack: &CanonPack) -> std::result::Result<(), String> {
    let ours = world.player_house_id.clone();
    let (war_id, war_name, side) = active_war_of(world, pack, &ours)
        .map(|(war, side)| (war.id.clone(), war.name.clone(), side))
        .ok_or_else(|| "Your house is not at war.".to_string())?;
    let house = world.player_house_mut().ok_or_else(|| "You have no house.".to_string())?;
    if house.resources.goods < WAR_AID_GOODS || house.army.levies < WAR_AID_LEVIES {
        return Err(format!("War aid needs {} goods and {} levies.", WAR_AID_GOODS, WAR_AID_LEVIES));
    }
    house.resources.goods -= WAR_AID_GOODS;
    house.army.levies -= WAR_AID_LEVIES;

    let state = world.canon.war_state_mut(&war_id);
    match side {
        WarSide::A => state.score_a += 1,
        WarSide::B => state.score_b += 1,
    }
    let house_name = world.house_name(&ours);
    world.record(
        "War aid",
        format!("{} sends men and supplies to the front of {}.", house_name, war_name),
        &["war", "aid"],
    );
    world.narrate(format!("Your aid reaches the front. Side {} gains ground in {}.", side, war_name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::character::Character;
    use crate::aggregate::house::House;
    use crate::core::types::{CharacterId, Gender, HouseId, LocationId, RegionId};
    use crate::data::gazetteer::Gazetteer;

    fn world(leader: bool) -> WorldState {
        let mut world = WorldState::new(Gazetteer::default());
        let mut house = House::new(HouseId::new("h"), "House H", RegionId::new("r"), LocationId::new("s"), 50);
        house.resources.gold = 500;
        house.army.levies = 100;
        world.add_house(house);
        world.add_character(Character::new(CharacterId::new("p"), "Player", Gender::Male, 30.0, HouseId::new("h"), LocationId::new("s")));
        world.player_id = CharacterId::new("p");
        world.player_house_id = HouseId::new("h");
        if leader {
            world.set_leader(&HouseId::new("h"), &CharacterId::new("p"));
        }
        world
    }

    #[test]
    fn test_only_leader_manages() {
        let mut world = world(false);
        let mut rng = GameRng::new(1);
        let result = manage(&mut world, &mut rng, &CanonPack::default(), HouseAction::Farm);
        assert!(result.is_err());
        assert_eq!(world.player_house().unwrap().resources.gold, 500);
    }

    #[test]
    fn test_farm_and_recruit() {
        let mut world = world(true);
        let mut rng = GameRng::new(1);
        let pack = CanonPack::default();
        manage(&mut world, &mut rng, &pack, HouseAction::Farm).unwrap();
        manage(&mut world, &mut rng, &pack, HouseAction::Recruit).unwrap();
        let h = world.player_house().unwrap();
        assert_eq!(h.resources.gold, 500 - FARM_COST - RECRUIT_COST);
        assert_eq!(h.economy.farms, 1);
        assert_eq!(h.army.levies, 150);
        assert_eq!(h.prestige, 51);
    }

    #[test]
    fn test_training_conserves_troops() {
        let mut world = world(true);
        let mut rng = GameRng::new(2);
        manage(&mut world, &mut rng, &CanonPack::default(), HouseAction::Train).unwrap();
        let a = &world.player_house().unwrap().army;
        assert_eq!(a.levies + a.men_at_arms + a.squires + a.knights, 100);
        assert!(a.men_at_arms > 0 && a.levies < 100);
    }

    #[test]
    fn test_war_aid_needs_a_war() {
        let mut world = world(true);
        let mut rng = GameRng::new(2);
        world.player_house_mut().unwrap().resources.goods = 100;
        assert!(manage(&mut world, &mut rng, &CanonPack::default(), HouseAction::WarAid).is_err());
        assert_eq!(world.player_house().unwrap().resources.goods, 100);
    }
}
