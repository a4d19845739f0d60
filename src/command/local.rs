//! Face-to-face interactions with people at the player's location

use crate::aggregate::character::{is_parent_or_child, Character, MaritalStatus};
use crate::aggregate::systems::marriage::{is_last_of_house, Lineage};
use crate::aggregate::systems::pregnancy::begin_pregnancy;
use crate::aggregate::world::WorldState;
use crate::canon::engine::touch_character;
use crate::command::types::LocalAction;
use crate::core::rng::GameRng;
use crate::core::types::{CharacterId, Gender};

pub const KISS_THRESHOLD: i32 = 80;
pub const RELATIONS_THRESHOLD: i32 = 90;
pub const MARRY_THRESHOLD: i32 = 92;
pub const MIN_HUNT_MARTIAL: i32 = 35;
pub const MARRY_MIN_AGE: f64 = 16.0;
pub const CONCEPTION_CHANCE: f64 = 0.25;

pub fn interact(
    world: &mut WorldState,
    rng: &mut GameRng,
    target: &CharacterId,
    action: LocalAction,
) -> std::result::Result<(), String> {
    let player = world.player().ok_or_else(|| "No player character.".to_string())?;
    let other = world
        .character(target)
        .filter(|c| c.alive && c.id != player.id)
        .ok_or_else(|| "That person is not here.".to_string())?;
    if other.location_id != player.location_id {
        return Err(format!("{} is not at your location.", other.name));
    }
    check(player, other, action)?;

    match action {
        LocalAction::Kiss => kiss(world, rng, target),
        LocalAction::Relations => relations(world, rng, target),
        LocalAction::Marry { matrilineal } => marry(world, target, matrilineal),
        LocalAction::Talk | LocalAction::Drink | LocalAction::Hunt | LocalAction::Flowers => {
            socialize(world, rng, target, action)
        }
    }
    Ok(())
}

/// Preconditions, checked before anything is touched
fn check(player: &Character, other: &Character, action: LocalAction) -> std::result::Result<(), String> {
    let rel = other.relationship_to_player;
    let kissed = player.kissed_ids.contains(&other.id) || other.kissed_ids.contains(&player.id);
    match action {
        LocalAction::Flowers if other.gender == Gender::Male => Err(format!("{} has no use for flowers.", other.name)),
        LocalAction::Hunt if other.martial < MIN_HUNT_MARTIAL => Err(format!("{} is no hunter.", other.name)),
        LocalAction::Kiss | LocalAction::Relations | LocalAction::Marry { .. } if is_parent_or_child(player, other) => {
            Err("That would be unthinkable.".into())
        }
        LocalAction::Kiss if rel < KISS_THRESHOLD => Err(format!("{} is not that fond of you ({}/{}).", other.name, rel, KISS_THRESHOLD)),
        LocalAction::Relations if rel < RELATIONS_THRESHOLD || !kissed => {
            Err(format!("{} is not ready for that.", other.name))
        }
        LocalAction::Marry { .. } => {
            if player.marital_status == MaritalStatus::Married || other.marital_status == MaritalStatus::Married {
                return Err("One of you is already married.".into());
            }
            if player.age < MARRY_MIN_AGE || other.age < MARRY_MIN_AGE {
                return Err("One of you is too young to marry.".into());
            }
            if player.gender == other.gender {
                return Err("The septons will not bless that union.".into());
            }
            if rel < MARRY_THRESHOLD || !kissed {
                return Err(format!("{} does not love you enough yet.", other.name));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn socialize(world: &mut WorldState, rng: &mut GameRng, target: &CharacterId, action: LocalAction) {
    let base = match action {
        LocalAction::Talk => 4,
        LocalAction::Drink | LocalAction::Hunt => 5,
        _ => 6,
    };
    let gain = base + rng.int(-2, 2) as i32;
    let Some(c) = world.character_mut(target) else {
        return;
    };
    c.adjust_relationship(gain);
    c.known_to_player = true;
    let (name, their_house) = (c.name.clone(), c.current_house_id.clone());
    touch_character(world, target, &format!("local_{}", action.label()), 1);

    let ours = world.player_house_id.clone();
    if their_house != ours {
        if let Some(h) = world.player_house_mut() {
            h.adjust_relation(&their_house, 1);
        }
    }
    world.narrate(format!("You {} with {}. Relationship {:+}.", action.label(), name, gain));
}

fn kiss(world: &mut WorldState, rng: &mut GameRng, target: &CharacterId) {
    let player_id = world.player_id.clone();
    let gain = 2 + rng.int(-1, 2) as i32;
    if let Some(p) = world.player_mut() {
        p.kissed_ids.insert(target.clone());
    }
    if let Some(c) = world.character_mut(target) {
        c.kissed_ids.insert(player_id);
        c.adjust_relationship(gain);
    }
    touch_character(world, target, "local_kiss", 2);
    world.narrate(format!("You kiss {}. Relationship {:+}.", world.character_name(target), gain));
}

fn relations(world: &mut WorldState, rng: &mut GameRng, target: &CharacterId) {
    let gain = 1 + rng.int(-1, 2) as i32;
    if let Some(c) = world.character_mut(target) {
        c.adjust_relationship(gain);
    }
    touch_character(world, target, "local_relations", 3);
    world.narrate(format!("You spend the night with {}.", world.character_name(target)));

    let player_id = world.player_id.clone();
    let (Some(p), Some(o)) = (world.character(&player_id), world.character(target)) else {
        return;
    };
    let (mother, father) = match (p.gender, o.gender) {
        (Gender::Female, Gender::Male) => (p, o),
        (Gender::Male, Gender::Female) => (o, p),
        _ => return,
    };
    if !mother.is_fertile_female() || !father.is_adult_male() || mother.pregnancy.is_some() {
        return;
    }
    let legitimate = mother.spouse_id.as_ref() == Some(&father.id) && mother.is_married();
    let (mother, father) = (mother.id.clone(), father.id.clone());
    if rng.chance(CONCEPTION_CHANCE) {
        begin_pregnancy(world, &mother, &father, legitimate);
    }
}

fn marry(world: &mut WorldState, target: &CharacterId, matrilineal: bool) {
    let player_id = world.player_id.clone();
    let (groom, bride) = match world.player().map(|p| p.gender) {
        Some(Gender::Male) => (player_id.clone(), target.clone()),
        _ => (target.clone(), player_id.clone()),
    };
    let lineage = if matrilineal && is_last_of_house(world, &bride) {
        Lineage::Matrilineal
    } else {
        Lineage::Patrilineal
    };
    let (Some(groom_house), Some(bride_house)) = (
        world.character(&groom).map(|c| c.current_house_id.clone()),
        world.character(&bride).map(|c| c.current_house_id.clone()),
    ) else {
        return;
    };

    world.link_spouses(&groom, &bride);
    let couple_house = match lineage {
        Lineage::Patrilineal => groom_house.clone(),
        Lineage::Matrilineal => bride_house.clone(),
    };
    let mover = if lineage == Lineage::Patrilineal { &bride } else { &groom };
    if let Some(c) = world.character_mut(mover) {
        c.current_house_id = couple_house.clone();
    }
    if let Some(p) = world.player() {
        let house = p.current_house_id.clone();
        world.player_house_id = house;
    }
    if groom_house != bride_house {
        world.adjust_relations(&groom_house, &bride_house, 6, 4);
    }
    touch_character(world, &groom, "marriage", 5);
    touch_character(world, &bride, "marriage", 5);

    let (g, b) = (world.character_name(&groom), world.character_name(&bride));
    let house_name = world.house_name(&couple_house);
    let tags = vec!["marriage".to_string(), groom_house.to_string(), bride_house.to_string()];
    world.record(
        "Marriage",
        format!("{} weds {}. The couple belongs to {}.", g, b, house_name),
        tags.as_slice(),
    );
    tracing::info!(groom = %groom, bride = %bride, ?lineage, "Player marriage");
    world.narrate(format!("{} and {} are wed before the gods.", g, b));
}
