//! Canon reconciliation
//!
//! Folds the scripted history of a [`CanonPack`] into the live world. People
//! are materialized when their birth comes due, deaths and successions are
//! forced unless the player has pulled the character off their recorded path,
//! and every scripted effect is gated by an applied-event key so it runs once.

use crate::aggregate::character::{CanonLink, Character};
use crate::aggregate::systems::tournaments::{self, TournamentReason, TournamentSize};
use crate::aggregate::systems::{lifecycle, warfare};
use crate::aggregate::world::WorldState;
use crate::canon::defs::{CanonEventDef, CanonEventKind, CanonPack, CanonPersonDef};
use crate::canon::state::{CanonMode, PendingBirth};
use crate::core::calendar::{abs_turn, AbsTurn, DEFAULT_TURN, TURNS_PER_YEAR};
use crate::core::config::config;
use crate::core::rng::GameRng;
use crate::core::types::{CanonId, CharacterId, LocationId, TournamentId};

/// Live id of a canonical person
pub fn canon_character_id(id: &CanonId) -> CharacterId {
    CharacterId::new(format!("canon_{}", id))
}

/// Resolves an uncertain year range to one absolute turn, once per key
fn resolve_turn(world: &mut WorldState, rng: &mut GameRng, key: String, min: i32, max: i32, turn: u8) -> AbsTurn {
    if let Some(&resolved) = world.canon.resolved_turns.get(&key) {
        return resolved;
    }
    let year = if min >= max {
        min
    } else {
        match world.canon.mode {
            CanonMode::Strict => min + (max - min) / 2,
            CanonMode::Anchors => rng.int(min as i64, max as i64) as i32,
        }
    };
    let abs = abs_turn(year, turn);
    world.canon.resolved_turns.insert(key, abs);
    abs
}

pub fn birth_turn(world: &mut WorldState, rng: &mut GameRng, def: &CanonPersonDef) -> Option<AbsTurn> {
    let turn = def.birth_turn.unwrap_or(DEFAULT_TURN);
    if let Some(year) = def.birth_year {
        return Some(abs_turn(year, turn));
    }
    match (def.birth_year_min, def.birth_year_max) {
        (Some(min), Some(max)) => Some(resolve_turn(world, rng, format!("birth:{}", def.canon_id), min, max, turn)),
        _ => None,
    }
}

pub fn death_turn(world: &mut WorldState, rng: &mut GameRng, def: &CanonPersonDef) -> Option<AbsTurn> {
    let turn = def.death_turn.unwrap_or(DEFAULT_TURN);
    if let Some(year) = def.death_year {
        return Some(abs_turn(year, turn));
    }
    match (def.death_year_min, def.death_year_max) {
        (Some(min), Some(max)) => Some(resolve_turn(world, rng, format!("death:{}", def.canon_id), min, max, turn)),
        _ => None,
    }
}

/// Whether the recorded parents can produce this child today
pub fn can_apply_birth_now(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack, def: &CanonPersonDef) -> bool {
    let (father, mother) = match (&def.father_canon_id, &def.mother_canon_id) {
        (None, None) => return true,
        (Some(f), Some(m)) => (f, m),
        _ => return false,
    };
    let (Some(father), Some(mother)) = (
        ensure_person(world, rng, pack, father),
        ensure_person(world, rng, pack, mother),
    ) else {
        return false;
    };
    let (Some(f), Some(m)) = (world.character(&father), world.character(&mother)) else {
        return false;
    };
    if !f.alive || !m.alive {
        return false;
    }
    if f.is_married() && f.spouse_id.as_ref() != Some(&mother) {
        return false;
    }
    if m.is_married() && m.spouse_id.as_ref() != Some(&father) {
        return false;
    }
    true
}

/// Returns the live character for a canonical person, creating it if due
///
/// Nothing is created before the resolved birth turn, nor while both
/// recorded parents exist but cannot have the child. A recorded spouse is
/// linked only when both are free and neither has diverged.
pub fn ensure_person(
    world: &mut WorldState,
    rng: &mut GameRng,
    pack: &CanonPack,
    canon_id: &CanonId,
) -> Option<CharacterId> {
    let def = pack.person(canon_id)?;
    let id = canon_character_id(canon_id);
    if world.character(&id).is_some() {
        return Some(id);
    }

    let now = world.now();
    let birth = birth_turn(world, rng, def);
    if birth.map_or(false, |b| now < b) {
        return None;
    }
    if def.father_canon_id.is_some() && def.mother_canon_id.is_some() && !can_apply_birth_now(world, rng, pack, def) {
        return None;
    }
    // A parent lookup may have materialized this person through a spouse link
    if world.character(&id).is_some() {
        return Some(id);
    }
    let death = death_turn(world, rng, def);

    let age = birth.map_or(18.0, |b| ((now - b) / TURNS_PER_YEAR as AbsTurn).max(0) as f64);
    let royal = def.title.as_deref().map_or(false, |t| t.contains("King"));
    let bonus = |extra: i64| if royal { extra } else { 0 };
    let location = def
        .location_id
        .clone()
        .or_else(|| world.house(&def.current_house_id).map(|h| h.seat_id.clone()))
        .or_else(|| world.gazetteer.locations.first().map(|l| l.id.clone()))
        .unwrap_or_else(|| LocationId::new("unknown"));

    let mut c = Character::new(id.clone(), def.name.clone(), def.gender, age, def.birth_house().clone(), location);
    c.current_house_id = def.current_house_id.clone();
    c.keeps_birth_name = def.birth_house_id.is_some();
    c.martial = (rng.int(35, 70) + bonus(8)).clamp(0, 100) as i32;
    c.charm = (rng.int(30, 70) + bonus(6)).clamp(0, 100) as i32;
    c.beauty = rng.int(25, 70) as i32;
    c.likability = rng.int(30, 75) as i32;
    c.personal_prestige = (rng.int(35, 75) + bonus(18)).clamp(0, 100) as i32;
    c.refresh_renown();
    c.fertile = !rng.chance(0.03);
    c.personal_gold = rng.int(40, 120);
    c.known_to_player = true;
    c.relationship_to_player = 25;
    c.title = def.title.clone();
    c.father_id = def.father_canon_id.as_ref().map(canon_character_id);
    c.mother_id = def.mother_canon_id.as_ref().map(canon_character_id);
    c.canon = Some(CanonLink {
        canon_id: canon_id.clone(),
        birth_turn: birth,
        death_turn: death,
    });
    world.add_character(c);
    tracing::debug!(character = %id, age, "Canonical person materialized");

    if let Some(spouse_canon) = &def.spouse_canon_id {
        if let Some(spouse) = ensure_person(world, rng, pack, spouse_canon) {
            link_recorded_spouses(world, &id, &spouse);
        }
    }
    Some(id)
}

fn link_recorded_spouses(world: &mut WorldState, a: &CharacterId, b: &CharacterId) {
    let (Some(ca), Some(cb)) = (world.character(a), world.character(b)) else {
        return;
    };
    if !ca.alive || !cb.alive {
        return;
    }
    if (ca.is_married() && ca.spouse_id.as_ref() != Some(b)) || (cb.is_married() && cb.spouse_id.as_ref() != Some(a)) {
        return;
    }
    let diverged = [ca, cb]
        .iter()
        .filter_map(|c| c.canon_id())
        .any(|cid| world.canon.is_diverged(cid));
    if diverged {
        return;
    }
    world.link_spouses(a, b);
}

/// Adds player interference to a canonical character's score
///
/// Returns the new score, or `None` for characters outside the canon.
pub fn touch_character(world: &mut WorldState, id: &CharacterId, reason: &str, weight: u32) -> Option<u32> {
    let canon_id = world.character(id)?.canon_id()?.clone();
    let score = world.canon.touch(&canon_id, reason, weight);
    tracing::debug!(character = %id, reason, score, "Canonical character touched");
    Some(score)
}

/// Forces a recorded death
///
/// A diverged character survives: the bypass flag is set and the averted
/// fate narrated unless `silent`. Returns whether the character died.
pub fn kill_canonical(
    world: &mut WorldState,
    rng: &mut GameRng,
    pack: &CanonPack,
    canon_id: &CanonId,
    reason: &str,
    silent: bool,
) -> bool {
    let Some(id) = ensure_person(world, rng, pack, canon_id) else {
        return false;
    };
    let Some(name) = world.character(&id).filter(|c| c.alive).map(|c| c.name.clone()) else {
        return false;
    };
    if world.canon.is_diverged(canon_id) {
        world.canon.mark_death_bypassed(canon_id);
        tracing::debug!(character = %id, "Canonical death bypassed");
        if !silent {
            world.narrate(format!("Fate diverges: {} does not die as recorded ({}).", name, reason));
        }
        return false;
    }
    lifecycle::resolve_death(world, &id, reason)
}

fn queue_pending_birth(world: &mut WorldState, def: &CanonPersonDef, desired: AbsTurn) {
    if world.canon.has_pending_birth(&def.canon_id) {
        return;
    }
    tracing::debug!(person = %def.canon_id, desired, "Canonical birth postponed");
    let now = world.now();
    world.canon.pending_births.push(PendingBirth {
        canon_id: def.canon_id.clone(),
        desired_turn: desired,
        expires_turn: desired + config().pending_birth_window,
        reason: "parents unavailable".into(),
        last_attempt_turn: Some(now),
    });
}

/// Resets a birth that came after its recorded turn and chronicles the drift
fn note_late_birth(world: &mut WorldState, id: &CharacterId) {
    let Some(c) = world.character_mut(id) else {
        return;
    };
    c.age = 0.0;
    let name = c.name.clone();
    world.narrate(format!("{} is born later than the chronicles record.", name));
    world.record(
        format!("Late birth: {}", name),
        format!("{} is born away from the recorded turn, the world having changed.", name),
        &["canon", "birth", "divergence"],
    );
}

/// Materializes a due birth, or queues it when the parents cannot oblige
pub fn try_apply_or_queue_birth(
    world: &mut WorldState,
    rng: &mut GameRng,
    pack: &CanonPack,
    def: &CanonPersonDef,
    desired: AbsTurn,
) {
    if world.character(&canon_character_id(&def.canon_id)).is_some() {
        return;
    }
    if !can_apply_birth_now(world, rng, pack, def) {
        queue_pending_birth(world, def, desired);
        return;
    }
    let Some(id) = ensure_person(world, rng, pack, &def.canon_id) else {
        return;
    };
    if world.now() > desired {
        note_late_birth(world, &id);
    }
}

/// Retries postponed births and drops the ones whose window has closed
pub fn process_pending_births(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack) {
    let now = world.now();
    let pending = std::mem::take(&mut world.canon.pending_births);
    let mut keep = Vec::with_capacity(pending.len());

    for mut entry in pending {
        let Some(def) = pack.person(&entry.canon_id) else {
            tracing::warn!(person = %entry.canon_id, "Pending birth names an unknown person");
            continue;
        };
        if world.character(&canon_character_id(&def.canon_id)).is_some() {
            continue;
        }
        if now >= entry.expires_turn {
            world.record(
                format!("Lost birth: {}", def.name),
                "The recorded birth did not happen within the window the changed world allowed.",
                &["canon", "birth", "divergence"],
            );
            continue;
        }
        if now < entry.desired_turn || entry.last_attempt_turn == Some(now) {
            keep.push(entry);
            continue;
        }
        entry.last_attempt_turn = Some(now);
        if can_apply_birth_now(world, rng, pack, def) {
            if let Some(id) = ensure_person(world, rng, pack, &def.canon_id) {
                note_late_birth(world, &id);
                continue;
            }
        }
        keep.push(entry);
    }

    keep.append(&mut world.canon.pending_births);
    world.canon.pending_births = keep;
}

fn divergent_tags(event: &CanonEventDef) -> Vec<String> {
    let mut tags = event.tags.clone();
    if !tags.iter().any(|t| t == "divergence") {
        tags.push("divergence".into());
    }
    tags
}

/// Applies one scripted event, at most once
pub fn apply_event(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack, event: &CanonEventDef) {
    if !world.canon.enabled || !world.canon.mark_applied(event.id.clone()) {
        return;
    }
    tracing::debug!(event = %event.id, kind = ?event.kind, "Applying canon event");

    match event.kind {
        CanonEventKind::Chronicle => {
            world.record(event.title.clone(), event.body.clone(), event.tags.as_slice());
            world.narrate(format!("{}: {}", event.title, event.body));
        }

        CanonEventKind::Birth => {
            let Some(person) = &event.person_canon_id else {
                return;
            };
            match pack.person(person) {
                Some(def) => try_apply_or_queue_birth(world, rng, pack, def, event.abs_turn()),
                None => tracing::warn!(event = %event.id, person = %person, "Birth event names an unknown person"),
            }
            let born = world
                .character(&canon_character_id(person))
                .filter(|c| c.alive && c.age < 1.0)
                .map(|c| c.name.clone());
            match born {
                Some(name) => {
                    world.record(event.title.clone(), event.body.clone(), event.tags.as_slice());
                    world.narrate(format!("{}: {}.", event.title, name));
                }
                None => {
                    world.record(
                        format!("{} (postponed)", event.title),
                        "The conditions for this birth do not exist now. Fate tries to adjust.",
                        divergent_tags(event).as_slice(),
                    );
                }
            }
        }

        CanonEventKind::Death => {
            let Some(person) = &event.person_canon_id else {
                return;
            };
            // The people pass may already have carried out this death
            let already_dead = world
                .character(&canon_character_id(person))
                .map_or(false, |c| !c.alive);
            if already_dead || kill_canonical(world, rng, pack, person, &event.body, false) {
                world.record(event.title.clone(), event.body.clone(), event.tags.as_slice());
            } else {
                world.record(
                    format!("{} (divergent fate)", event.title),
                    format!("The record says {}, but the changed world prevents it for now.", event.body),
                    divergent_tags(event).as_slice(),
                );
            }
        }

        CanonEventKind::Succession | CanonEventKind::DynastyShift => {
            let (Some(house_id), Some(leader_canon)) = (&event.house_id, &event.new_leader_canon_id) else {
                return;
            };
            if world.house(house_id).is_none() {
                tracing::warn!(event = %event.id, house = %house_id, "Canon event names an unknown house");
                return;
            }
            match ensure_person(world, rng, pack, leader_canon) {
                Some(_) if world.canon.is_diverged(leader_canon) => {
                    world.record(
                        format!("{} (open)", event.title),
                        "The recorded succession is not imposed: the heir's fate has diverged.",
                        divergent_tags(event).as_slice(),
                    );
                    world.narrate(format!("Open succession: {}.", event.title));
                    return;
                }
                Some(leader) => world.set_leader(house_id, &leader),
                None if event.kind == CanonEventKind::Succession => return,
                None => {}
            }
            if event.kind == CanonEventKind::DynastyShift {
                if let (Some(name), Some(house)) = (&event.new_house_name, world.house_mut(house_id)) {
                    house.name = name.clone();
                }
            }
            world.record(event.title.clone(), event.body.clone(), event.tags.as_slice());
            world.narrate(format!("{}: {}", event.title, event.body));
        }

        CanonEventKind::Tournament => {
            let Some(spec) = &event.tournament else {
                return;
            };
            let id = TournamentId::new(format!(
                "canon_tourney_{}_{}_{}",
                event.year,
                event.turn.unwrap_or(DEFAULT_TURN),
                spec.location_id
            ));
            tournaments::announce_tournament(
                world,
                id,
                &spec.host_house_id,
                &spec.location_id,
                TournamentSize::Important,
                TournamentReason::Other,
                true,
            );
            world.record(event.title.clone(), event.body.clone(), event.tags.as_slice());
        }
    }
}

fn has_explicit(pack: &CanonPack, now: AbsTurn, kind: CanonEventKind, person: &CanonId) -> bool {
    pack.events_at(now)
        .any(|e| e.kind == kind && e.person_canon_id.as_ref() == Some(person))
}

/// Births and deaths that come due from the people list alone
pub fn apply_auto_people(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack) {
    let now = world.now();
    let anchors = world.canon.mode == CanonMode::Anchors;

    for def in &pack.people {
        if anchors && !pack.is_anchor_person(def) {
            continue;
        }

        if birth_turn(world, rng, def) == Some(now) && world.canon.mark_applied(format!("auto_birth:{}", def.canon_id)) {
            try_apply_or_queue_birth(world, rng, pack, def, now);
            if !has_explicit(pack, now, CanonEventKind::Birth, &def.canon_id) {
                let born = world
                    .character(&canon_character_id(&def.canon_id))
                    .map(|c| (c.name.clone(), c.age < 1.0));
                if let Some((name, newborn)) = born {
                    world.record(
                        format!("Canonical birth: {}", name),
                        format!("{} is born, as the chronicles record.", name),
                        &["canon", "birth"],
                    );
                    if newborn {
                        world.narrate(format!("{} is born.", name));
                    }
                }
            }
        }

        if death_turn(world, rng, def) == Some(now) && world.canon.mark_applied(format!("auto_death:{}", def.canon_id)) {
            let explicit = has_explicit(pack, now, CanonEventKind::Death, &def.canon_id);
            let killed = kill_canonical(world, rng, pack, &def.canon_id, "as the chronicles record", explicit);
            if !killed && !explicit && world.canon.death_bypassed.contains(&def.canon_id) {
                world.record(
                    format!("Canonical death averted: {}", def.name),
                    "The record marks a death here, but the player's deeds have changed this fate.",
                    &["canon", "death", "divergence"],
                );
            }
        }
    }
}

/// Keeps houses under the leaders the record assigns them
pub fn apply_leader_mandates(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack) {
    let now = world.now();
    for mandate in pack.mandates.iter().filter(|m| m.is_active(now)) {
        let Some(current) = world.house(&mandate.house_id).map(|h| h.leader_id.clone()) else {
            continue;
        };
        let Some(leader) = ensure_person(world, rng, pack, &mandate.leader_canon_id) else {
            continue;
        };
        let alive = world.character(&leader).map_or(false, |c| c.alive);
        if !alive || world.canon.is_diverged(&mandate.leader_canon_id) {
            continue;
        }
        let changed = current.as_ref() != Some(&leader);
        world.set_leader(&mandate.house_id, &leader);

        if changed && world.canon.mark_applied(format!("mandate:{}", mandate.id)) {
            let house = world.house_name(&mandate.house_id);
            let name = world.character_name(&leader);
            world.record(
                format!("Canonical leadership: {}", house),
                format!("{} is recognized as leader of {}.", name, house),
                &["canon", "leaders"],
            );
            world.narrate(format!("{} takes the lead of {}.", name, house));
        }
    }
}

/// The per-turn canon pass
pub fn apply_turn(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack) {
    if !world.canon.enabled {
        return;
    }
    // 1. Postponed births
    process_pending_births(world, rng, pack);

    // 2. Births and deaths from the people list
    apply_auto_people(world, rng, pack);

    // 3. Leadership and wars
    apply_leader_mandates(world, rng, pack);
    warfare::resolve_canon_wars(world, rng, pack);

    // 4. Dated events
    let now = world.now();
    let anchors = world.canon.mode == CanonMode::Anchors;
    for event in pack.events_at(now) {
        if anchors && !pack.is_anchor_event(event) {
            continue;
        }
        apply_event(world, rng, pack, event);
    }
}

/// Seeds the canon into a freshly built world
pub fn bootstrap(world: &mut WorldState, rng: &mut GameRng, pack: &CanonPack) {
    if !world.canon.enabled {
        return;
    }
    let now = world.now();
    for def in &pack.people {
        if birth_turn(world, rng, def).map_or(false, |b| b > now) {
            continue;
        }
        if death_turn(world, rng, def).map_or(false, |d| d <= now) {
            continue;
        }
        ensure_person(world, rng, pack, &def.canon_id);
    }

    if let Some(crown_leader) = &pack.initial_crown_leader {
        let crown = world.houses.iter().find(|h| h.is_crown).map(|h| h.id.clone());
        if let (Some(house), Some(leader)) = (crown, ensure_person(world, rng, pack, crown_leader)) {
            world.set_leader(&house, &leader);
        }
    }

    apply_turn(world, rng, pack);
    tracing::info!(
        people = world.characters.iter().filter(|c| c.canon.is_some()).count(),
        "Canon bootstrapped"
    );
}

pub fn set_enabled(world: &mut WorldState, enabled: bool) {
    world.canon.enabled = enabled;
    world.narrate(if enabled {
        "History follows its recorded course again."
    } else {
        "History is left to chance."
    });
}

pub fn set_mode(world: &mut WorldState, mode: CanonMode) {
    world.canon.mode = mode;
    world.narrate(match mode {
        CanonMode::Strict => "Every recorded event will be honored.",
        CanonMode::Anchors => "Only the great anchors of history will be honored.",
    });
}
