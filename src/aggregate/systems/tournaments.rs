//! Tournaments - announced by houses, joined by the player

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aggregate::character::RenownTier;
use crate::aggregate::systems::lifecycle::resolve_death;
use crate::aggregate::world::WorldState;
use crate::core::calendar::AbsTurn;
use crate::core::config::config;
use crate::core::rng::GameRng;
use crate::core::types::{HouseId, LocationId, TournamentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentSize {
    Minor,
    Medium,
    Important,
}

impl TournamentSize {
    pub fn for_prestige(prestige: i32) -> Self {
        match prestige {
            p if p < 45 => TournamentSize::Minor,
            p if p < 75 => TournamentSize::Medium,
            _ => TournamentSize::Important,
        }
    }

    /// Renown tiers admitted to the lists
    pub fn categories(self) -> [RenownTier; 3] {
        match self {
            TournamentSize::Minor => [RenownTier::Common, RenownTier::Strong, RenownTier::Recognized],
            TournamentSize::Medium => [RenownTier::Strong, RenownTier::Recognized, RenownTier::Imposing],
            TournamentSize::Important => [RenownTier::Recognized, RenownTier::Imposing, RenownTier::Renowned],
        }
    }
}

impl fmt::Display for TournamentSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TournamentSize::Minor => "minor",
            TournamentSize::Medium => "medium",
            TournamentSize::Important => "important",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentReason {
    ComingOfAge,
    Wedding,
    Victory,
    Harvest,
    Other,
}

impl TournamentReason {
    const ALL: [TournamentReason; 5] = [
        TournamentReason::ComingOfAge,
        TournamentReason::Wedding,
        TournamentReason::Victory,
        TournamentReason::Harvest,
        TournamentReason::Other,
    ];
}

impl fmt::Display for TournamentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TournamentReason::ComingOfAge => "a coming of age",
            TournamentReason::Wedding => "a wedding",
            TournamentReason::Victory => "a victory",
            TournamentReason::Harvest => "a good harvest",
            TournamentReason::Other => "the glory of the house",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Announced,
    Concluded,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub host_house_id: HouseId,
    pub location_id: LocationId,
    pub size: TournamentSize,
    pub reason: TournamentReason,
    pub status: TournamentStatus,
    pub announced_turn: AbsTurn,
    /// Scheduled by the historical record rather than rolled
    #[serde(default)]
    pub canonical: bool,
}

impl Tournament {
    pub fn is_open(&self) -> bool {
        self.status == TournamentStatus::Announced
    }

    pub fn admits(&self, tier: RenownTier) -> bool {
        self.size.categories().contains(&tier)
    }
}

/// Result of a joust in the lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoustOutcome {
    Death,
    Loss,
    Injury,
    Victory,
}

/// Opens a tournament. An id already in use is left untouched.
pub fn announce_tournament(
    world: &mut WorldState,
    id: TournamentId,
    host: &HouseId,
    location: &LocationId,
    size: TournamentSize,
    reason: TournamentReason,
    canonical: bool,
) -> bool {
    if world.tournaments.iter().any(|t| t.id == id) {
        return false;
    }
    let now = world.now();
    let host_name = world.house_name(host);
    let place = world.gazetteer.location_name(location);
    world.tournaments.push(Tournament {
        id,
        host_house_id: host.clone(),
        location_id: location.clone(),
        size,
        reason,
        status: TournamentStatus::Announced,
        announced_turn: now,
        canonical,
    });
    world.record(
        "Tournament announced",
        format!("{} calls a {} tournament at {} for {}.", host_name, size, place, reason),
        &["tournament"],
    );
    world.narrate(format!("{} announces a {} tournament at {}.", host_name, size, place));
    true
}

/// Expires stale tournaments and occasionally announces a new one
pub fn tick_tournaments(world: &mut WorldState, rng: &mut GameRng) {
    let now = world.now();
    let duration = config().tournament_duration;
    for t in world.tournaments.iter_mut().filter(|t| t.is_open()) {
        if now - t.announced_turn > duration {
            t.status = TournamentStatus::Expired;
        }
    }

    if world.houses.is_empty() || !rng.chance(config().tournament_chance) {
        return;
    }
    let Some(i) = rng.pick_index(world.houses.len()) else {
        return;
    };
    let (host, seat, prestige) = {
        let h = &world.houses[i];
        (h.id.clone(), h.seat_id.clone(), h.prestige)
    };
    let reason = rng
        .pick(&TournamentReason::ALL)
        .copied()
        .unwrap_or(TournamentReason::Other);
    let id = world.next_tournament_id();
    announce_tournament(
        world,
        id,
        &host,
        &seat,
        TournamentSize::for_prestige(prestige),
        reason,
        false,
    );
}

/// Player enters the lists of an open tournament
///
/// Refusals come back as `Err` with a reason for the player.
pub fn join_tournament(
    world: &mut WorldState,
    rng: &mut GameRng,
    id: &TournamentId,
) -> std::result::Result<JoustOutcome, String> {
    let now = world.now();
    let tournament = world
        .tournaments
        .iter()
        .find(|t| &t.id == id && t.is_open())
        .ok_or_else(|| "No such tournament is open.".to_string())?;
    let location = tournament.location_id.clone();
    let host = tournament.host_house_id.clone();
    let size = tournament.size;

    let player = world.player().ok_or_else(|| "No player character.".to_string())?;
    if player.is_injured(now) {
        return Err("You are still recovering from your injuries.".into());
    }
    if player.location_id != location {
        return Err(format!(
            "The tournament is held at {}.",
            world.gazetteer.location_name(&location)
        ));
    }
    if !size.categories().contains(&player.renown) {
        return Err(format!("A {} renown has no place in a {} tournament.", player.renown, size));
    }

    let roll = rng.next();
    let player_id = world.player_id.clone();
    let host_name = world.house_name(&host);
    let outcome = if roll < 0.10 {
        JoustOutcome::Death
    } else if roll < 0.40 {
        JoustOutcome::Loss
    } else if roll < 0.60 {
        JoustOutcome::Injury
    } else {
        JoustOutcome::Victory
    };
    tracing::debug!(tournament = %id, ?outcome, "Joust resolved");

    match outcome {
        JoustOutcome::Death => {
            world.record(
                "Death in the lists",
                format!("{} falls at the tournament of {}.", world.character_name(&player_id), host_name),
                &["tournament", "death"],
            );
            resolve_death(world, &player_id, "killed in the lists");
        }
        JoustOutcome::Loss => {
            if let Some(p) = world.player_mut() {
                p.personal_prestige = (p.personal_prestige - 2).clamp(0, 100);
            }
            world.narrate("You are unhorsed in the first pass. Prestige -2.");
        }
        JoustOutcome::Injury => {
            if let Some(p) = world.player_mut() {
                p.personal_prestige = (p.personal_prestige - 5).clamp(0, 100);
                p.injured_until_turn = Some(now + 2);
            }
            if let Some(h) = world.player_house_mut() {
                h.adjust_prestige(-1);
            }
            world.narrate("A lance splinters against your helm. You are injured for two turns.");
        }
        JoustOutcome::Victory => {
            if let Some(p) = world.player_mut() {
                p.personal_prestige = (p.personal_prestige + 10).clamp(0, 100);
            }
            if let Some(h) = world.player_house_mut() {
                h.adjust_prestige(2);
                h.resources.gold += 60;
            }
            world.narrate("You win the tournament! Prestige +10, house prestige +2, 60 gold.");
            world.record(
                "Tournament champion",
                format!("{} wins the tournament of {}.", world.character_name(&player_id), host_name),
                &["tournament"],
            );
        }
    }
    if let Some(t) = world.tournaments.iter_mut().find(|t| &t.id == id) {
        t.status = TournamentStatus::Concluded;
    }
    Ok(outcome)
}
