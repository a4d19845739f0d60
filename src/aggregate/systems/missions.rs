//! Missions offered to the player
//!
//! A small stock of regional jobs is kept open around the player. On top of
//! that the house leader, the crown and (for a ruling player) suzerains and
//! vassals post their own requests. Feudal requests ask for house resources
//! and are capped by what the player's house actually holds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aggregate::character::Character;
use crate::aggregate::world::WorldState;
use crate::core::calendar::AbsTurn;
use crate::core::config::config;
use crate::core::rng::GameRng;
use crate::core::types::{CharacterId, HouseId, LocationId, MissionId, RegionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    Diplomacy,
    Trade,
    Bandits,
    Wilds,
    Leader,
    Crown,
    Suzerain,
    Vassal,
}

impl MissionKind {
    pub fn is_feudal(self) -> bool {
        matches!(self, MissionKind::Suzerain | MissionKind::Vassal)
    }
}

impl fmt::Display for MissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissionKind::Diplomacy => "diplomacy",
            MissionKind::Trade => "trade",
            MissionKind::Bandits => "bandits",
            MissionKind::Wilds => "wilds",
            MissionKind::Leader => "leader",
            MissionKind::Crown => "crown",
            MissionKind::Suzerain => "suzerain",
            MissionKind::Vassal => "vassal",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Open,
    Accepted,
    Delegated,
    Completed,
    Failed,
    Expired,
}

/// What the mission asks of the player and their house
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    pub martial: i32,
    pub gold: i64,
    pub goods: i64,
    pub food: i64,
    pub levies: i64,
}

impl Requirements {
    pub fn martial(martial: i32) -> Self {
        Self {
            martial,
            ..Self::default()
        }
    }

    /// Needs nothing but a strong arm, so it can be handed to a relative
    pub fn is_martial_only(&self) -> bool {
        self.martial > 0 && self.gold == 0 && self.goods == 0 && self.food == 0 && self.levies == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reward {
    /// Personal gold for the player
    pub gold: i64,
    pub house_gold: i64,
    pub goods: i64,
    pub relation: i32,
    pub prestige: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub kind: MissionKind,
    pub title: String,
    pub region_id: RegionId,
    pub target_location_id: LocationId,
    pub requirements: Requirements,
    pub reward: Reward,
    #[serde(default)]
    pub requester_house_id: Option<HouseId>,
    pub created_turn: AbsTurn,
    pub expires_turn: AbsTurn,
    pub status: MissionStatus,
    #[serde(default)]
    pub assigned_to: Option<CharacterId>,
    #[serde(default)]
    pub delegated_turn: Option<AbsTurn>,
}

/// Standing used to scale leader and crown offers
pub fn player_power(player: &Character) -> i32 {
    (player.martial as f64 * 0.65 + player.personal_prestige as f64 * 0.35).round() as i32
}

/// Caps a requested amount at a share of the stock, never below `floor`
fn cap_by_stock(request: i64, stock: i64, share: f64, floor: i64) -> i64 {
    let cap = (stock as f64 * share).floor() as i64;
    request.min(cap).max(floor)
}

struct Draft {
    kind: MissionKind,
    title: String,
    target: LocationId,
    requirements: Requirements,
    reward: Reward,
    requester: Option<HouseId>,
    lifetime: i64,
}

fn post(world: &mut WorldState, region: &RegionId, draft: Draft) {
    let now = world.now();
    let id = world.next_mission_id();
    tracing::debug!(mission = %id, kind = %draft.kind, "Mission posted");
    world.missions.push(Mission {
        id,
        kind: draft.kind,
        title: draft.title,
        region_id: region.clone(),
        target_location_id: draft.target,
        requirements: draft.requirements,
        reward: draft.reward,
        requester_house_id: draft.requester,
        created_turn: now,
        expires_turn: now + draft.lifetime,
        status: MissionStatus::Open,
        assigned_to: None,
        delegated_turn: None,
    });
}

fn has_open(world: &WorldState, kind: MissionKind) -> bool {
    world.missions.iter().any(|m| m.kind == kind && m.status == MissionStatus::Open)
}

fn neighbor_or_here(world: &WorldState, rng: &mut GameRng, here: &LocationId) -> LocationId {
    let edges: Vec<&LocationId> = world.gazetteer.routes_from(here).map(|(to, _)| to).collect();
    rng.pick(&edges).map(|l| (*l).clone()).unwrap_or_else(|| here.clone())
}

/// Drops finished missions and tops up the offers around the player
pub fn ensure_missions(world: &mut WorldState, rng: &mut GameRng) {
    let now = world.now();
    world
        .missions
        .retain(|m| m.status != MissionStatus::Expired && (m.expires_turn > now || m.status == MissionStatus::Delegated));

    let Some(player) = world.player() else {
        return;
    };
    let here = player.location_id.clone();
    let power = player_power(player);
    let Some(region) = world.location(&here).map(|l| l.region_id.clone()) else {
        return;
    };
    let player_leads = world.player_is_leader();

    // 1. Regional stock
    let open_here = world
        .missions
        .iter()
        .filter(|m| m.region_id == region && m.status == MissionStatus::Open)
        .count();
    let place = world.gazetteer.location_name(&here);
    for _ in open_here..config().open_mission_target {
        let kind = *rng
            .pick(&[MissionKind::Diplomacy, MissionKind::Bandits, MissionKind::Wilds, MissionKind::Trade])
            .unwrap_or(&MissionKind::Bandits);
        let req = match kind {
            MissionKind::Diplomacy => rng.int(10, 35),
            MissionKind::Trade => rng.int(15, 40),
            _ => rng.int(25, 70),
        };
        let title = match kind {
            MissionKind::Diplomacy => format!("Words before steel at {}", place),
            MissionKind::Trade => format!("Merchant road of {}", place),
            MissionKind::Bandits => format!("Blood on the road to {}", place),
            _ => format!("Cold watch beyond {}", place),
        };
        let reward = rng.int(25, 120) + (req as f64 * 1.2).floor() as i64;
        let target = neighbor_or_here(world, rng, &here);
        let lifetime = rng.int(6, 16);
        post(
            world,
            &region,
            Draft {
                kind,
                title,
                target,
                requirements: Requirements::martial(req as i32),
                reward: Reward {
                    gold: reward,
                    ..Reward::default()
                },
                requester: None,
                lifetime,
            },
        );
    }

    // 2. Tasks from the player's own leader
    if !player_leads && !has_open(world, MissionKind::Leader) {
        let leader = world
            .player_house()
            .and_then(|h| h.leader_id.as_ref())
            .and_then(|id| world.character(id))
            .filter(|c| c.alive)
            .map(|c| c.name.clone());
        let chance = match power {
            p if p < 35 => 0.85,
            p if p < 55 => 0.55,
            _ => 0.25,
        };
        if let Some(leader) = leader {
            if rng.chance(chance) {
                let target = neighbor_or_here(world, rng, &here);
                let req = if power < 35 { rng.int(16, 34) } else { rng.int(24, 46) };
                let gold = rng.int(30, 95);
                let lifetime = rng.int(7, 14);
                let house = world.player_house_id.clone();
                post(
                    world,
                    &region,
                    Draft {
                        kind: MissionKind::Leader,
                        title: format!("{} asks you to prove your loyalty", leader),
                        target,
                        requirements: Requirements::martial(req as i32),
                        reward: Reward {
                            gold,
                            relation: 3,
                            prestige: 1,
                            ..Reward::default()
                        },
                        requester: Some(house),
                        lifetime,
                    },
                );
            }
        }
    }

    // 3. The crown
    if !has_open(world, MissionKind::Crown) {
        let chance = match power {
            p if p >= 75 => 0.18,
            p if p >= 60 => 0.10,
            _ => 0.03,
        };
        if rng.chance(chance) {
            let crown = world.houses.iter().find(|h| h.is_crown).map(|h| (h.id.clone(), h.seat_id.clone()));
            let target = crown.as_ref().map_or_else(|| here.clone(), |(_, seat)| seat.clone());
            let req = rng.int(48, 82) as i32;
            let gold = rng.int(120, 260);
            let house_gold = rng.int(80, 220);
            let lifetime = rng.int(8, 18);
            post(
                world,
                &region,
                Draft {
                    kind: MissionKind::Crown,
                    title: "Royal seal: business of the throne".to_string(),
                    target,
                    requirements: Requirements::martial(req),
                    reward: Reward {
                        gold,
                        house_gold,
                        prestige: 3,
                        relation: 6,
                        ..Reward::default()
                    },
                    requester: crown.map(|(id, _)| id),
                    lifetime,
                },
            );
        }
    }

    // 4. Feudal requests
    if player_leads {
        post_feudal_request(world, rng, &region, &here);
    }
}

fn post_feudal_request(world: &mut WorldState, rng: &mut GameRng, region: &RegionId, here: &LocationId) {
    let open_feudal = world
        .missions
        .iter()
        .filter(|m| m.kind.is_feudal() && m.status == MissionStatus::Open)
        .count();
    if open_feudal >= 2 || !rng.chance(0.65) {
        return;
    }
    let Some(house) = world.player_house() else {
        return;
    };
    let tier = house.tier_gold();
    let stock = house.resources.clone();
    let levies = house.army.levies;
    let suzerain = house
        .suzerain_id
        .as_ref()
        .and_then(|id| world.house(id))
        .map(|s| (s.id.clone(), s.name.clone(), s.seat_id.clone(), s.tier_gold()));
    let vassals: Vec<(HouseId, String, LocationId)> = world
        .houses
        .iter()
        .filter(|h| h.suzerain_id.as_ref() == Some(&house.id))
        .map(|h| (h.id.clone(), h.name.clone(), h.seat_id.clone()))
        .collect();
    let at_war = !world.canon.active_war_ids.is_empty();

    let from_suzerain = match (&suzerain, vassals.is_empty()) {
        (Some(_), false) => rng.chance(0.55),
        (Some(_), true) => true,
        (None, false) => false,
        (None, true) => return,
    };
    let martial_req = |rng: &mut GameRng, tier: i64| -> i32 {
        (match tier {
            700 => rng.int(45, 70),
            500 => rng.int(40, 65),
            350 => rng.int(35, 60),
            _ => rng.int(28, 55),
        }) as i32
    };

    let draft = if from_suzerain {
        let Some((id, name, seat, suzerain_tier)) = suzerain else {
            return;
        };
        let (base_goods, base_levies, base_food) = match suzerain_tier {
            700 => (140, 130, 260),
            500 => (105, 95, 210),
            350 => (75, 70, 165),
            _ => (55, 50, 125),
        };
        let goods = cap_by_stock(base_goods, stock.goods, 0.45, 15);
        let food = cap_by_stock(base_food, stock.food, 0.45, 25);
        let levy_req = cap_by_stock(base_levies, levies, 0.35, 15);
        let templates: &[&str] = if at_war {
            &["levies", "tribute", "escort"]
        } else {
            &["tribute", "escort", "council", "supplies"]
        };
        let template = *rng.pick(templates).unwrap_or(&"tribute");
        let (title, target, requirements, reward, lifetime) = match template {
            "tribute" => (
                format!("Extraordinary tribute for {}", name),
                seat,
                Requirements { goods, ..Requirements::default() },
                Reward { gold: rng.int(20, 55), relation: 4, prestige: 1, ..Reward::default() },
                rng.int(8, 16),
            ),
            "levies" => (
                format!("{} raises the banners", name),
                seat,
                Requirements { levies: levy_req, ..Requirements::default() },
                Reward { gold: rng.int(15, 45), house_gold: rng.int(40, 120), relation: 3, prestige: 1, ..Reward::default() },
                rng.int(8, 18),
            ),
            "supplies" => (
                format!("Granaries for the host of {}", name),
                seat,
                Requirements { food, goods: (goods as f64 * 0.6).floor().max(10.0) as i64, ..Requirements::default() },
                Reward { gold: rng.int(20, 60), house_gold: rng.int(30, 110), relation: 4, prestige: 1, ..Reward::default() },
                rng.int(8, 16),
            ),
            "council" => (
                format!("Closed council at the seat of {}", name),
                seat,
                Requirements::martial(rng.int(10, 25) as i32),
                Reward { gold: rng.int(25, 75), relation: 5, prestige: 1, ..Reward::default() },
                rng.int(6, 14),
            ),
            _ => {
                let target = neighbor_or_here(world, rng, here);
                (
                    format!("Escort the caravan of {}", name),
                    target,
                    Requirements::martial(martial_req(rng, tier)),
                    Reward { gold: rng.int(40, 120), relation: 2, prestige: 1, ..Reward::default() },
                    rng.int(6, 14),
                )
            }
        };
        Draft {
            kind: MissionKind::Suzerain,
            title,
            target,
            requirements,
            reward,
            requester: Some(id),
            lifetime,
        }
    } else {
        let Some(i) = rng.pick_index(vassals.len()) else {
            return;
        };
        let (id, name, seat) = vassals[i].clone();
        let food = cap_by_stock(
            match tier {
                700 => 280,
                500 => 220,
                350 => 170,
                _ => 130,
            },
            stock.food,
            0.45,
            20,
        );
        let goods = cap_by_stock(
            match tier {
                700 => 100,
                500 => 80,
                350 => 60,
                _ => 40,
            },
            stock.goods,
            0.45,
            10,
        );
        let templates: &[&str] = if at_war {
            &["protection", "aid", "mediation"]
        } else {
            &["aid", "mediation", "protection", "repairs"]
        };
        let template = *rng.pick(templates).unwrap_or(&"aid");
        let (title, requirements, reward, lifetime) = match template {
            "aid" => (
                format!("Empty granaries at {}", name),
                Requirements { food, goods, ..Requirements::default() },
                Reward { gold: rng.int(15, 50), relation: 4, prestige: 1, ..Reward::default() },
                rng.int(8, 16),
            ),
            "mediation" => (
                format!("Border quarrel under {}", name),
                Requirements::martial(martial_req(rng, tier)),
                Reward { gold: rng.int(30, 95), relation: 3, prestige: 1, ..Reward::default() },
                rng.int(6, 14),
            ),
            "repairs" => (
                format!("Stone and mortar for {}", name),
                Requirements { goods: (goods as f64 * 1.1).floor().max(10.0) as i64, ..Requirements::default() },
                Reward { gold: rng.int(10, 40), relation: 4, prestige: 1, ..Reward::default() },
                rng.int(8, 18),
            ),
            _ => (
                format!("Raiders harry {}", name),
                Requirements::martial(martial_req(rng, tier)),
                Reward { gold: rng.int(35, 110), goods: rng.int(15, 55), relation: 3, prestige: 1, ..Reward::default() },
                rng.int(6, 14),
            ),
        };
        Draft {
            kind: MissionKind::Vassal,
            title,
            target: seat,
            requirements,
            reward,
            requester: Some(id),
            lifetime,
        }
    };
    post(world, region, draft);
}

/// Expires overdue missions, resolves delegated ones, then restocks
pub fn tick_missions(world: &mut WorldState, rng: &mut GameRng) {
    let now = world.now();
    let cfg = config();
    let player_house = world.player_house_id.clone();

    // 1. Expiry, with feudal penalties for ignored requests
    let mut snubbed: Vec<(HouseId, MissionKind)> = Vec::new();
    let mut missed = Vec::new();
    for m in world.missions.iter_mut() {
        let live = matches!(m.status, MissionStatus::Open | MissionStatus::Accepted);
        if !live || m.expires_turn > now {
            continue;
        }
        m.status = MissionStatus::Expired;
        if m.assigned_to.as_ref() == Some(&world.player_id) {
            missed.push(m.title.clone());
        }
        if let (true, Some(requester)) = (m.kind.is_feudal(), m.requester_house_id.clone()) {
            snubbed.push((requester, m.kind));
        }
    }
    for title in missed {
        world.narrate(format!("You missed the deadline of the mission: {}.", title));
    }
    for (requester, kind) in snubbed {
        let d = if kind == MissionKind::Suzerain { 5 } else { 3 };
        world.adjust_relations(&player_house, &requester, -d, -d);
        if kind == MissionKind::Suzerain {
            if let Some(h) = world.player_house_mut() {
                h.adjust_prestige(-1);
            }
        }
    }

    // 2. Delegated missions
    for i in 0..world.missions.len() {
        let m = &world.missions[i];
        if m.status != MissionStatus::Delegated {
            continue;
        }
        let Some(assignee_id) = m.assigned_to.clone() else {
            continue;
        };
        if now - m.delegated_turn.unwrap_or(m.created_turn) < cfg.delegate_min_turns {
            continue;
        }
        let assignee = world.character(&assignee_id).filter(|c| c.alive);
        let Some(assignee) = assignee else {
            let title = m.title.clone();
            world.missions[i].status = MissionStatus::Failed;
            world.narrate(format!("The delegated mission failed: {} (the delegate is gone).", title));
            continue;
        };
        let capable = assignee.martial >= m.requirements.martial;
        let assignee_name = assignee.name.clone();
        if !rng.chance(if capable { 0.75 } else { 0.15 }) {
            continue;
        }
        let m = world.missions[i].clone();
        if !capable {
            world.missions[i].status = MissionStatus::Failed;
            world.narrate(format!("The delegated mission failed: {}.", m.title));
            continue;
        }
        world.missions[i].status = MissionStatus::Completed;
        let house_gold = m.reward.gold + m.reward.house_gold;
        let share = (house_gold as f64 * cfg.delegate_share).floor() as i64;
        if let Some(h) = world.player_house_mut() {
            h.resources.gold += house_gold;
            h.resources.goods += m.reward.goods.max(0);
            h.adjust_prestige(m.reward.prestige.max(0));
        }
        if let Some(requester) = &m.requester_house_id {
            let d = if m.reward.relation > 0 { m.reward.relation } else { 2 };
            world.adjust_relations(&player_house, requester, d, d);
        }
        if let Some(c) = world.character_mut(&assignee_id) {
            c.personal_gold += share;
        }
        world.narrate(format!(
            "{} completed the delegated mission {}: +{} gold for the house, +{} for the delegate.",
            assignee_name, m.title, house_gold, share
        ));
    }

    // 3. Restock
    ensure_missions(world, rng);
}

fn find_mission(world: &WorldState, id: &MissionId) -> std::result::Result<usize, String> {
    world
        .missions
        .iter()
        .position(|m| &m.id == id)
        .ok_or_else(|| "Mission not found.".to_string())
}

pub fn accept_mission(world: &mut WorldState, id: &MissionId) -> std::result::Result<(), String> {
    let i = find_mission(world, id)?;
    if world.missions[i].status != MissionStatus::Open {
        return Err("This mission is not available.".into());
    }
    let player = world.player_id.clone();
    let m = &mut world.missions[i];
    m.status = MissionStatus::Accepted;
    m.assigned_to = Some(player);
    let title = m.title.clone();
    world.narrate(format!("You accept the mission: {}.", title));
    Ok(())
}

/// Completes an accepted mission at its target location
///
/// Resource requirements are drawn from the house treasury. Falling short
/// of the martial requirement costs one point of personal prestige and
/// leaves the mission accepted.
pub fn complete_mission(world: &mut WorldState, id: &MissionId) -> std::result::Result<(), String> {
    let i = find_mission(world, id)?;
    let m = world.missions[i].clone();
    let player = world.player().ok_or_else(|| "No player character.".to_string())?;
    if m.status != MissionStatus::Accepted || m.assigned_to.as_ref() != Some(&player.id) {
        return Err("You are not charged with this mission.".into());
    }
    if player.location_id != m.target_location_id {
        return Err(format!(
            "You must be at {} to complete it.",
            world.gazetteer.location_name(&m.target_location_id)
        ));
    }
    let martial = player.martial;
    let house = world.player_house().ok_or_else(|| "No house treasury.".to_string())?;
    let req = &m.requirements;
    let shortfalls = [
        ("gold", house.resources.gold, req.gold),
        ("goods", house.resources.goods, req.goods),
        ("food", house.resources.food, req.food),
        ("levies", house.army.levies, req.levies),
    ];
    for (what, have, need) in shortfalls {
        if need > 0 && have < need {
            return Err(format!("Not enough {} ({} of {}).", what, have, need));
        }
    }
    if req.martial > 0 && martial < req.martial {
        if let Some(p) = world.player_mut() {
            p.personal_prestige = (p.personal_prestige - 1).clamp(0, 100);
        }
        return Err(format!("Not strong enough ({} of {}). You fail this time.", martial, req.martial));
    }

    if let Some(h) = world.player_house_mut() {
        h.resources.gold -= req.gold.max(0);
        h.resources.goods -= req.goods.max(0);
        h.resources.food -= req.food.max(0);
        h.army.levies -= req.levies.max(0);
        h.resources.gold += m.reward.house_gold.max(0);
        h.resources.goods += m.reward.goods.max(0);
        h.adjust_prestige(m.reward.prestige.max(0));
    }
    if let Some(p) = world.player_mut() {
        p.personal_gold += m.reward.gold.max(0);
        p.personal_prestige = (p.personal_prestige + 1).clamp(0, 100);
    }
    if let Some(requester) = &m.requester_house_id {
        let d = if m.reward.relation > 0 { m.reward.relation } else { 2 };
        let own = world.player_house_id.clone();
        world.adjust_relations(&own, requester, d, d);
    }
    world.missions[i].status = MissionStatus::Completed;
    world.narrate(format!("Mission complete: {}. +{} personal gold.", m.title, m.reward.gold));
    Ok(())
}

/// Hands an open martial mission to a relative; leaders only
pub fn delegate_mission(
    world: &mut WorldState,
    id: &MissionId,
    assignee: &CharacterId,
) -> std::result::Result<(), String> {
    let i = find_mission(world, id)?;
    if !world.player_is_leader() {
        return Err("Only the head of the house can delegate missions.".into());
    }
    let name = world
        .character(assignee)
        .filter(|c| c.alive && c.current_house_id == world.player_house_id && c.id != world.player_id)
        .map(|c| c.name.clone())
        .ok_or_else(|| "Invalid delegate.".to_string())?;
    let now = world.now();
    let m = &mut world.missions[i];
    if m.status != MissionStatus::Open {
        return Err("This mission cannot be delegated now.".into());
    }
    if !m.requirements.is_martial_only() {
        return Err("This mission needs the house's own resources and cannot be delegated.".into());
    }
    m.status = MissionStatus::Delegated;
    m.assigned_to = Some(assignee.clone());
    m.delegated_turn = Some(now);
    let title = m.title.clone();
    world.narrate(format!("You delegate \"{}\" to {}.", title, name));
    Ok(())
}

pub fn abandon_mission(world: &mut WorldState, id: &MissionId) -> std::result::Result<(), String> {
    let i = find_mission(world, id)?;
    let m = world.missions[i].clone();
    if m.status != MissionStatus::Accepted || m.assigned_to.as_ref() != Some(&world.player_id) {
        return Err("You are not charged with this mission.".into());
    }
    world.missions[i].status = MissionStatus::Failed;
    let penalty = if m.kind.is_feudal() { 3 } else { 2 };
    if let Some(p) = world.player_mut() {
        p.personal_prestige = (p.personal_prestige - penalty).clamp(0, 100);
    }
    if let Some(requester) = &m.requester_house_id {
        let d = if m.kind == MissionKind::Suzerain { 6 } else { 4 };
        let own = world.player_house_id.clone();
        world.adjust_relations(&own, requester, -d, -d);
    }
    world.narrate(format!("You abandon the mission: {}.", m.title));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::house::House;
    use crate::core::types::Gender;
    use crate::data::gazetteer::{Gazetteer, Location, LocationKind, Region, Route};

    fn world() -> WorldState {
        let gazetteer = Gazetteer {
            regions: vec![Region {
                id: RegionId::new("r"),
                name: "Reach".into(),
                encounter_risk: 0.1,
            }],
            locations: ["seat", "town"]
                .iter()
                .map(|id| Location {
                    id: LocationId::new(*id),
                    name: id.to_string(),
                    region_id: RegionId::new("r"),
                    kind: LocationKind::Seat,
                })
                .collect(),
            routes: vec![Route {
                a: LocationId::new("seat"),
                b: LocationId::new("town"),
                distance: 2,
            }],
            ..Gazetteer::default()
        };
        let mut world = WorldState::new(gazetteer);
        world.add_house(House::new(
            HouseId::new("a"),
            "House A",
            RegionId::new("r"),
            LocationId::new("seat"),
            50,
        ));
        let id = world.next_character_id();
        world.add_character(Character::new(
            id.clone(),
            "Player",
            Gender::Male,
            18.0,
            HouseId::new("a"),
            LocationId::new("seat"),
        ));
        world.player_id = id;
        world.player_house_id = HouseId::new("a");
        world
    }

    fn mission(world: &mut WorldState, requirements: Requirements) -> MissionId {
        let id = world.next_mission_id();
        world.missions.push(Mission {
            id: id.clone(),
            kind: MissionKind::Bandits,
            title: "Test".into(),
            region_id: RegionId::new("r"),
            target_location_id: LocationId::new("seat"),
            requirements,
            reward: Reward {
                gold: 50,
                ..Reward::default()
            },
            requester_house_id: None,
            created_turn: world.now(),
            expires_turn: world.now() + 10,
            status: MissionStatus::Open,
            assigned_to: None,
            delegated_turn: None,
        });
        id
    }

    #[test]
    fn test_stock_keeps_three_regional_missions() {
        let mut world = world();
        let mut rng = GameRng::new(4);
        ensure_missions(&mut world, &mut rng);
        let regional = world
            .missions
            .iter()
            .filter(|m| !matches!(m.kind, MissionKind::Leader | MissionKind::Crown))
            .count();
        assert_eq!(regional, 3);
        for m in &world.missions {
            let lifetime = m.expires_turn - m.created_turn;
            assert!((6..=18).contains(&lifetime));
        }
    }

    #[test]
    fn test_complete_pays_and_requires_martial() {
        let mut world = world();
        let id = mission(&mut world, Requirements::martial(30));
        accept_mission(&mut world, &id).unwrap();
        assert!(complete_mission(&mut world, &id).is_ok());
        assert_eq!(world.player().unwrap().personal_gold, 50);
        assert_eq!(world.missions[0].status, MissionStatus::Completed);

        let hard = mission(&mut world, Requirements::martial(90));
        accept_mission(&mut world, &hard).unwrap();
        assert!(complete_mission(&mut world, &hard).is_err());
        assert_eq!(world.missions[1].status, MissionStatus::Accepted);
    }

    #[test]
    fn test_delegation_is_leader_only_and_martial_only() {
        let mut world = world();
        let id = mission(&mut world, Requirements { goods: 20, ..Requirements::default() });
        let cousin = world.next_character_id();
        world.add_character(Character::new(cousin.clone(), "Cousin", Gender::Male, 25.0, HouseId::new("a"), LocationId::new("seat")));
        assert!(delegate_mission(&mut world, &id, &cousin).is_err());

        let player = world.player_id.clone();
        world.set_leader(&HouseId::new("a"), &player);
        assert!(delegate_mission(&mut world, &id, &cousin).is_err());

        let martial = mission(&mut world, Requirements::martial(10));
        assert!(delegate_mission(&mut world, &martial, &cousin).is_ok());
        assert_eq!(world.missions[1].status, MissionStatus::Delegated);
    }

    #[test]
    fn test_abandon_costs_prestige() {
        let mut world = world();
        let id = mission(&mut world, Requirements::martial(10));
        accept_mission(&mut world, &id).unwrap();
        let before = world.player().unwrap().personal_prestige;
        abandon_mission(&mut world, &id).unwrap();
        assert_eq!(world.player().unwrap().personal_prestige, before - 2);
    }

    #[test]
    fn test_feudal_expiry_sours_relations() {
        let mut world = world();
        world.add_house(House::new(HouseId::new("liege"), "Liege", RegionId::new("r"), LocationId::new("town"), 80));
        let id = mission(&mut world, Requirements { goods: 10, ..Requirements::default() });
        world.missions[0].kind = MissionKind::Suzerain;
        world.missions[0].requester_house_id = Some(HouseId::new("liege"));
        world.missions[0].expires_turn = world.now();
        let mut rng = GameRng::new(2);
        tick_missions(&mut world, &mut rng);
        assert!(world.missions.iter().all(|m| m.id != id));
        let house = world.player_house().unwrap();
        assert_eq!(house.relation(&HouseId::new("liege")), 45);
        assert_eq!(house.prestige, 49);
    }

    #[test]
    fn test_cap_by_stock() {
        assert_eq!(cap_by_stock(140, 100, 0.45, 15), 45);
        assert_eq!(cap_by_stock(140, 0, 0.45, 15), 15);
        assert_eq!(cap_by_stock(55, 1000, 0.45, 15), 55);
    }
}
