//! Marriages, arranged and otherwise

use serde::{Deserialize, Serialize};

use crate::aggregate::character::{are_close_kin, Character, MaritalStatus};
use crate::aggregate::world::WorldState;
use crate::core::config::config;
use crate::core::rng::GameRng;
use crate::core::types::{CharacterId, Gender, HouseId};

/// Which house the couple belongs to after the wedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lineage {
    /// The bride joins the groom's house
    Patrilineal,
    /// The groom joins the bride's house
    Matrilineal,
}

/// Whether two characters may be wed by the house AI
pub fn ai_can_marry(a: &Character, b: &Character) -> bool {
    let adult = config().adult_age;
    a.alive
        && b.alive
        && a.marital_status != MaritalStatus::Married
        && b.marital_status != MaritalStatus::Married
        && a.age >= adult
        && b.age >= adult
        && a.gender != b.gender
        && !are_close_kin(a, b)
}

/// True when nobody else alive carries `character`'s current house
pub fn is_last_of_house(world: &WorldState, character: &CharacterId) -> bool {
    let Some(c) = world.character(character) else {
        return false;
    };
    !world
        .members_of(&c.current_house_id)
        .any(|other| other.id != c.id)
}

/// Weds `groom` and `bride`, moves one of them and pays a dowry
///
/// The dowry flows from the bride's birth house to the groom's house and
/// never dips the bride's house below its tier reserve. Returns the house the
/// couple now belongs to.
pub fn apply_marriage(
    world: &mut WorldState,
    rng: &mut GameRng,
    groom: &CharacterId,
    bride: &CharacterId,
    lineage: Lineage,
    reason: &str,
) -> Option<HouseId> {
    let (couple_house, bride_birth, bride_current, groom_house, names) = {
        let (g, b) = world.character_pair_mut(groom, bride)?;
        g.spouse_id = Some(b.id.clone());
        b.spouse_id = Some(g.id.clone());
        g.marital_status = MaritalStatus::Married;
        b.marital_status = MaritalStatus::Married;

        let couple_house = match lineage {
            Lineage::Patrilineal => {
                b.keeps_birth_name = false;
                b.current_house_id = g.current_house_id.clone();
                g.current_house_id.clone()
            }
            Lineage::Matrilineal => {
                g.current_house_id = b.current_house_id.clone();
                b.current_house_id.clone()
            }
        };
        (
            couple_house,
            b.birth_house_id.clone(),
            b.current_house_id.clone(),
            g.current_house_id.clone(),
            (g.name.clone(), b.name.clone()),
        )
    };
    let bride_house = if world.house(&bride_birth).is_some() {
        bride_birth
    } else {
        bride_current
    };

    if bride_house != groom_house {
        if let Some((bh, gh)) = world.house_pair_mut(&bride_house, &groom_house) {
            let spare_gold = (bh.resources.gold - bh.tier_gold()).max(0);
            let spare_goods = (bh.resources.goods - 60).max(0);
            let gold = spare_gold.min(rng.int(10, 40));
            let goods = spare_goods.min(rng.int(12, 45));
            bh.resources.gold -= gold;
            gh.resources.gold += gold;
            bh.resources.goods -= goods;
            gh.resources.goods += goods;
            bh.adjust_relation(&groom_house, 6);
            gh.adjust_relation(&bride_house, 6);
        }
    }

    let house_name = world.house_name(&couple_house);
    tracing::debug!(groom = %groom, bride = %bride, ?lineage, "Marriage");
    world.record(
        "Marriage",
        format!(
            "{} weds {}. The couple belongs to {}. Reason: {}.",
            names.0, names.1, house_name, reason
        ),
        &["marriage", "politics"],
    );
    Some(couple_house)
}

fn pick<'a>(rng: &mut GameRng, list: &[&'a Character]) -> Option<&'a Character> {
    rng.pick(list).copied()
}

/// Arranges a few marriages between houses every few turns
///
/// A random non-player house marries off an unmarried adult heir, preferring
/// sons, or its own unmarried leader when no child of ten or older exists.
/// Partners come from other houses, best relations first. Canonical
/// characters are never matched here.
pub fn tick_arranged_marriages(world: &mut WorldState, rng: &mut GameRng) {
    let cfg = config();
    if world.now() % cfg.arranged_marriage_interval != 0 {
        return;
    }
    let tries = (world.houses.len() / 45).clamp(1, 6);

    for _ in 0..tries {
        let Some(pair) = choose_match(world, rng) else {
            continue;
        };
        let (groom, bride) = pair;

        let bride_house = match world.character(&bride) {
            Some(c) => c.current_house_id.clone(),
            None => continue,
        };
        let mut lineage = Lineage::Patrilineal;
        if is_last_of_house(world, &bride) {
            let leads = world
                .house(&bride_house)
                .and_then(|h| h.leader_id.as_ref())
                .map_or(false, |l| l == &bride);
            let p = if leads { 0.90 } else { 0.65 };
            if rng.chance(p) {
                lineage = Lineage::Matrilineal;
            }
        }
        apply_marriage(world, rng, &groom, &bride, lineage, "an arrangement between houses");
    }
}

fn choose_match(world: &WorldState, rng: &mut GameRng) -> Option<(CharacterId, CharacterId)> {
    let adult = config().adult_age;
    let eligible = |c: &&Character, gender: Gender, max_age: f64| {
        c.alive
            && c.gender == gender
            && c.age >= adult
            && c.age <= max_age
            && c.marital_status != MaritalStatus::Married
            && !c.is_bastard
            && c.canon.is_none()
    };
    let men: Vec<&Character> = world
        .characters
        .iter()
        .filter(|c| eligible(c, Gender::Male, 65.0))
        .collect();
    let women: Vec<&Character> = world
        .characters
        .iter()
        .filter(|c| eligible(c, Gender::Female, 45.0))
        .collect();
    if men.is_empty() || women.is_empty() {
        return None;
    }

    let pool: Vec<&HouseId> = world
        .houses
        .iter()
        .filter(|h| h.id != world.player_house_id)
        .map(|h| &h.id)
        .collect();
    let house_id = (*rng.pick(&pool)?).clone();
    let house = world.house(&house_id)?;
    let leader = world.character(house.leader_id.as_ref()?)?;
    if !leader.alive {
        return None;
    }

    let children: Vec<&Character> = world
        .members_of(&house_id)
        .filter(|c| !c.is_bastard)
        .filter(|c| c.father_id.as_ref() == Some(&leader.id) || c.mother_id.as_ref() == Some(&leader.id))
        .collect();
    let unmarried_heirs: Vec<&Character> = children
        .iter()
        .copied()
        .filter(|c| c.age >= adult && c.marital_status != MaritalStatus::Married)
        .collect();
    let need_heir = !children.iter().any(|c| c.age >= 10.0);

    let subject = if !unmarried_heirs.is_empty() {
        let sons: Vec<&Character> = unmarried_heirs.iter().copied().filter(|c| c.gender == Gender::Male).collect();
        if sons.is_empty() {
            let daughters: Vec<&Character> =
                unmarried_heirs.iter().copied().filter(|c| c.gender == Gender::Female).collect();
            pick(rng, &daughters)?
        } else {
            pick(rng, &sons)?
        }
    } else if need_heir && leader.marital_status != MaritalStatus::Married {
        leader
    } else {
        return None;
    };

    if subject.canon.is_some() {
        return None;
    }

    let leader_ids: Vec<&CharacterId> = world.houses.iter().filter_map(|h| h.leader_id.as_ref()).collect();

    match subject.gender {
        Gender::Female => {
            let mut candidates: Vec<&Character> = men
                .iter()
                .copied()
                .filter(|m| m.current_house_id != subject.current_house_id && !are_close_kin(m, subject))
                .collect();
            let non_leaders: Vec<&Character> =
                candidates.iter().copied().filter(|m| !leader_ids.contains(&&m.id)).collect();
            if !non_leaders.is_empty() {
                candidates = non_leaders;
            }
            sort_by_relation(world, &subject.current_house_id, &mut candidates);
            let groom = candidates.first()?;
            ai_can_marry(groom, subject).then(|| (groom.id.clone(), subject.id.clone()))
        }
        Gender::Male => {
            let mut candidates: Vec<&Character> = women
                .iter()
                .copied()
                .filter(|f| f.current_house_id != subject.current_house_id && !are_close_kin(f, subject))
                .collect();
            sort_by_relation(world, &subject.current_house_id, &mut candidates);
            let bride = candidates.first()?;
            ai_can_marry(subject, bride).then(|| (subject.id.clone(), bride.id.clone()))
        }
    }
}

fn sort_by_relation(world: &WorldState, from: &HouseId, list: &mut [&Character]) {
    let home = world.house(from);
    list.sort_by_key(|c| std::cmp::Reverse(home.map_or(50, |h| h.relation(&c.current_house_id))));
}
