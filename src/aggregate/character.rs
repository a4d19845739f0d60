//! Characters - the people of the realm
//!
//! Characters are never removed from the world. Death only clears `alive`,
//! so parent, spouse and leader references stay resolvable for the whole game.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::core::calendar::AbsTurn;
use crate::core::config::config;
use crate::core::types::{CanonId, CharacterId, Gender, HouseId, LocationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    Widowed,
}

/// Personal renown tier, derived from martial prowess
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenownTier {
    #[default]
    Common,
    Strong,
    Recognized,
    Imposing,
    Renowned,
}

impl RenownTier {
    pub fn from_martial(martial: i32) -> Self {
        match martial {
            m if m >= 92 => RenownTier::Renowned,
            m if m >= 78 => RenownTier::Imposing,
            m if m >= 62 => RenownTier::Recognized,
            m if m >= 45 => RenownTier::Strong,
            _ => RenownTier::Common,
        }
    }
}

impl fmt::Display for RenownTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RenownTier::Common => "Common",
            RenownTier::Strong => "Strong",
            RenownTier::Recognized => "Recognized",
            RenownTier::Imposing => "Imposing",
            RenownTier::Renowned => "Renowned",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pregnancy {
    pub father_id: CharacterId,
    pub conceived_turn: AbsTurn,
    pub turns_left: u32,
    /// False when the father is not the mother's spouse
    pub legitimate: bool,
}

/// Link from a live character back to its scripted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonLink {
    pub canon_id: CanonId,
    pub birth_turn: Option<AbsTurn>,
    pub death_turn: Option<AbsTurn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub gender: Gender,
    pub alive: bool,
    /// Fractional years, two decimals
    pub age: f64,

    pub birth_house_id: HouseId,
    pub current_house_id: HouseId,
    /// Whether the character is still styled by the birth house after moving
    #[serde(default)]
    pub keeps_birth_name: bool,

    pub father_id: Option<CharacterId>,
    pub mother_id: Option<CharacterId>,
    pub spouse_id: Option<CharacterId>,
    pub marital_status: MaritalStatus,

    pub location_id: LocationId,
    #[serde(default)]
    pub title: Option<String>,

    pub martial: i32,
    pub charm: i32,
    pub beauty: i32,
    pub renown: RenownTier,
    #[serde(default)]
    pub personal_prestige: i32,
    pub likability: i32,

    pub fertile: bool,
    #[serde(default)]
    pub is_bastard: bool,
    #[serde(default)]
    pub pregnancy: Option<Pregnancy>,
    #[serde(default)]
    pub canon: Option<CanonLink>,

    // Player-facing flags
    #[serde(default)]
    pub known_to_player: bool,
    #[serde(default)]
    pub relationship_to_player: i32,
    #[serde(default)]
    pub personal_gold: i64,
    #[serde(default)]
    pub kissed_ids: BTreeSet<CharacterId>,
    #[serde(default)]
    pub injured_until_turn: Option<AbsTurn>,
}

impl Character {
    /// Build a living, single character with middling traits
    pub fn new(
        id: CharacterId,
        name: impl Into<String>,
        gender: Gender,
        age: f64,
        house_id: HouseId,
        location_id: LocationId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            gender,
            alive: true,
            age,
            birth_house_id: house_id.clone(),
            current_house_id: house_id,
            keeps_birth_name: false,
            father_id: None,
            mother_id: None,
            spouse_id: None,
            marital_status: MaritalStatus::Single,
            location_id,
            title: None,
            martial: 40,
            charm: 40,
            beauty: 40,
            renown: RenownTier::from_martial(40),
            personal_prestige: 10,
            likability: 50,
            fertile: true,
            is_bastard: false,
            pregnancy: None,
            canon: None,
            known_to_player: false,
            relationship_to_player: 0,
            personal_gold: 0,
            kissed_ids: BTreeSet::new(),
            injured_until_turn: None,
        }
    }

    pub fn canon_id(&self) -> Option<&CanonId> {
        self.canon.as_ref().map(|c| &c.canon_id)
    }

    pub fn is_married(&self) -> bool {
        self.marital_status == MaritalStatus::Married && self.spouse_id.is_some()
    }

    pub fn is_adult(&self) -> bool {
        self.age >= config().adult_age
    }

    pub fn is_fertile_female(&self) -> bool {
        let cfg = config();
        self.alive
            && self.gender == Gender::Female
            && self.fertile
            && self.age >= cfg.adult_age
            && self.age <= cfg.fertile_max_age
    }

    pub fn is_adult_male(&self) -> bool {
        let cfg = config();
        self.alive
            && self.gender == Gender::Male
            && self.age >= cfg.adult_age
            && self.age <= cfg.male_fertile_max_age
    }

    pub fn is_injured(&self, now: AbsTurn) -> bool {
        self.injured_until_turn.map_or(false, |t| now < t)
    }

    pub fn refresh_renown(&mut self) {
        self.renown = RenownTier::from_martial(self.martial);
    }

    /// Adds to martial, keeping it in 0..=100 and the renown tier in sync
    pub fn adjust_martial(&mut self, delta: i32) {
        self.martial = (self.martial + delta).clamp(0, 100);
        self.refresh_renown();
    }

    pub fn adjust_relationship(&mut self, delta: i32) {
        self.relationship_to_player = (self.relationship_to_player + delta).clamp(0, 100);
    }

    /// Ages by one turn, rounded to two decimals
    pub fn age_one_turn(&mut self) {
        self.age = ((self.age + config().age_per_turn) * 100.0).round() / 100.0;
    }
}

/// Parent and child in either direction
pub fn is_parent_or_child(a: &Character, b: &Character) -> bool {
    a.father_id.as_ref() == Some(&b.id)
        || a.mother_id.as_ref() == Some(&b.id)
        || b.father_id.as_ref() == Some(&a.id)
        || b.mother_id.as_ref() == Some(&a.id)
}

/// Parent/child, or siblings through either parent
pub fn are_close_kin(a: &Character, b: &Character) -> bool {
    if is_parent_or_child(a, b) {
        return true;
    }
    let same_father = a.father_id.is_some() && a.father_id == b.father_id;
    let same_mother = a.mother_id.is_some() && a.mother_id == b.mother_id;
    same_father || same_mother
}
