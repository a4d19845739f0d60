//! Canonical history definitions
//!
//! Scripted people, events, leader mandates and wars loaded from
//! `canon.toml`. Dates are year/turn pairs; a missing turn means turn 10 for
//! points in time and turn 20 for the end of an interval.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::calendar::{abs_turn_or, AbsTurn, DEFAULT_TURN, RANGE_END_TURN};
use crate::core::types::{CanonId, Gender, HouseId, LocationId, WarId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonPersonDef {
    pub canon_id: CanonId,
    pub name: String,
    pub gender: Gender,

    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub birth_turn: Option<u8>,
    #[serde(default)]
    pub birth_year_min: Option<i32>,
    #[serde(default)]
    pub birth_year_max: Option<i32>,

    #[serde(default)]
    pub death_year: Option<i32>,
    #[serde(default)]
    pub death_turn: Option<u8>,
    #[serde(default)]
    pub death_year_min: Option<i32>,
    #[serde(default)]
    pub death_year_max: Option<i32>,

    #[serde(default)]
    pub birth_house_id: Option<HouseId>,
    pub current_house_id: HouseId,
    #[serde(default)]
    pub location_id: Option<LocationId>,

    #[serde(default)]
    pub father_canon_id: Option<CanonId>,
    #[serde(default)]
    pub mother_canon_id: Option<CanonId>,
    #[serde(default)]
    pub spouse_canon_id: Option<CanonId>,

    #[serde(default)]
    pub title: Option<String>,
}

impl CanonPersonDef {
    pub fn birth_house(&self) -> &HouseId {
        self.birth_house_id.as_ref().unwrap_or(&self.current_house_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonEventKind {
    Chronicle,
    Birth,
    Death,
    Succession,
    DynastyShift,
    Tournament,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonTournamentSpec {
    pub host_house_id: HouseId,
    pub location_id: LocationId,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonEventDef {
    pub id: String,
    pub year: i32,
    #[serde(default)]
    pub turn: Option<u8>,
    pub kind: CanonEventKind,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,

    /// Subject of a birth or death
    #[serde(default)]
    pub person_canon_id: Option<CanonId>,
    /// House affected by a succession or dynasty shift
    #[serde(default)]
    pub house_id: Option<HouseId>,
    #[serde(default)]
    pub new_leader_canon_id: Option<CanonId>,
    /// New display name for the house after a dynasty shift
    #[serde(default)]
    pub new_house_name: Option<String>,
    #[serde(default)]
    pub tournament: Option<CanonTournamentSpec>,
}

impl CanonEventDef {
    pub fn abs_turn(&self) -> AbsTurn {
        abs_turn_or(self.year, self.turn, DEFAULT_TURN)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Interval during which a canonical character should lead a house
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonLeaderMandate {
    pub id: String,
    pub house_id: HouseId,
    pub leader_canon_id: CanonId,
    pub from_year: i32,
    #[serde(default)]
    pub from_turn: Option<u8>,
    #[serde(default)]
    pub to_year: Option<i32>,
    #[serde(default)]
    pub to_turn: Option<u8>,
}

impl CanonLeaderMandate {
    pub fn is_active(&self, abs: AbsTurn) -> bool {
        interval_contains(self.from_year, self.from_turn, self.to_year, self.to_turn, abs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarIntensity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonWarDef {
    pub id: WarId,
    pub name: String,
    pub from_year: i32,
    #[serde(default)]
    pub from_turn: Option<u8>,
    #[serde(default)]
    pub to_year: Option<i32>,
    #[serde(default)]
    pub to_turn: Option<u8>,
    pub side_a: Vec<HouseId>,
    pub side_b: Vec<HouseId>,
    pub intensity: WarIntensity,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CanonWarDef {
    pub fn is_active(&self, abs: AbsTurn) -> bool {
        interval_contains(self.from_year, self.from_turn, self.to_year, self.to_turn, abs)
    }

    pub fn side_of(&self, house: &HouseId) -> Option<WarSide> {
        if self.side_a.contains(house) {
            Some(WarSide::A)
        } else if self.side_b.contains(house) {
            Some(WarSide::B)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarSide {
    A,
    B,
}

impl fmt::Display for WarSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarSide::A => f.write_str("A"),
            WarSide::B => f.write_str("B"),
        }
    }
}

fn interval_contains(
    from_year: i32,
    from_turn: Option<u8>,
    to_year: Option<i32>,
    to_turn: Option<u8>,
    abs: AbsTurn,
) -> bool {
    let from = abs_turn_or(from_year, from_turn, DEFAULT_TURN);
    let to = to_year.map(|y| abs_turn_or(y, to_turn, RANGE_END_TURN));
    abs >= from && to.map_or(true, |t| abs <= t)
}

fn default_royal_keywords() -> Vec<String> {
    ["King", "Queen", "Prince", "Princess"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_major_tags() -> Vec<String> {
    ["war", "rebellion", "throne", "leaders", "court", "capital"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// What survives in anchors mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorRules {
    #[serde(default)]
    pub houses: Vec<HouseId>,
    #[serde(default = "default_royal_keywords")]
    pub title_keywords: Vec<String>,
    #[serde(default = "default_major_tags")]
    pub major_tags: Vec<String>,
}

impl Default for AnchorRules {
    fn default() -> Self {
        Self {
            houses: Vec::new(),
            title_keywords: default_royal_keywords(),
            major_tags: default_major_tags(),
        }
    }
}

/// The full read-only canon pack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonPack {
    #[serde(default)]
    pub people: Vec<CanonPersonDef>,
    #[serde(default)]
    pub events: Vec<CanonEventDef>,
    #[serde(default)]
    pub mandates: Vec<CanonLeaderMandate>,
    #[serde(default)]
    pub wars: Vec<CanonWarDef>,
    #[serde(default)]
    pub anchors: AnchorRules,
    /// Canonical ruler installed over the crown house at world creation
    #[serde(default)]
    pub initial_crown_leader: Option<CanonId>,
    #[serde(skip)]
    index: AHashMap<CanonId, usize>,
}

impl CanonPack {
    pub fn new(
        people: Vec<CanonPersonDef>,
        events: Vec<CanonEventDef>,
        mandates: Vec<CanonLeaderMandate>,
        wars: Vec<CanonWarDef>,
    ) -> Self {
        let mut pack = Self {
            people,
            events,
            mandates,
            wars,
            ..Self::default()
        };
        pack.rebuild_index();
        pack
    }

    pub fn rebuild_index(&mut self) {
        self.index = self
            .people
            .iter()
            .enumerate()
            .map(|(i, p)| (p.canon_id.clone(), i))
            .collect();
    }

    pub fn person(&self, id: &CanonId) -> Option<&CanonPersonDef> {
        match self.index.get(id) {
            Some(&i) => self.people.get(i),
            // Packs built by struct literal have no index yet
            None if self.index.is_empty() => self.people.iter().find(|p| &p.canon_id == id),
            None => None,
        }
    }

    pub fn war(&self, id: &WarId) -> Option<&CanonWarDef> {
        self.wars.iter().find(|w| &w.id == id)
    }

    pub fn events_at(&self, abs: AbsTurn) -> impl Iterator<Item = &CanonEventDef> {
        self.events.iter().filter(move |e| e.abs_turn() == abs)
    }

    pub fn is_anchor_person(&self, def: &CanonPersonDef) -> bool {
        let royal_title = def.title.as_ref().map_or(false, |t| {
            self.anchors.title_keywords.iter().any(|k| t.contains(k.as_str()))
        });
        royal_title || self.anchors.houses.contains(&def.current_house_id)
    }

    pub fn is_anchor_event(&self, event: &CanonEventDef) -> bool {
        if event.has_tag("anchor") {
            return true;
        }
        if event.tags.iter().any(|t| self.anchors.major_tags.contains(t)) {
            return true;
        }
        [&event.person_canon_id, &event.new_leader_canon_id]
            .into_iter()
            .flatten()
            .filter_map(|id| self.person(id))
            .any(|def| self.is_anchor_person(def))
    }
}
