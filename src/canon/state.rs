//! Divergence bookkeeping persisted with every save
//!
//! Ordered maps and sets keep the serialized form stable between saves.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::core::calendar::AbsTurn;
use crate::core::config::config;
use crate::core::types::{CanonId, WarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonMode {
    /// Every scripted person and event applies; ranged dates take the midpoint
    #[default]
    Strict,
    /// Only anchor people and events apply; ranged dates are rolled
    Anchors,
}

/// A canonical birth waiting for its parents to become available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingBirth {
    pub canon_id: CanonId,
    pub desired_turn: AbsTurn,
    pub expires_turn: AbsTurn,
    pub reason: String,
    /// Last turn the birth was tried; retried at most once per turn
    #[serde(default)]
    pub last_attempt_turn: Option<AbsTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub abs_turn: AbsTurn,
    pub summary: String,
}

/// Running tally of one canonical war
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarState {
    pub score_a: u32,
    pub score_b: u32,
    pub last_battle_turn: AbsTurn,
    pub recent_battles: VecDeque<BattleRecord>,
}

impl Default for WarState {
    fn default() -> Self {
        Self {
            score_a: 0,
            score_b: 0,
            last_battle_turn: -999_999,
            recent_battles: VecDeque::new(),
        }
    }
}

impl WarState {
    pub fn log_battle(&mut self, abs_turn: AbsTurn, summary: String) {
        self.recent_battles.push_back(BattleRecord { abs_turn, summary });
        while self.recent_battles.len() > config().battle_log_size {
            self.recent_battles.pop_front();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonState {
    pub enabled: bool,
    pub mode: CanonMode,
    /// Idempotency keys of every scripted effect already applied
    #[serde(default)]
    pub applied_event_ids: BTreeSet<String>,
    #[serde(default)]
    pub touch_scores: BTreeMap<CanonId, u32>,
    #[serde(default)]
    pub touch_reasons: BTreeMap<CanonId, Vec<String>>,
    #[serde(default)]
    pub death_bypassed: BTreeSet<CanonId>,
    /// Frozen resolutions of ranged dates, keyed `birth:<id>` / `death:<id>`
    #[serde(default)]
    pub resolved_turns: BTreeMap<String, AbsTurn>,
    #[serde(default)]
    pub pending_births: Vec<PendingBirth>,
    #[serde(default)]
    pub active_war_ids: Vec<WarId>,
    #[serde(default)]
    pub war_states: BTreeMap<WarId, WarState>,
}

impl Default for CanonState {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: CanonMode::Strict,
            applied_event_ids: BTreeSet::new(),
            touch_scores: BTreeMap::new(),
            touch_reasons: BTreeMap::new(),
            death_bypassed: BTreeSet::new(),
            resolved_turns: BTreeMap::new(),
            pending_births: Vec::new(),
            active_war_ids: Vec::new(),
            war_states: BTreeMap::new(),
        }
    }
}

impl CanonState {
    pub fn is_applied(&self, key: &str) -> bool {
        self.applied_event_ids.contains(key)
    }

    /// Records `key`; returns false when it was already applied
    pub fn mark_applied(&mut self, key: impl Into<String>) -> bool {
        self.applied_event_ids.insert(key.into())
    }

    pub fn touch_score(&self, id: &CanonId) -> u32 {
        self.touch_scores.get(id).copied().unwrap_or(0)
    }

    /// Adds `max(1, weight)` to the score and returns the new total
    pub fn touch(&mut self, id: &CanonId, reason: &str, weight: u32) -> u32 {
        let score = self.touch_scores.entry(id.clone()).or_insert(0);
        *score = score.saturating_add(weight.max(1));
        let total = *score;
        let reasons = self.touch_reasons.entry(id.clone()).or_default();
        if !reasons.iter().any(|r| r == reason) {
            reasons.push(reason.to_string());
        }
        total
    }

    pub fn is_diverged(&self, id: &CanonId) -> bool {
        self.death_bypassed.contains(id) || self.touch_score(id) >= config().divergence_threshold
    }

    pub fn mark_death_bypassed(&mut self, id: &CanonId) {
        self.death_bypassed.insert(id.clone());
    }

    pub fn war_state_mut(&mut self, id: &WarId) -> &mut WarState {
        self.war_states.entry(id.clone()).or_default()
    }

    pub fn has_pending_birth(&self, id: &CanonId) -> bool {
        self.pending_births.iter().any(|p| &p.canon_id == id)
    }
}
