//! Houses - the noble families that own land, armies and treasuries

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::calendar::AbsTurn;
use crate::core::config::config;
use crate::core::types::{CharacterId, HouseId, LocationId, RegionId};

/// Relation assumed toward a house with no recorded score
pub const DEFAULT_RELATION: i32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Economy {
    pub peasants: i64,
    pub soldiers: i64,
    pub farms: i64,
    pub training_grounds: i64,
    pub walls: i64,
    /// Share of goods output owed to the suzerain; zero without one
    pub tax_rate: f64,
    pub trade_partners: Vec<HouseId>,
    pub last_delegation_turn: AbsTurn,
}

impl Default for Economy {
    fn default() -> Self {
        Self {
            peasants: 0,
            soldiers: 0,
            farms: 0,
            training_grounds: 0,
            walls: 0,
            tax_rate: 0.0,
            trade_partners: Vec::new(),
            last_delegation_turn: -999,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resources {
    pub gold: i64,
    pub food: i64,
    pub goods: i64,
}

impl Resources {
    /// Removes up to `amount` gold and returns how much was actually taken
    pub fn take_gold(&mut self, amount: i64) -> i64 {
        let taken = amount.clamp(0, self.gold);
        self.gold -= taken;
        taken
    }

    pub fn take_food(&mut self, amount: i64) -> i64 {
        let taken = amount.clamp(0, self.food);
        self.food -= taken;
        taken
    }

    pub fn take_goods(&mut self, amount: i64) -> i64 {
        let taken = amount.clamp(0, self.goods);
        self.goods -= taken;
        taken
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Army {
    pub levies: i64,
    pub men_at_arms: i64,
    pub squires: i64,
    pub knights: i64,
    #[serde(default)]
    pub dragons: i64,
    pub stationed_ratio: f64,
}

impl Default for Army {
    fn default() -> Self {
        Self {
            levies: 0,
            men_at_arms: 0,
            squires: 0,
            knights: 0,
            dragons: 0,
            stationed_ratio: 0.7,
        }
    }
}

impl Army {
    /// Head count of conventional troops
    pub fn mass(&self) -> i64 {
        self.levies + self.men_at_arms + self.squires + self.knights
    }

    /// Weighted combat power; a single dragon outweighs any host
    pub fn power(&self) -> i64 {
        self.levies + self.men_at_arms * 2 + self.squires * 3 + self.knights * 5 + self.dragons * 10_000
    }

    /// Removes a fraction of every conventional tier. Dragons are untouched.
    pub fn apply_loss(&mut self, fraction: f64) {
        let keep = 1.0 - fraction.clamp(0.0, 0.95);
        let shrink = |n: i64| ((n as f64 * keep).floor() as i64).max(0);
        self.levies = shrink(self.levies);
        self.men_at_arms = shrink(self.men_at_arms);
        self.squires = shrink(self.squires);
        self.knights = shrink(self.knights);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub name: String,
    pub region_id: RegionId,
    pub seat_id: LocationId,
    #[serde(default)]
    pub is_crown: bool,
    pub prestige_base: i32,
    /// Current standing, always within 1..=100
    pub prestige: i32,
    pub suzerain_id: Option<HouseId>,
    pub leader_id: Option<CharacterId>,
    #[serde(default)]
    pub relations: AHashMap<HouseId, i32>,
    pub economy: Economy,
    pub resources: Resources,
    pub army: Army,
}

impl House {
    pub fn new(
        id: HouseId,
        name: impl Into<String>,
        region_id: RegionId,
        seat_id: LocationId,
        prestige_base: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            region_id,
            seat_id,
            is_crown: false,
            prestige_base,
            prestige: prestige_base.clamp(1, 100),
            suzerain_id: None,
            leader_id: None,
            relations: AHashMap::new(),
            economy: Economy::default(),
            resources: Resources::default(),
            army: Army::default(),
        }
    }

    pub fn relation(&self, other: &HouseId) -> i32 {
        self.relations.get(other).copied().unwrap_or(DEFAULT_RELATION)
    }

    pub fn set_relation(&mut self, other: &HouseId, value: i32) {
        self.relations.insert(other.clone(), value.clamp(0, 100));
    }

    pub fn adjust_relation(&mut self, other: &HouseId, delta: i32) {
        let value = self.relation(other) + delta;
        self.set_relation(other, value);
    }

    pub fn adjust_prestige(&mut self, delta: i32) {
        self.prestige = (self.prestige + delta).clamp(1, 100);
    }

    /// Economic tier expressed as its gold reserve: 700, 500, 350 or 200
    pub fn tier_gold(&self) -> i64 {
        if self.is_crown {
            return 700;
        }
        match self.prestige_base {
            p if p >= 80 => 700,
            p if p >= 60 => 500,
            p if p >= 45 => 350,
            _ => 200,
        }
    }

    /// Food eaten per turn: army mass plus the household floor
    pub fn food_need(&self) -> i64 {
        self.army.mass() + config().food_need_floor
    }

    /// Keeps the tax invariant: only vassals pay tribute
    pub fn normalize_tax(&mut self) {
        if self.suzerain_id.is_none() {
            self.economy.tax_rate = 0.0;
        } else {
            self.economy.tax_rate = self.economy.tax_rate.clamp(0.0, config().max_tax_rate);
        }
    }
}
