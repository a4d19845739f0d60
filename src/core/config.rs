//! Simulation configuration with documented constants
//!
//! Every tunable number of the turn pipeline lives here. Per-tier tables
//! (AI spending odds, mission templates) stay next to the systems that use
//! them; this struct holds the scalar knobs a balance pass is likely to touch.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{ChronicleError, Result};

/// Configuration for the simulation systems
///
/// Loaded from TOML with `#[serde(default)]`, so an override file only needs
/// the keys it changes. Unknown keys are rejected to catch typos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    // === CANON ===
    /// Touch score at which a canonical character's scripted fate is bypassed
    pub divergence_threshold: u32,

    /// Turns a postponed canonical birth may wait for its parents
    pub pending_birth_window: i64,

    // === LIFECYCLE ===
    /// Years added to every living character each turn
    pub age_per_turn: f64,

    /// Below this age no natural-death roll happens
    pub death_age_threshold: f64,

    /// Death chance added for every 5 years past the threshold
    ///
    /// At 0.05, a 61-year-old sits on step 2 and dies with chance 0.10.
    pub death_chance_step: f64,

    /// Ceiling of the natural-death ladder
    pub death_chance_max: f64,

    /// Age at which characters may marry, fight and father children
    pub adult_age: f64,

    /// Oldest age at which a woman can conceive
    pub fertile_max_age: f64,

    /// Oldest age at which a man can father a child
    pub male_fertile_max_age: f64,

    // === ECONOMY ===
    /// Food produced per peasant each turn
    pub food_per_peasant: f64,

    /// Food produced per farm each turn
    pub food_per_farm: f64,

    /// Food every house eats on top of its army mass
    pub food_need_floor: i64,

    /// Gold produced per head (peasants plus soldiers)
    pub gold_per_head: f64,

    /// Turns a trade delegation keeps paying out
    pub trade_window: i64,

    /// Flat gold bonus while a delegation is active
    pub trade_base_bonus: i64,

    /// Extra gold per trade partner while a delegation is active
    pub trade_partner_bonus: i64,

    /// Highest tribute rate a suzerain may levy
    pub max_tax_rate: f64,

    /// Starting tribute rate for houses with a suzerain
    pub vassal_tax_rate: f64,

    /// Food deficit that costs one peasant during famine
    pub famine_peasant_divisor: f64,

    /// Food deficit that costs one levy during famine
    pub famine_levy_divisor: f64,

    /// Prestige lost in a famine turn
    pub famine_prestige_loss: i32,

    // === WAR ===
    /// Army power granted per point of the commanding leader's martial
    pub leader_bonus_per_martial: f64,

    /// Martial assumed when a house has no living leader
    pub default_leader_martial: i32,

    /// Floor of side A's win probability
    pub win_chance_min: f64,

    /// Ceiling of side A's win probability
    pub win_chance_max: f64,

    /// Chance that the losing house suffers a siege
    pub siege_chance: f64,

    /// Battle summaries kept per war
    pub battle_log_size: usize,

    /// Prestige moved to the winners (and from the losers) when a war ends
    pub war_settlement_prestige: i32,

    // === FAMILY ===
    /// Arranged marriages are attempted on absolute turns divisible by this
    pub arranged_marriage_interval: i64,

    /// Per-turn conception chance for an eligible married couple
    pub conception_chance: f64,

    /// Length of a pregnancy in turns
    pub pregnancy_turns: u32,

    /// Per-turn miscarriage chance
    pub miscarriage_chance: f64,

    // === MISSIONS ===
    /// Open regional missions kept available to the player
    pub open_mission_target: usize,

    /// Turns a delegated mission needs before it can resolve
    pub delegate_min_turns: i64,

    /// Share of a delegated reward paid to the delegate
    pub delegate_share: f64,

    // === TOURNAMENTS ===
    /// Per-turn chance that some house announces a tournament
    pub tournament_chance: f64,

    /// Turns a tournament stays open after its announcement
    pub tournament_duration: i64,

    // === IRON BANK ===
    /// Minimum payment as a fraction of the borrowed amount
    pub loan_min_payment_rate: f64,

    /// Nominal interest rate shown to the player
    pub loan_interest_rate: f64,

    /// Turns between scheduled payments
    pub loan_term: i64,

    /// Extra turns granted after a missed payment
    pub loan_grace: i64,

    /// Missed payments that trigger the bank's penalty
    pub loan_missed_limit: u32,

    // === RUMORS ===
    /// Per-turn chance of a court rumor
    pub rumor_chance: f64,

    // === NARRATION ===
    /// Lines kept in the narration feed before the oldest is dropped
    pub narration_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Canon
            divergence_threshold: 5,
            pending_birth_window: 100,

            // Lifecycle (55 + 5-year ladder)
            age_per_turn: 0.05,
            death_age_threshold: 55.0,
            death_chance_step: 0.05,
            death_chance_max: 0.95,
            adult_age: 16.0,
            fertile_max_age: 40.0,
            male_fertile_max_age: 60.0,

            // Economy
            food_per_peasant: 0.25,
            food_per_farm: 80.0,
            food_need_floor: 100,
            gold_per_head: 0.06,
            trade_window: 5,
            trade_base_bonus: 30,
            trade_partner_bonus: 12,
            max_tax_rate: 0.6,
            vassal_tax_rate: 0.15,
            famine_peasant_divisor: 45.0,
            famine_levy_divisor: 75.0,
            famine_prestige_loss: 2,

            // War
            leader_bonus_per_martial: 35.0,
            default_leader_martial: 40,
            win_chance_min: 0.05,
            win_chance_max: 0.95,
            siege_chance: 0.22,
            battle_log_size: 20,
            war_settlement_prestige: 2,

            // Family
            arranged_marriage_interval: 5,
            conception_chance: 0.015,
            pregnancy_turns: 15,
            miscarriage_chance: 0.02,

            // Missions
            open_mission_target: 3,
            delegate_min_turns: 3,
            delegate_share: 0.20,

            // Tournaments
            tournament_chance: 0.10,
            tournament_duration: 6,

            // Iron Bank
            loan_min_payment_rate: 0.18,
            loan_interest_rate: 0.12,
            loan_term: 20,
            loan_grace: 10,
            loan_missed_limit: 3,

            rumor_chance: 0.08,
            narration_capacity: 200,
        }
    }
}

impl SimConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an override file; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate().map_err(ChronicleError::Config)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.divergence_threshold == 0 {
            return Err("divergence_threshold must be at least 1".into());
        }

        if self.win_chance_min >= self.win_chance_max {
            return Err(format!(
                "win_chance_min ({}) should be < win_chance_max ({})",
                self.win_chance_min, self.win_chance_max
            ));
        }

        if !(0.0..=1.0).contains(&self.max_tax_rate) {
            return Err(format!("max_tax_rate ({}) must be within 0..=1", self.max_tax_rate));
        }

        if self.vassal_tax_rate > self.max_tax_rate {
            return Err(format!(
                "vassal_tax_rate ({}) should be <= max_tax_rate ({})",
                self.vassal_tax_rate, self.max_tax_rate
            ));
        }

        if self.famine_peasant_divisor <= 0.0 || self.famine_levy_divisor <= 0.0 {
            return Err("Famine divisors must be positive".into());
        }

        if self.arranged_marriage_interval <= 0 || self.loan_term <= 0 {
            return Err("Intervals must be positive".into());
        }

        if self.pregnancy_turns == 0 {
            return Err("pregnancy_turns must be at least 1".into());
        }

        if self.narration_capacity == 0 {
            return Err("narration_capacity must be at least 1".into());
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<SimConfig> = OnceLock::new();

/// Get the global simulation config (initializes with defaults if not set)
pub fn config() -> &'static SimConfig {
    CONFIG.get_or_init(SimConfig::default)
}

/// Set the global simulation config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: SimConfig) -> std::result::Result<(), SimConfig> {
    CONFIG.set(config)
}
