//! Player commands
//!
//! Every action the player can take between turns. Commands mutate the world
//! synchronously and never move the calendar, except [`Command::EndTurn`].

use serde::{Deserialize, Serialize};

use crate::canon::state::CanonMode;
use crate::core::types::{CharacterId, HouseId, LocationId, MissionId, TournamentId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Travel { to: LocationId },
    Mission(MissionAction),
    Diplomacy(DiplomacyAction),
    Local { target: CharacterId, action: LocalAction },
    Train(TrainingOption),
    Manage(HouseAction),
    JoinTournament { id: TournamentId },
    Canon(CanonControl),
    NameChild { child: CharacterId, name: String },
    EndTurn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionAction {
    Accept(MissionId),
    Complete(MissionId),
    Delegate { id: MissionId, to: CharacterId },
    Abandon(MissionId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiplomacyAction {
    Talk { target: CharacterId },
    Gift { target: CharacterId },
    Audience { house: HouseId },
    /// House-level marriage alliance
    ProposeMarriage { house: HouseId },
    Bank(BankAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankAction {
    Loan(i64),
    PayMinimum,
    PayAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalAction {
    Talk,
    Flowers,
    Drink,
    Hunt,
    Kiss,
    Relations,
    /// `matrilineal` asks to keep the bride's house when she is its last member
    Marry { matrilineal: bool },
}

impl LocalAction {
    pub fn label(self) -> &'static str {
        match self {
            LocalAction::Talk => "talk",
            LocalAction::Flowers => "flowers",
            LocalAction::Drink => "drink",
            LocalAction::Hunt => "hunt",
            LocalAction::Kiss => "kiss",
            LocalAction::Relations => "relations",
            LocalAction::Marry { .. } => "marry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingOption {
    Yard,
    Drill,
    BasicAttire,
    Attire,
    NobleAttire,
    Duel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseAction {
    Farm,
    Recruit,
    Train,
    Delegation,
    WarAid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonControl {
    SetEnabled(bool),
    SetMode(CanonMode),
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// A precondition failed; the world is unchanged and the reason narrated
    Rejected { reason: String },
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied)
    }
}
