//! Text resolution - turns a typed line into a concrete [`Command`]
//!
//! Names are matched case-insensitively against living characters, houses and
//! locations: exact id first, then exact name, then a name prefix.

use crate::aggregate::world::WorldState;
use crate::canon::CanonMode;
use crate::command::types::{
    BankAction, CanonControl, Command, DiplomacyAction, HouseAction, LocalAction, MissionAction,
    TrainingOption,
};
use crate::core::types::{CharacterId, HouseId, LocationId, MissionId, TournamentId};

/// How a name matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    Id,
    ExactName,
    PartialName,
}

/// A character matched by name or id
#[derive(Debug, Clone)]
pub struct CharacterMatch {
    pub id: CharacterId,
    pub name: String,
    pub match_reason: MatchReason,
}

pub const HELP: &str = "\
travel <place>                 | talk <person> | gift <person>
audience <house>               | propose <house>
loan <amount> | pay min | pay all
chat|flowers|drink|hunt|kiss|relations <person>
marry <person> [matrilineal]
train yard|drill|basic|attire|noble|duel
manage farm|recruit|train|delegation|aid
mission accept|complete|abandon <id> | mission delegate <id> <person>
joust <tournament id> | name <child> <name>
canon on|off|strict|anchors   | end";

/// Resolves typed lines against the current world
pub struct CommandResolver<'a> {
    world: &'a WorldState,
}

impl<'a> CommandResolver<'a> {
    pub fn new(world: &'a WorldState) -> Self {
        Self { world }
    }

    pub fn resolve(&self, line: &str) -> std::result::Result<Command, String> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb.to_lowercase(), rest.trim()),
            None => (line.to_lowercase(), ""),
        };

        let command = match verb.as_str() {
            "travel" | "go" => Command::Travel {
                to: self.find_location(rest)?,
            },
            "talk" => Command::Diplomacy(DiplomacyAction::Talk {
                target: self.require_character(rest)?,
            }),
            "gift" => Command::Diplomacy(DiplomacyAction::Gift {
                target: self.require_character(rest)?,
            }),
            "audience" => Command::Diplomacy(DiplomacyAction::Audience {
                house: self.find_house(rest)?,
            }),
            "propose" => Command::Diplomacy(DiplomacyAction::ProposeMarriage {
                house: self.find_house(rest)?,
            }),
            "loan" => {
                let amount = rest.parse::<i64>().map_err(|_| format!("Not an amount: '{}'", rest))?;
                Command::Diplomacy(DiplomacyAction::Bank(BankAction::Loan(amount)))
            }
            "pay" => match rest.to_lowercase().as_str() {
                "min" | "minimum" => Command::Diplomacy(DiplomacyAction::Bank(BankAction::PayMinimum)),
                "all" => Command::Diplomacy(DiplomacyAction::Bank(BankAction::PayAll)),
                other => return Err(format!("Pay what? '{}'", other)),
            },
            "chat" | "flowers" | "drink" | "hunt" | "kiss" | "relations" => {
                let action = match verb.as_str() {
                    "chat" => LocalAction::Talk,
                    "flowers" => LocalAction::Flowers,
                    "drink" => LocalAction::Drink,
                    "hunt" => LocalAction::Hunt,
                    "kiss" => LocalAction::Kiss,
                    _ => LocalAction::Relations,
                };
                Command::Local {
                    target: self.require_character(rest)?,
                    action,
                }
            }
            "marry" => {
                let (who, matrilineal) = match rest.strip_suffix("matrilineal") {
                    Some(who) => (who.trim(), true),
                    None => (rest, false),
                };
                Command::Local {
                    target: self.require_character(who)?,
                    action: LocalAction::Marry { matrilineal },
                }
            }
            "train" => Command::Train(parse_training(rest)?),
            "manage" => Command::Manage(parse_house_action(rest)?),
            "mission" => Command::Mission(self.parse_mission(rest)?),
            "joust" => Command::JoinTournament {
                id: TournamentId::new(rest),
            },
            "name" => {
                let (child, name) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "Usage: name <child> <name>".to_string())?;
                Command::NameChild {
                    child: self.require_character(child)?,
                    name: name.trim().to_string(),
                }
            }
            "canon" => Command::Canon(match rest.to_lowercase().as_str() {
                "on" => CanonControl::SetEnabled(true),
                "off" => CanonControl::SetEnabled(false),
                "strict" => CanonControl::SetMode(CanonMode::Strict),
                "anchors" => CanonControl::SetMode(CanonMode::Anchors),
                other => return Err(format!("Unknown canon setting '{}'", other)),
            }),
            "end" | "next" => Command::EndTurn,
            "" => return Err("Empty command".into()),
            other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };
        Ok(command)
    }

    fn parse_mission(&self, rest: &str) -> std::result::Result<MissionAction, String> {
        let mut parts = rest.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_lowercase();
        let id = MissionId::new(parts.next().ok_or_else(|| "Which mission?".to_string())?);
        Ok(match verb.as_str() {
            "accept" => MissionAction::Accept(id),
            "complete" => MissionAction::Complete(id),
            "abandon" => MissionAction::Abandon(id),
            "delegate" => {
                let who = parts.collect::<Vec<_>>().join(" ");
                MissionAction::Delegate {
                    id,
                    to: self.require_character(&who)?,
                }
            }
            other => return Err(format!("Unknown mission action '{}'", other)),
        })
    }

    fn require_character(&self, spec: &str) -> std::result::Result<CharacterId, String> {
        self.find_character(spec)
            .map(|m| m.id)
            .ok_or_else(|| format!("Nobody called '{}'", spec))
    }

    pub fn find_character(&self, spec: &str) -> Option<CharacterMatch> {
        let spec_lower = spec.trim().to_lowercase();
        if spec_lower.is_empty() {
            return None;
        }
        let living = || self.world.characters.iter().filter(|c| c.alive);

        // Try id, then the full name, then the first name
        if let Some(c) = living().find(|c| c.id.as_str().to_lowercase() == spec_lower) {
            return Some(CharacterMatch {
                id: c.id.clone(),
                name: c.name.clone(),
                match_reason: MatchReason::Id,
            });
        }
        if let Some(c) = living().find(|c| c.name.to_lowercase() == spec_lower) {
            return Some(CharacterMatch {
                id: c.id.clone(),
                name: c.name.clone(),
                match_reason: MatchReason::ExactName,
            });
        }
        living()
            .find(|c| c.name.to_lowercase().starts_with(&spec_lower))
            .map(|c| CharacterMatch {
                id: c.id.clone(),
                name: c.name.clone(),
                match_reason: MatchReason::PartialName,
            })
    }

    pub fn find_house(&self, spec: &str) -> std::result::Result<HouseId, String> {
        let spec_lower = spec.trim().to_lowercase();
        let houses = &self.world.houses;
        houses
            .iter()
            .find(|h| h.id.as_str().to_lowercase() == spec_lower || h.name.to_lowercase() == spec_lower)
            .or_else(|| {
                houses
                    .iter()
                    .find(|h| !spec_lower.is_empty() && h.name.to_lowercase().contains(&spec_lower))
            })
            .map(|h| h.id.clone())
            .ok_or_else(|| format!("No house called '{}'", spec))
    }

    pub fn find_location(&self, spec: &str) -> std::result::Result<LocationId, String> {
        let spec_lower = spec.trim().to_lowercase();
        let locations = &self.world.gazetteer.locations;
        locations
            .iter()
            .find(|l| l.id.as_str().to_lowercase() == spec_lower || l.name.to_lowercase() == spec_lower)
            .or_else(|| {
                locations
                    .iter()
                    .find(|l| !spec_lower.is_empty() && l.name.to_lowercase().starts_with(&spec_lower))
            })
            .map(|l| l.id.clone())
            .ok_or_else(|| format!("No place called '{}'", spec))
    }
}

fn parse_training(spec: &str) -> std::result::Result<TrainingOption, String> {
    Ok(match spec.trim().to_lowercase().as_str() {
        "yard" => TrainingOption::Yard,
        "drill" => TrainingOption::Drill,
        "basic" => TrainingOption::BasicAttire,
        "attire" => TrainingOption::Attire,
        "noble" => TrainingOption::NobleAttire,
        "duel" => TrainingOption::Duel,
        other => return Err(format!("Unknown training '{}'", other)),
    })
}

fn parse_house_action(spec: &str) -> std::result::Result<HouseAction, String> {
    Ok(match spec.trim().to_lowercase().as_str() {
        "farm" => HouseAction::Farm,
        "recruit" => HouseAction::Recruit,
        "train" => HouseAction::Train,
        "delegation" | "trade" => HouseAction::Delegation,
        "aid" | "war_aid" => HouseAction::WarAid,
        other => return Err(format!("Unknown house action '{}'", other)),
    })
}
