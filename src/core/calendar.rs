//! Realm calendar
//!
//! A year is split into 20 turns. Every scheduled effect is keyed on the
//! absolute turn, a single monotonic counter starting at 1 on turn 1 of the
//! epoch year.

use serde::{Deserialize, Serialize};
use std::fmt;

/// First year of play
pub const EPOCH_YEAR: i32 = 150;

/// Turns in one year
pub const TURNS_PER_YEAR: u8 = 20;

/// Turn assumed when a dated record gives only a year
pub const DEFAULT_TURN: u8 = 10;

/// Turn assumed for the end of an interval that gives only a year
pub const RANGE_END_TURN: u8 = TURNS_PER_YEAR;

/// Monotonic turn counter shared by all schedulers
pub type AbsTurn = i64;

/// `(year - EPOCH_YEAR) * 20 + turn`
pub fn abs_turn(year: i32, turn: u8) -> AbsTurn {
    (year - EPOCH_YEAR) as AbsTurn * TURNS_PER_YEAR as AbsTurn + turn as AbsTurn
}

/// Absolute turn for an optional sub-year turn, falling back to `default_turn`
pub fn abs_turn_or(year: i32, turn: Option<u8>, default_turn: u8) -> AbsTurn {
    abs_turn(year, turn.unwrap_or(default_turn))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDate {
    pub year: i32,
    /// 1..=20
    pub turn: u8,
    pub absolute_turn: AbsTurn,
}

impl GameDate {
    pub fn new(year: i32, turn: u8) -> Self {
        Self {
            year,
            turn,
            absolute_turn: abs_turn(year, turn),
        }
    }

    /// Turn 1 of the epoch year
    pub fn start() -> Self {
        Self::new(EPOCH_YEAR, 1)
    }

    pub fn from_absolute(abs: AbsTurn) -> Self {
        let per_year = TURNS_PER_YEAR as AbsTurn;
        let zero_based = abs - 1;
        let year = EPOCH_YEAR + zero_based.div_euclid(per_year) as i32;
        let turn = (zero_based.rem_euclid(per_year) + 1) as u8;
        Self {
            year,
            turn,
            absolute_turn: abs,
        }
    }

    /// Move forward one turn, rolling into the next year after turn 20
    pub fn advance(&mut self) {
        self.absolute_turn += 1;
        self.turn += 1;
        if self.turn > TURNS_PER_YEAR {
            self.turn = 1;
            self.year += 1;
        }
    }
}

impl Default for GameDate {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AC, turn {}/{}", self.year, self.turn, TURNS_PER_YEAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abs_turn_formula() {
        assert_eq!(abs_turn(150, 1), 1);
        assert_eq!(abs_turn(150, 20), 20);
        assert_eq!(abs_turn(151, 1), 21);
        assert_eq!(abs_turn(161, 10), 230);
    }

    #[test]
    fn test_advance_rolls_over_year() {
        let mut date = GameDate::new(150, 19);
        date.advance();
        assert_eq!((date.year, date.turn, date.absolute_turn), (150, 20, 20));
        date.advance();
        assert_eq!((date.year, date.turn, date.absolute_turn), (151, 1, 21));
    }

    #[test]
    fn test_from_absolute_matches_new() {
        for abs in 1..200 {
            let date = GameDate::from_absolute(abs);
            assert_eq!(GameDate::new(date.year, date.turn), date);
        }
    }

    #[test]
    fn test_before_epoch() {
        let date = GameDate::from_absolute(0);
        assert_eq!((date.year, date.turn), (149, 20));
        assert_eq!(abs_turn(149, 20), 0);
    }
}
