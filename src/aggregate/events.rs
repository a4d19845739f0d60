//! Chronicle and narration
//!
//! The chronicle is the permanent, persisted record of what happened in the
//! realm. The narration feed is the short rolling log shown to the player.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::calendar::{AbsTurn, GameDate};
use crate::core::config::config;

/// A recorded historical entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChronicleEntry {
    pub id: u32,
    pub abs_turn: AbsTurn,
    pub year: i32,
    pub turn: u8,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

impl ChronicleEntry {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// The complete history log
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Chronicle {
    pub entries: Vec<ChronicleEntry>,
    next_entry_id: u32,
}

impl Chronicle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<S: AsRef<str>>(
        &mut self,
        date: &GameDate,
        title: impl Into<String>,
        body: impl Into<String>,
        tags: &[S],
    ) -> u32 {
        let id = self.next_entry_id;
        self.next_entry_id += 1;

        self.entries.push(ChronicleEntry {
            id,
            abs_turn: date.absolute_turn,
            year: date.year,
            turn: date.turn,
            title: title.into(),
            body: body.into(),
            tags: tags.iter().map(|t| t.as_ref().to_string()).collect(),
        });

        id
    }

    pub fn entries_for_turn(&self, abs_turn: AbsTurn) -> impl Iterator<Item = &ChronicleEntry> {
        self.entries.iter().filter(move |e| e.abs_turn == abs_turn)
    }

    pub fn entries_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a ChronicleEntry> {
        self.entries.iter().filter(move |e| e.has_tag(tag))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ChronicleEntry> {
        self.entries.last()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NarrationLine {
    pub abs_turn: AbsTurn,
    pub text: String,
}

fn default_capacity() -> usize {
    config().narration_capacity
}

/// Rolling narration shown to the player; the oldest line drops when full
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NarrationFeed {
    lines: VecDeque<NarrationLine>,
    #[serde(default = "default_capacity")]
    capacity: usize,
    /// Lines ever pushed, dropped ones included
    #[serde(default)]
    pushed: u64,
}

impl Default for NarrationFeed {
    fn default() -> Self {
        Self::with_capacity(default_capacity())
    }
}

impl NarrationFeed {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
            pushed: 0,
        }
    }

    pub fn push(&mut self, abs_turn: AbsTurn, text: impl Into<String>) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(NarrationLine {
            abs_turn,
            text: text.into(),
        });
        self.pushed += 1;
    }

    /// Running count of pushed lines, for callers that poll the feed
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Kept lines pushed after the feed's count was `mark`
    pub fn since(&self, mark: u64) -> impl Iterator<Item = &NarrationLine> {
        let fresh = self.pushed.saturating_sub(mark).min(self.lines.len() as u64) as usize;
        self.lines.iter().skip(self.lines.len() - fresh)
    }

    pub fn lines(&self) -> impl Iterator<Item = &NarrationLine> {
        self.lines.iter()
    }

    /// The most recent `n` lines, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &NarrationLine> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip)
    }

    pub fn last(&self) -> Option<&NarrationLine> {
        self.lines.back()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True when any kept line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.text.contains(needle))
    }
}
