//! WorldState - the single mutable aggregate of a running game
//!
//! Every system takes `&mut WorldState` explicitly. Houses and characters are
//! stored in insertion order so iteration (and therefore RNG consumption) is
//! reproducible; the id → index maps are rebuilt after loading a save.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::character::{Character, MaritalStatus};
use crate::aggregate::events::{Chronicle, NarrationFeed};
use crate::aggregate::house::House;
use crate::aggregate::systems::loans::BankDebt;
use crate::aggregate::systems::missions::Mission;
use crate::aggregate::systems::tournaments::Tournament;
use crate::canon::state::CanonState;
use crate::core::calendar::{AbsTurn, GameDate};
use crate::core::error::{ChronicleError, Result};
use crate::core::types::{CharacterId, Gender, HouseId, MissionId, TournamentId};
use crate::data::gazetteer::{Gazetteer, Location};

/// Save format version written by this build
pub const WORLD_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatus {
    pub over: bool,
    #[serde(default)]
    pub reason: String,
}

/// Top-level choices offered to the player between turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuOption {
    Travel,
    Missions,
    Diplomacy,
    Local,
    Training,
    HouseManagement,
    Tournaments,
    Chronicle,
    EndTurn,
}

/// Presentation cursor persisted with the save
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiCursor {
    #[serde(default)]
    pub menu: Vec<MenuOption>,
    /// Newborn children of the player awaiting a name
    #[serde(default)]
    pub pending_name_queue: Vec<CharacterId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub version: u32,
    pub date: GameDate,
    pub status: GameStatus,

    pub player_id: CharacterId,
    pub player_house_id: HouseId,

    pub houses: Vec<House>,
    pub characters: Vec<Character>,

    pub gazetteer: Gazetteer,
    pub canon: CanonState,

    #[serde(default)]
    pub missions: Vec<Mission>,
    #[serde(default)]
    pub tournaments: Vec<Tournament>,
    #[serde(default)]
    pub debt: Option<BankDebt>,

    pub chronicle: Chronicle,
    pub narration: NarrationFeed,
    #[serde(default)]
    pub ui: UiCursor,

    next_serial: u64,

    #[serde(skip)]
    house_index: AHashMap<HouseId, usize>,
    #[serde(skip)]
    character_index: AHashMap<CharacterId, usize>,
}

impl WorldState {
    /// An empty world at the start date. Houses, characters and the player are
    /// filled in by `build_initial_state` or by tests.
    pub fn new(gazetteer: Gazetteer) -> Self {
        Self {
            version: WORLD_VERSION,
            date: GameDate::start(),
            status: GameStatus::default(),
            player_id: CharacterId::new(""),
            player_house_id: HouseId::new(""),
            houses: Vec::new(),
            characters: Vec::new(),
            gazetteer,
            canon: CanonState::default(),
            missions: Vec::new(),
            tournaments: Vec::new(),
            debt: None,
            chronicle: Chronicle::new(),
            narration: NarrationFeed::default(),
            ui: UiCursor::default(),
            next_serial: 1,
            house_index: AHashMap::new(),
            character_index: AHashMap::new(),
        }
    }

    pub fn now(&self) -> AbsTurn {
        self.date.absolute_turn
    }

    fn next_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    /// Generate a new unique CharacterId
    pub fn next_character_id(&mut self) -> CharacterId {
        CharacterId::new(format!("char_{}", self.next_serial()))
    }

    pub fn next_mission_id(&mut self) -> MissionId {
        MissionId::new(format!("mission_{}", self.next_serial()))
    }

    pub fn next_tournament_id(&mut self) -> TournamentId {
        TournamentId::new(format!("tourney_{}", self.next_serial()))
    }

    /// Restore the id → index maps after deserialization
    pub fn rebuild_indices(&mut self) {
        self.house_index = self
            .houses
            .iter()
            .enumerate()
            .map(|(i, h)| (h.id.clone(), i))
            .collect();
        self.character_index = self
            .characters
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
    }

    pub fn add_house(&mut self, house: House) {
        if let Some(&i) = self.house_index.get(&house.id) {
            self.houses[i] = house;
            return;
        }
        self.house_index.insert(house.id.clone(), self.houses.len());
        self.houses.push(house);
    }

    /// Inserts a character; an existing character with the same id is kept
    pub fn add_character(&mut self, character: Character) -> CharacterId {
        let id = character.id.clone();
        if !self.character_index.contains_key(&id) {
            self.character_index.insert(id.clone(), self.characters.len());
            self.characters.push(character);
        }
        id
    }

    pub fn house_idx(&self, id: &HouseId) -> Option<usize> {
        self.house_index.get(id).copied()
    }

    pub fn character_idx(&self, id: &CharacterId) -> Option<usize> {
        self.character_index.get(id).copied()
    }

    pub fn house(&self, id: &HouseId) -> Option<&House> {
        self.house_idx(id).map(|i| &self.houses[i])
    }

    pub fn house_mut(&mut self, id: &HouseId) -> Option<&mut House> {
        let i = self.house_idx(id)?;
        Some(&mut self.houses[i])
    }

    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.character_idx(id).map(|i| &self.characters[i])
    }

    pub fn character_mut(&mut self, id: &CharacterId) -> Option<&mut Character> {
        let i = self.character_idx(id)?;
        Some(&mut self.characters[i])
    }

    /// Two distinct characters borrowed mutably at once
    pub fn character_pair_mut(
        &mut self,
        a: &CharacterId,
        b: &CharacterId,
    ) -> Option<(&mut Character, &mut Character)> {
        let (ia, ib) = (self.character_idx(a)?, self.character_idx(b)?);
        pair_mut(&mut self.characters, ia, ib)
    }

    pub fn house_pair_mut(&mut self, a: &HouseId, b: &HouseId) -> Option<(&mut House, &mut House)> {
        let (ia, ib) = (self.house_idx(a)?, self.house_idx(b)?);
        pair_mut(&mut self.houses, ia, ib)
    }

    pub fn player(&self) -> Option<&Character> {
        self.character(&self.player_id)
    }

    pub fn player_mut(&mut self) -> Option<&mut Character> {
        let id = self.player_id.clone();
        self.character_mut(&id)
    }

    pub fn player_house(&self) -> Option<&House> {
        self.house(&self.player_house_id)
    }

    pub fn player_house_mut(&mut self) -> Option<&mut House> {
        let id = self.player_house_id.clone();
        self.house_mut(&id)
    }

    /// True when the player currently leads their house
    pub fn player_is_leader(&self) -> bool {
        self.player_house()
            .and_then(|h| h.leader_id.as_ref())
            .map_or(false, |leader| leader == &self.player_id)
    }

    pub fn house_ids(&self) -> Vec<HouseId> {
        self.houses.iter().map(|h| h.id.clone()).collect()
    }

    /// Living characters whose current house is `house`
    pub fn members_of<'a>(&'a self, house: &'a HouseId) -> impl Iterator<Item = &'a Character> + 'a {
        self.characters
            .iter()
            .filter(move |c| c.alive && &c.current_house_id == house)
    }

    pub fn alive_count(&self, house: &HouseId) -> usize {
        self.members_of(house).count()
    }

    pub fn location(&self, id: &crate::core::types::LocationId) -> Option<&Location> {
        self.gazetteer.location(id)
    }

    pub fn house_name(&self, id: &HouseId) -> String {
        self.house(id)
            .map(|h| h.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn character_name(&self, id: &CharacterId) -> String {
        self.character(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn title_for(&self, house: &HouseId, gender: Gender) -> String {
        self.gazetteer.title_for(house, gender)
    }

    /// Appends to the player-facing narration feed
    pub fn narrate(&mut self, text: impl Into<String>) {
        let now = self.now();
        self.narration.push(now, text);
    }

    /// Appends a permanent chronicle entry dated today
    pub fn record<S: AsRef<str>>(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        tags: &[S],
    ) -> u32 {
        let date = self.date;
        self.chronicle.record(&date, title, body, tags)
    }

    /// Shifts both directions of a relation pair
    pub fn adjust_relations(&mut self, a: &HouseId, b: &HouseId, a_to_b: i32, b_to_a: i32) {
        if let Some(house) = self.house_mut(a) {
            house.adjust_relation(b, a_to_b);
        }
        if let Some(house) = self.house_mut(b) {
            house.adjust_relation(a, b_to_a);
        }
    }

    /// Installs `leader` at the head of `house` and gives them the house title
    pub fn set_leader(&mut self, house: &HouseId, leader: &CharacterId) {
        let gender = match self.character(leader) {
            Some(c) => c.gender,
            None => return,
        };
        let title = self.title_for(house, gender);
        if let Some(h) = self.house_mut(house) {
            h.leader_id = Some(leader.clone());
        }
        if let Some(c) = self.character_mut(leader) {
            c.title = Some(title);
        }
    }

    /// Links two characters as spouses. Does not move either between houses.
    pub fn link_spouses(&mut self, a: &CharacterId, b: &CharacterId) {
        if let Some((ca, cb)) = self.character_pair_mut(a, b) {
            ca.spouse_id = Some(cb.id.clone());
            cb.spouse_id = Some(ca.id.clone());
            ca.marital_status = MaritalStatus::Married;
            cb.marital_status = MaritalStatus::Married;
        }
    }

    pub fn set_game_over(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::info!(reason = %reason, "Game over");
        self.narrate(format!("Your line has ended: {}", reason));
        self.status = GameStatus { over: true, reason };
    }

    /// Ensures every suzerain exists and the vassal hierarchy has no cycle
    pub fn validate_hierarchy(&self) -> Result<()> {
        if self.houses.is_empty() {
            return Err(ChronicleError::Uninitialized("world has no houses".into()));
        }
        for house in &self.houses {
            let mut seen = vec![&house.id];
            let mut cursor = house.suzerain_id.as_ref();
            while let Some(next) = cursor {
                if seen.contains(&next) {
                    return Err(ChronicleError::SuzerainCycle(house.id.clone()));
                }
                let Some(suzerain) = self.house(next) else {
                    return Err(ChronicleError::HouseNotFound(next.clone()));
                };
                seen.push(next);
                cursor = suzerain.suzerain_id.as_ref();
            }
        }
        if self.character(&self.player_id).is_none() {
            return Err(ChronicleError::CharacterNotFound(self.player_id.clone()));
        }
        if self.house(&self.player_house_id).is_none() {
            return Err(ChronicleError::HouseNotFound(self.player_house_id.clone()));
        }
        Ok(())
    }

    /// Every living married character's spouse points back at them
    pub fn spouse_links_are_mutual(&self) -> bool {
        self.characters
            .iter()
            .filter(|c| c.alive && c.marital_status == MaritalStatus::Married)
            .all(|c| match &c.spouse_id {
                Some(spouse) => self
                    .character(spouse)
                    .and_then(|s| s.spouse_id.as_ref())
                    .map_or(false, |back| back == &c.id),
                None => true,
            })
    }
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> Option<(&mut T, &mut T)> {
    if a == b {
        return None;
    }
    if a < b {
        let (left, right) = items.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else {
        let (left, right) = items.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    }
}
