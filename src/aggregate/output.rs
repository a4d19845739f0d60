//! Read-only views of a world for printing and export

use serde::{Deserialize, Serialize};

use crate::aggregate::events::ChronicleEntry;
use crate::aggregate::world::WorldState;
use crate::core::calendar::GameDate;

/// One line of the realm overview
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HouseSummary {
    pub name: String,
    pub leader: Option<String>,
    pub prestige: i32,
    pub gold: i64,
    pub members: usize,
}

/// Serializable snapshot of what a reader of the chronicle sees
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChronicleExport {
    pub date: GameDate,
    pub player: Option<String>,
    pub house: Option<String>,
    pub game_over: Option<String>,
    pub houses: Vec<HouseSummary>,
    pub entries: Vec<ChronicleEntry>,
}

impl ChronicleExport {
    pub fn new(world: &WorldState) -> Self {
        let houses = world
            .houses
            .iter()
            .map(|h| HouseSummary {
                name: h.name.clone(),
                leader: h.leader_id.as_ref().map(|id| world.character_name(id)),
                prestige: h.prestige,
                gold: h.resources.gold,
                members: world.alive_count(&h.id),
            })
            .collect();

        Self {
            date: world.date,
            player: world.player().map(|p| p.name.clone()),
            house: world.player_house().map(|h| h.name.clone()),
            game_over: world.status.over.then(|| world.status.reason.clone()),
            houses,
            entries: world.chronicle.entries.clone(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} | {} of {}\n{} chronicle entries",
            self.date,
            self.player.as_deref().unwrap_or("nobody"),
            self.house.as_deref().unwrap_or("no house"),
            self.entries.len(),
        );
        if let Some(reason) = &self.game_over {
            out.push_str(&format!("\nGame over: {}", reason));
        }
        out
    }

    /// The last `limit` entries, oldest first, one per line
    pub fn render_entries(&self, limit: usize) -> String {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries
            .iter()
            .skip(skip)
            .map(|e| format!("[{}/{}] {}: {}", e.year, e.turn, e.title, e.body))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::house::House;
    use crate::core::types::{HouseId, LocationId, RegionId};
    use crate::data::gazetteer::Gazetteer;

    #[test]
    fn test_render_keeps_latest_entries() {
        let mut world = WorldState::new(Gazetteer::default());
        world.add_house(House::new(HouseId::new("a"), "House A", RegionId::new("r"), LocationId::new("s"), 50));
        for i in 0..5 {
            world.record(format!("Entry {}", i), "body", &["test"]);
        }
        let export = ChronicleExport::new(&world);
        assert_eq!(export.houses.len(), 1);
        let text = export.render_entries(2);
        assert!(text.contains("Entry 3") && text.contains("Entry 4"));
        assert!(!text.contains("Entry 2"));
        assert!(export.summary().contains("5 chronicle entries"));
    }
}
