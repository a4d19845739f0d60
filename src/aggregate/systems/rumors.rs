//! Court rumors and dated events from the realm data

use crate::aggregate::world::WorldState;
use crate::core::config::config;
use crate::core::rng::GameRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RumorKind {
    Marriage,
    BorderTension,
    TributeDispute,
    Conspiracy,
}

impl RumorKind {
    const ALL: [RumorKind; 4] = [
        RumorKind::Marriage,
        RumorKind::BorderTension,
        RumorKind::TributeDispute,
        RumorKind::Conspiracy,
    ];

    fn title(self) -> &'static str {
        match self {
            RumorKind::Marriage => "Marriage rumors",
            RumorKind::BorderTension => "Border tension",
            RumorKind::TributeDispute => "Tribute dispute",
            RumorKind::Conspiracy => "Whispers of conspiracy",
        }
    }

    fn body(self, a: &str, b: &str) -> String {
        match self {
            RumorKind::Marriage => format!("Whispers speak of a match between {} and {}.", a, b),
            RumorKind::BorderTension => format!("Patrols report tension between {} and {}.", a, b),
            RumorKind::TributeDispute => format!("Merchants complain of tolls between {} and {}.", a, b),
            RumorKind::Conspiracy => format!("The court talks of a plot involving {} and {}.", a, b),
        }
    }

    fn tags(self) -> &'static [&'static str] {
        match self {
            RumorKind::Marriage => &["rumor", "marriage", "politics"],
            RumorKind::BorderTension => &["rumor", "politics"],
            RumorKind::TributeDispute => &["rumor", "economy"],
            RumorKind::Conspiracy => &["rumor", "court"],
        }
    }
}

/// Mood between two houses as read from their relation
pub fn mood(relation: i32) -> &'static str {
    if relation >= 60 {
        "friendly"
    } else if relation <= 40 {
        "hostile"
    } else {
        "uncertain"
    }
}

/// Occasionally chronicles a rumor about two houses
///
/// The player hears it only when their house or region is involved.
pub fn tick_rumors(world: &mut WorldState, rng: &mut GameRng) -> Option<RumorKind> {
    if !rng.chance(config().rumor_chance) {
        return None;
    }
    let n = world.houses.len();
    if n < 2 {
        return None;
    }
    let ia = rng.int(0, n as i64 - 1) as usize;
    let mut ib = rng.int(0, n as i64 - 1) as usize;
    if ia == ib {
        ib = (ia + 1) % n;
    }
    let kind = RumorKind::ALL[rng.int(0, RumorKind::ALL.len() as i64 - 1) as usize];

    let (a, b) = (&world.houses[ia], &world.houses[ib]);
    let body = kind.body(&a.name, &b.name);
    let relation = a.relation(&b.id);
    let involves_player = world.player_house().map_or(false, |p| {
        a.id == p.id || b.id == p.id || a.region_id == p.region_id || b.region_id == p.region_id
    });

    world.record(
        kind.title(),
        format!("{} Mood between the houses: {}.", body, mood(relation)),
        kind.tags(),
    );
    if involves_player {
        world.narrate(format!("{}: {}", kind.title(), body));
    }
    Some(kind)
}

/// Fires the gazetteer's free-text events dated today
pub fn fire_scheduled_events(world: &mut WorldState) -> usize {
    let now = world.now();
    let due: Vec<_> = world
        .gazetteer
        .scheduled_events
        .iter()
        .filter(|e| e.abs_turn() == now)
        .cloned()
        .collect();
    for event in &due {
        world.record(event.title.clone(), event.body.clone(), event.tags.as_slice());
        world.narrate(format!("{}: {}", event.title, event.body));
    }
    due.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::house::House;
    use crate::core::types::{HouseId, LocationId, RegionId};
    use crate::data::gazetteer::{Gazetteer, ScheduledEvent};

    fn world() -> WorldState {
        let gazetteer = Gazetteer {
            scheduled_events: vec![ScheduledEvent {
                year: 150,
                turn: 2,
                title: "A comet".into(),
                body: "A red comet crosses the sky.".into(),
                tags: vec!["omen".into()],
            }],
            ..Gazetteer::default()
        };
        let mut world = WorldState::new(gazetteer);
        for (id, region) in [("a", "north"), ("b", "south")] {
            world.add_house(House::new(
                HouseId::new(id),
                format!("House {}", id),
                RegionId::new(region),
                LocationId::new("seat"),
                50,
            ));
        }
        world
    }

    #[test]
    fn test_mood_thresholds() {
        assert_eq!(mood(60), "friendly");
        assert_eq!(mood(59), "uncertain");
        assert_eq!(mood(40), "hostile");
    }

    #[test]
    fn test_rumor_never_pairs_a_house_with_itself() {
        let mut world = world();
        let mut rng = GameRng::new(12);
        let mut fired = 0;
        for _ in 0..500 {
            if tick_rumors(&mut world, &mut rng).is_some() {
                fired += 1;
            }
        }
        assert!(fired > 0);
        assert_eq!(world.chronicle.len(), fired);
        for entry in &world.chronicle.entries {
            assert!(entry.body.contains("House a") && entry.body.contains("House b"));
        }
    }

    #[test]
    fn test_scheduled_event_fires_on_its_date() {
        let mut world = world();
        assert_eq!(fire_scheduled_events(&mut world), 0);
        world.date.advance();
        assert_eq!(fire_scheduled_events(&mut world), 1);
        assert_eq!(world.chronicle.len(), 1);
    }
}
