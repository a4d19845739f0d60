//! Static geography and heraldry of the realm
//!
//! Read-only input loaded from `realm.toml`. The simulation never mutates it;
//! live house state is seeded from [`HouseDef`] once at world creation.

use serde::{Deserialize, Serialize};

use crate::core::calendar::abs_turn;
use crate::core::calendar::AbsTurn;
use crate::core::error::{ChronicleError, Result};
use crate::core::rng::GameRng;
use crate::core::types::{Gender, HouseId, LocationId, RegionId};

fn default_encounter_risk() -> f64 {
    0.10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    /// Base chance of a road ambush when leaving a location in this region
    #[serde(default = "default_encounter_risk")]
    pub encounter_risk: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    #[default]
    Seat,
    Town,
    Fortress,
    Port,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub region_id: RegionId,
    #[serde(default)]
    pub kind: LocationKind,
}

/// Undirected road between two locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub a: LocationId,
    pub b: LocationId,
    pub distance: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseDef {
    pub id: HouseId,
    pub name: String,
    pub region_id: RegionId,
    pub seat_id: LocationId,
    pub prestige_base: i32,
    #[serde(default)]
    pub is_crown: bool,
    #[serde(default)]
    pub suzerain_id: Option<HouseId>,
    #[serde(default)]
    pub title_male: Option<String>,
    #[serde(default)]
    pub title_female: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamePools {
    pub male: Vec<String>,
    pub female: Vec<String>,
    #[serde(default)]
    pub epithets: Vec<String>,
}

impl NamePools {
    /// A first name, occasionally followed by an epithet
    pub fn generate(&self, rng: &mut GameRng, gender: Gender) -> String {
        let pool = match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        };
        let mut name = rng
            .pick(pool)
            .cloned()
            .unwrap_or_else(|| "Nameless".to_string());
        if rng.chance(0.18) {
            if let Some(epithet) = rng.pick(&self.epithets) {
                name.push(' ');
                name.push_str(epithet);
            }
        }
        name
    }
}

/// Free-text narrative event fired on an exact date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub year: i32,
    pub turn: u8,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ScheduledEvent {
    pub fn abs_turn(&self) -> AbsTurn {
        abs_turn(self.year, self.turn)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Gazetteer {
    pub regions: Vec<Region>,
    pub locations: Vec<Location>,
    #[serde(default)]
    pub routes: Vec<Route>,
    pub houses: Vec<HouseDef>,
    pub names: NamePools,
    #[serde(default)]
    pub scheduled_events: Vec<ScheduledEvent>,
}

impl Gazetteer {
    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| &r.id == id)
    }

    pub fn location(&self, id: &LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| &l.id == id)
    }

    pub fn house_def(&self, id: &HouseId) -> Option<&HouseDef> {
        self.houses.iter().find(|h| &h.id == id)
    }

    pub fn location_name(&self, id: &LocationId) -> String {
        self.location(id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Destinations reachable in one leg from `from`, with their distance
    pub fn routes_from<'a>(&'a self, from: &'a LocationId) -> impl Iterator<Item = (&'a LocationId, u32)> + 'a {
        self.routes.iter().filter_map(move |r| {
            if &r.a == from {
                Some((&r.b, r.distance))
            } else if &r.b == from {
                Some((&r.a, r.distance))
            } else {
                None
            }
        })
    }

    pub fn route_between(&self, from: &LocationId, to: &LocationId) -> Option<u32> {
        self.routes_from(from).find(|(dest, _)| *dest == to).map(|(_, d)| d)
    }

    pub fn encounter_risk(&self, region: &RegionId) -> f64 {
        self.region(region)
            .map(|r| r.encounter_risk)
            .unwrap_or_else(default_encounter_risk)
    }

    /// Leader title for a house, falling back to "Lord/Lady of <seat>"
    pub fn title_for(&self, house: &HouseId, gender: Gender) -> String {
        let def = self.house_def(house);
        let custom = def.and_then(|d| match gender {
            Gender::Male => d.title_male.clone(),
            Gender::Female => d.title_female.clone(),
        });
        if let Some(title) = custom {
            return title;
        }
        let seat = def
            .map(|d| self.location_name(&d.seat_id))
            .unwrap_or_else(|| house.to_string());
        match gender {
            Gender::Male => format!("Lord of {}", seat),
            Gender::Female => format!("Lady of {}", seat),
        }
    }

    /// Checks every cross-reference; a broken gazetteer is a fatal configuration
    pub fn validate(&self) -> Result<()> {
        for loc in &self.locations {
            if self.region(&loc.region_id).is_none() {
                return Err(ChronicleError::InvalidData(format!(
                    "location {} names unknown region {}",
                    loc.id, loc.region_id
                )));
            }
        }
        for route in &self.routes {
            for end in [&route.a, &route.b] {
                if self.location(end).is_none() {
                    return Err(ChronicleError::LocationNotFound(end.clone()));
                }
            }
        }
        for house in &self.houses {
            if self.region(&house.region_id).is_none() {
                return Err(ChronicleError::InvalidData(format!(
                    "house {} names unknown region {}",
                    house.id, house.region_id
                )));
            }
            if self.location(&house.seat_id).is_none() {
                return Err(ChronicleError::LocationNotFound(house.seat_id.clone()));
            }
            if let Some(suzerain) = &house.suzerain_id {
                if self.house_def(suzerain).is_none() {
                    return Err(ChronicleError::HouseNotFound(suzerain.clone()));
                }
            }
        }
        if self.names.male.is_empty() || self.names.female.is_empty() {
            return Err(ChronicleError::InvalidData("name pools must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Gazetteer {
        Gazetteer {
            regions: vec![Region {
                id: RegionId::new("north"),
                name: "The North".into(),
                encounter_risk: 0.14,
            }],
            locations: vec![
                Location {
                    id: LocationId::new("winterfell"),
                    name: "Winterfell".into(),
                    region_id: RegionId::new("north"),
                    kind: LocationKind::Seat,
                },
                Location {
                    id: LocationId::new("white_harbor"),
                    name: "White Harbor".into(),
                    region_id: RegionId::new("north"),
                    kind: LocationKind::Port,
                },
            ],
            routes: vec![Route {
                a: LocationId::new("winterfell"),
                b: LocationId::new("white_harbor"),
                distance: 2,
            }],
            houses: vec![HouseDef {
                id: HouseId::new("stark"),
                name: "House Stark".into(),
                region_id: RegionId::new("north"),
                seat_id: LocationId::new("winterfell"),
                prestige_base: 85,
                is_crown: false,
                suzerain_id: None,
                title_male: Some("Lord of Winterfell".into()),
                title_female: None,
            }],
            names: NamePools {
                male: vec!["Cregan".into()],
                female: vec!["Alys".into()],
                epithets: vec![],
            },
            scheduled_events: vec![],
        }
    }

    #[test]
    fn test_routes_are_undirected() {
        let g = sample();
        assert_eq!(g.route_between(&"white_harbor".into(), &"winterfell".into()), Some(2));
        assert_eq!(g.route_between(&"winterfell".into(), &"white_harbor".into()), Some(2));
        assert_eq!(g.routes_from(&"winterfell".into()).count(), 1);
    }

    #[test]
    fn test_title_fallback_uses_seat() {
        let g = sample();
        assert_eq!(g.title_for(&"stark".into(), Gender::Male), "Lord of Winterfell");
        assert_eq!(g.title_for(&"stark".into(), Gender::Female), "Lady of Winterfell");
    }

    #[test]
    fn test_validate_catches_unknown_suzerain() {
        let mut g = sample();
        assert!(g.validate().is_ok());
        g.houses[0].suzerain_id = Some(HouseId::new("nobody"));
        assert!(matches!(g.validate(), Err(ChronicleError::HouseNotFound(_))));
    }

    #[test]
    fn test_unknown_region_risk_defaults() {
        let g = sample();
        assert_eq!(g.encounter_risk(&"north".into()), 0.14);
        assert_eq!(g.encounter_risk(&"dorne".into()), 0.10);
    }
}
