//! Load realm and canon data from TOML files

use std::fs;
use std::path::Path;

use crate::canon::defs::CanonPack;
use crate::core::error::{ChronicleError, Result};
use crate::core::types::HouseId;
use crate::data::gazetteer::Gazetteer;

pub const REALM_FILE: &str = "realm.toml";
pub const CANON_FILE: &str = "canon.toml";

/// Everything read from the data directory
#[derive(Debug, Clone)]
pub struct RealmData {
    pub gazetteer: Gazetteer,
    pub canon: CanonPack,
}

pub fn parse_gazetteer(content: &str) -> Result<Gazetteer> {
    let gazetteer: Gazetteer = toml::from_str(content)?;
    gazetteer.validate()?;
    Ok(gazetteer)
}

/// Parses a canon pack and checks it against the gazetteer
pub fn parse_canon(content: &str, gazetteer: &Gazetteer) -> Result<CanonPack> {
    let mut pack: CanonPack = toml::from_str(content)?;
    pack.rebuild_index();
    validate_canon(&pack, gazetteer)?;
    Ok(pack)
}

/// Unknown houses or people in the canon are fatal, except in events
///
/// An event naming an unknown house only logs a warning and is skipped when
/// it fires.
pub fn validate_canon(pack: &CanonPack, gazetteer: &Gazetteer) -> Result<()> {
    let known_house = |id: &HouseId| gazetteer.house_def(id).is_some();

    for person in &pack.people {
        if !known_house(&person.current_house_id) || !known_house(person.birth_house()) {
            return Err(ChronicleError::InvalidData(format!(
                "canon person {} belongs to an unknown house",
                person.canon_id
            )));
        }
        let relatives = [&person.father_canon_id, &person.mother_canon_id, &person.spouse_canon_id];
        for relative in relatives.into_iter().flatten() {
            if pack.person(relative).is_none() {
                return Err(ChronicleError::InvalidData(format!(
                    "canon person {} names unknown relative {}",
                    person.canon_id, relative
                )));
            }
        }
    }

    for mandate in &pack.mandates {
        if !known_house(&mandate.house_id) {
            return Err(ChronicleError::HouseNotFound(mandate.house_id.clone()));
        }
        if pack.person(&mandate.leader_canon_id).is_none() {
            return Err(ChronicleError::InvalidData(format!(
                "mandate {} names unknown leader {}",
                mandate.id, mandate.leader_canon_id
            )));
        }
    }

    for war in &pack.wars {
        if let Some(house) = war.side_a.iter().chain(&war.side_b).find(|h| !known_house(*h)) {
            return Err(ChronicleError::HouseNotFound(house.clone()));
        }
    }

    for event in &pack.events {
        if let Some(house) = event.house_id.as_ref().filter(|h| !known_house(*h)) {
            tracing::warn!(event = %event.id, house = %house, "Canon event names an unknown house");
        }
    }

    if let Some(leader) = &pack.initial_crown_leader {
        if pack.person(leader).is_none() {
            return Err(ChronicleError::InvalidData(format!("unknown initial crown leader {}", leader)));
        }
    }
    Ok(())
}

/// Reads `realm.toml` and `canon.toml` from a data directory
///
/// A missing canon file yields an empty pack.
pub fn load_data_dir(dir: &Path) -> Result<RealmData> {
    let realm = fs::read_to_string(dir.join(REALM_FILE))?;
    let gazetteer = parse_gazetteer(&realm)?;

    let canon_path = dir.join(CANON_FILE);
    let canon = if canon_path.exists() {
        parse_canon(&fs::read_to_string(&canon_path)?, &gazetteer)?
    } else {
        tracing::warn!(path = %canon_path.display(), "No canon file, history runs free");
        CanonPack::default()
    };

    tracing::info!(
        houses = gazetteer.houses.len(),
        locations = gazetteer.locations.len(),
        canon_people = canon.people.len(),
        canon_events = canon.events.len(),
        "Realm data loaded"
    );
    Ok(RealmData { gazetteer, canon })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REALM: &str = r#"
[[regions]]
id = "north"
name = "The North"

[[locations]]
id = "winterfell"
name = "Winterfell"
region_id = "north"

[[houses]]
id = "stark"
name = "House Stark"
region_id = "north"
seat_id = "winterfell"
prestige_base = 80

[names]
male = ["Cregan"]
female = ["Arra"]
"#;

    #[test]
    fn test_parse_realm() {
        let gazetteer = parse_gazetteer(REALM).unwrap();
        assert_eq!(gazetteer.houses.len(), 1);
        assert_eq!(gazetteer.encounter_risk(&"north".into()), 0.10);
    }

    #[test]
    fn test_canon_with_unknown_house_is_rejected() {
        let gazetteer = parse_gazetteer(REALM).unwrap();
        let canon = r#"
[[people]]
canon_id = "cregan"
name = "Cregan Stark"
gender = "male"
current_house_id = "tully"
"#;
        assert!(matches!(
            parse_canon(canon, &gazetteer),
            Err(ChronicleError::InvalidData(_))
        ));
    }

    #[test]
    fn test_canon_index_is_rebuilt() {
        let gazetteer = parse_gazetteer(REALM).unwrap();
        let canon = r#"
initial_crown_leader = "cregan"

[[people]]
canon_id = "cregan"
name = "Cregan Stark"
gender = "male"
birth_year = 108
current_house_id = "stark"
title = "Lord of Winterfell"
"#;
        let pack = parse_canon(canon, &gazetteer).unwrap();
        assert_eq!(pack.person(&"cregan".into()).unwrap().birth_year, Some(108));
    }

    #[test]
    fn test_broken_toml_is_an_error() {
        assert!(matches!(parse_gazetteer("[[regions]"), Err(ChronicleError::TomlError(_))));
    }
}
