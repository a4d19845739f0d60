//! Save migration
//!
//! Older saves are upgraded on the raw JSON, one version step at a time, before
//! they are deserialized. Each step only adds what its version lacked, so a
//! save already at the current version passes through untouched.

use serde_json::{json, Map, Value};

use crate::aggregate::world::{WorldState, WORLD_VERSION};
use crate::canon::state::CanonState;
use crate::core::config::config;
use crate::core::error::{ChronicleError, Result};
use crate::core::rng::GameRng;

/// Upgrades a raw saved world and deserializes it
pub fn migrate(mut value: Value) -> Result<WorldState> {
    let version = value.get("version").and_then(Value::as_u64).unwrap_or(0) as u32;
    if version > WORLD_VERSION {
        return Err(ChronicleError::Migration(format!(
            "save version {} is newer than this build ({})",
            version, WORLD_VERSION
        )));
    }
    if !value.is_object() {
        return Err(ChronicleError::Migration("saved world is not an object".into()));
    }

    if version < 1 {
        v0_to_v1(&mut value)?;
        tracing::info!(from = version, to = 1, "Save migrated");
    }

    let mut world: WorldState = serde_json::from_value(value)?;
    world.rebuild_indices();
    Ok(world)
}

/// Migrates and returns the world with a generator seeded for its current turn
pub fn restore(value: Value) -> Result<(WorldState, GameRng)> {
    let world = migrate(value)?;
    let rng = GameRng::for_turn(world.now());
    Ok((world, rng))
}

fn fill(object: &mut Map<String, Value>, key: &str, default: Value) {
    object.entry(key.to_string()).or_insert(default);
}

fn objects_in<'a>(root: &'a mut Map<String, Value>, key: &str) -> impl Iterator<Item = &'a mut Map<String, Value>> {
    root.get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
}

fn v0_to_v1(value: &mut Value) -> Result<()> {
    let root = value
        .as_object_mut()
        .ok_or_else(|| ChronicleError::Migration("saved world is not an object".into()))?;

    // 1. Characters
    for c in objects_in(root, "characters") {
        fill(c, "personal_prestige", json!(0));
        fill(c, "personal_gold", json!(0));
        fill(c, "kissed_ids", json!([]));
        fill(c, "is_bastard", json!(false));
        fill(c, "known_to_player", json!(false));
        fill(c, "relationship_to_player", json!(0));
    }

    // 2. Houses
    let vassal_rate = config().vassal_tax_rate;
    for h in objects_in(root, "houses") {
        let has_suzerain = h.get("suzerain_id").map_or(false, |s| !s.is_null());
        if let Some(army) = h.get_mut("army").and_then(Value::as_object_mut) {
            fill(army, "dragons", json!(0));
        }
        if let Some(resources) = h.get_mut("resources").and_then(Value::as_object_mut) {
            fill(resources, "goods", json!(0));
        }
        if let Some(economy) = h.get_mut("economy").and_then(Value::as_object_mut) {
            fill(economy, "tax_rate", json!(if has_suzerain { vassal_rate } else { 0.0 }));
            fill(economy, "trade_partners", json!([]));
            fill(economy, "last_delegation_turn", json!(-999));
            fill(economy, "walls", json!(0));
            fill(economy, "training_grounds", json!(0));
        }
    }

    // 3. Canon state
    match root.get_mut("canon").and_then(Value::as_object_mut) {
        Some(canon) => {
            fill(canon, "enabled", json!(true));
            fill(canon, "mode", json!("strict"));
        }
        None => {
            root.insert("canon".into(), serde_json::to_value(CanonState::default())?);
        }
    }

    // 4. Tournaments, missions and game status
    fill(root, "tournaments", json!([]));
    fill(root, "missions", json!([]));
    fill(root, "status", json!({ "over": false, "reason": "" }));

    // 5. Bookkeeping the first format never wrote
    if let Some(chronicle) = root.get_mut("chronicle").and_then(Value::as_object_mut) {
        let count = chronicle.get("entries").and_then(Value::as_array).map_or(0, Vec::len);
        fill(chronicle, "next_entry_id", json!(count));
    } else {
        root.insert("chronicle".into(), json!({ "entries": [], "next_entry_id": 0 }));
    }
    fill(root, "narration", json!({ "lines": [] }));
    let serial = next_free_serial(root);
    fill(root, "next_serial", json!(serial));

    root.insert("version".into(), json!(1));
    Ok(())
}

/// One past the largest numeric suffix of any generated id
fn next_free_serial(root: &Map<String, Value>) -> u64 {
    ["characters", "missions", "tournaments"]
        .iter()
        .filter_map(|key| root.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(|item| item.get("id").and_then(Value::as_str))
        .filter_map(|id| id.rsplit_once('_').and_then(|(_, n)| n.parse::<u64>().ok()))
        .max()
        .map_or(1, |n| n + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::house::House;
    use crate::core::types::{HouseId, LocationId, RegionId};
    use crate::data::gazetteer::Gazetteer;

    fn v0_save() -> Value {
        let mut world = WorldState::new(Gazetteer::default());
        let mut house = House::new(HouseId::new("h"), "House H", RegionId::new("r"), LocationId::new("s"), 50);
        house.suzerain_id = Some(HouseId::new("crown"));
        world.add_house(house);
        world.add_character(crate::aggregate::character::Character::new(
            crate::core::types::CharacterId::new("char_41"),
            "Old Timer",
            crate::core::types::Gender::Male,
            40.0,
            HouseId::new("h"),
            LocationId::new("s"),
        ));
        let mut value = serde_json::to_value(&world).unwrap();
        let root = value.as_object_mut().unwrap();
        root.remove("version");
        root.remove("canon");
        root.remove("status");
        root.remove("tournaments");
        root.remove("next_serial");
        let house = &mut root["houses"][0];
        house["economy"].as_object_mut().unwrap().remove("tax_rate");
        house["resources"].as_object_mut().unwrap().remove("goods");
        let c = root["characters"][0].as_object_mut().unwrap();
        c.remove("kissed_ids");
        c.remove("personal_gold");
        value
    }

    #[test]
    fn test_v0_backfills() {
        let world = migrate(v0_save()).unwrap();
        assert_eq!(world.version, WORLD_VERSION);
        assert!(world.canon.enabled);
        assert!(!world.status.over);
        let house = world.house(&HouseId::new("h")).unwrap();
        assert_eq!(house.resources.goods, 0);
        assert!((house.economy.tax_rate - config().vassal_tax_rate).abs() < 1e-9);
        assert!(world.character(&crate::core::types::CharacterId::new("char_41")).is_some());
    }

    #[test]
    fn test_serial_continues_after_existing_ids() {
        let mut world = migrate(v0_save()).unwrap();
        assert_eq!(world.next_character_id().as_str(), "char_42");
    }

    #[test]
    fn test_current_version_passes_through() {
        let world = WorldState::new(Gazetteer::default());
        let value = serde_json::to_value(&world).unwrap();
        let (restored, rng) = restore(value).unwrap();
        assert_eq!(restored.now(), world.now());
        assert_eq!(rng.seed(), GameRng::for_turn(world.now()).seed());
    }

    #[test]
    fn test_newer_version_rejected() {
        let value = json!({ "version": WORLD_VERSION + 1 });
        assert!(matches!(migrate(value), Err(ChronicleError::Migration(_))));
    }
}
