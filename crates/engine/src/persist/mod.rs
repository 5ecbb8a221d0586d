mod atomic_io;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{Entity, GridPos, SceneState};

use atomic_io::write_text_atomic;

pub const GLOBALS_KEY: &str = "ISO_GLOBALS";
pub const INVENTORY_KEY: &str = "ISO_INVENTORY";
pub const SCENE_KEY_PREFIX: &str = "ISO_SCENE_";
pub const PLAYER_SNAPSHOT_KEY: &str = "player";

pub fn scene_key(scene_id: &str) -> String {
    format!("{SCENE_KEY_PREFIX}{scene_id}")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode '{key}' at {json_path}: {source}")]
    Decode {
        key: String,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String key/value persistence.
pub trait StateStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-') {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_stem}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path_for(key);
        write_text_atomic(&path, &value).map_err(|source| StoreError::Write { path, source })
    }
}

pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: StateStore + ?Sized,
{
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer)
        .map(Some)
        .map_err(|error| {
            let json_path = error.path().to_string();
            StoreError::Decode {
                key: key.to_string(),
                json_path,
                source: error.into_inner(),
            }
        })
}

pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
    S: StateStore + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, encoded)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub gx: f64,
    pub gy: f64,
    #[serde(default)]
    pub vars: BTreeMap<String, serde_json::Value>,
}

/// Positions of the player and every entity with an id, keyed by snapshot key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneSnapshot {
    entries: BTreeMap<String, EntitySnapshot>,
}

impl SceneSnapshot {
    /// Only game scenes are captured.
    pub fn capture(scene: &SceneState) -> Option<Self> {
        if !scene.is_game() {
            return None;
        }
        let entries = scene
            .entities()
            .iter()
            .filter_map(|entity| {
                let key = snapshot_key(entity)?;
                Some((
                    key.to_string(),
                    EntitySnapshot {
                        gx: entity.position.x,
                        gy: entity.position.y,
                        vars: BTreeMap::new(),
                    },
                ))
            })
            .collect();
        Some(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&EntitySnapshot> {
        self.entries.get(key)
    }

    pub fn position_for(&self, entity: &Entity) -> Option<GridPos> {
        let key = snapshot_key(entity)?;
        self.entries
            .get(key)
            .map(|snapshot| GridPos::new(snapshot.gx, snapshot.gy))
    }
}

pub fn snapshot_key(entity: &Entity) -> Option<&str> {
    if entity.is_player() {
        return Some(PLAYER_SNAPSHOT_KEY);
    }
    entity.id.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{EntityKind, SceneKind};

    fn scene_with_entities() -> SceneState {
        let mut scene = SceneState::new("village", SceneKind::Game, 8, 8);
        scene.push_entity(Entity::new(EntityKind::Object, GridPos::new(1.0, 1.0)).with_id("chest"));
        scene.push_entity(Entity::new(EntityKind::Object, GridPos::new(2.0, 2.0)));
        scene.push_entity(Entity::new(EntityKind::Player, GridPos::new(3.5, 4.0)));
        scene
    }

    #[test]
    fn capture_keeps_player_and_identified_entities() {
        let snapshot = SceneSnapshot::capture(&scene_with_entities()).expect("game scene");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("chest").map(|s| (s.gx, s.gy)), Some((1.0, 1.0)));
        assert_eq!(snapshot.get(PLAYER_SNAPSHOT_KEY).map(|s| (s.gx, s.gy)), Some((3.5, 4.0)));
    }

    #[test]
    fn ui_scenes_are_not_captured() {
        let scene = SceneState::new("menu", SceneKind::Ui, 1, 1);
        assert!(SceneSnapshot::capture(&scene).is_none());
    }

    #[test]
    fn snapshot_json_matches_storage_layout() {
        let snapshot = SceneSnapshot::capture(&scene_with_entities()).expect("game scene");
        let json = serde_json::to_string(&snapshot).expect("encode");
        assert_eq!(
            json,
            r#"{"chest":{"gx":1.0,"gy":1.0,"vars":{}},"player":{"gx":3.5,"gy":4.0,"vars":{}}}"#
        );
    }

    #[test]
    fn file_store_round_trips_and_misses_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = JsonFileStore::new(dir.path());
        assert_eq!(store.get(GLOBALS_KEY).expect("get"), None);

        let snapshot = SceneSnapshot::capture(&scene_with_entities()).expect("game scene");
        save_json(&mut store, &scene_key("village"), &snapshot).expect("save");
        let loaded: SceneSnapshot = load_json(&store, &scene_key("village"))
            .expect("load")
            .expect("present");
        assert_eq!(loaded, snapshot);
        assert!(store.path_for("ISO_SCENE_village").is_file());
    }

    #[test]
    fn decode_errors_name_the_failing_field() {
        let mut store = MemoryStore::default();
        store
            .set("ISO_SCENE_x", r#"{"chest":{"gx":"left","gy":1}}"#.to_string())
            .expect("set");
        let error = load_json::<SceneSnapshot, _>(&store, "ISO_SCENE_x").expect_err("bad json");
        match error {
            StoreError::Decode { json_path, .. } => assert_eq!(json_path, "chest.gx"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn file_names_are_sanitized() {
        let store = JsonFileStore::new("/tmp/saves");
        assert_eq!(
            store.path_for("ISO_SCENE_a/b c"),
            PathBuf::from("/tmp/saves/ISO_SCENE_a_b_c.json")
        );
    }
}
