use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::content::{
    self, load_scene_file, AssetDescriptor, GameDescriptor, SceneDescriptor, SceneSource,
};
use crate::persist::{load_json, save_json, scene_key, SceneSnapshot, StateStore};
use crate::sim::{SceneKind, SceneLoadError, SceneLoader, SceneSetup, SceneState};

/// Scene descriptors by id plus the store that holds their snapshots.
/// External scene files are parsed on first load and kept.
pub struct SceneLibrary {
    game: GameDescriptor,
    content_root: PathBuf,
    loaded: HashMap<String, SceneDescriptor>,
    store: Box<dyn StateStore>,
}

impl SceneLibrary {
    pub fn new(
        game: GameDescriptor,
        content_root: impl Into<PathBuf>,
        store: Box<dyn StateStore>,
    ) -> Self {
        Self {
            game,
            content_root: content_root.into(),
            loaded: HashMap::new(),
            store,
        }
    }

    pub fn game(&self) -> &GameDescriptor {
        &self.game
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn StateStore {
        self.store.as_mut()
    }

    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.content_root.join(relative)
    }

    /// Inline descriptor, or an external one that has already been parsed.
    pub fn descriptor(&self, scene_id: &str) -> Option<&SceneDescriptor> {
        match &self.game.scene_entry(scene_id)?.source {
            SceneSource::Inline(descriptor) => Some(descriptor.as_ref()),
            SceneSource::External(_) => self.loaded.get(scene_id),
        }
    }

    /// Entry `type`, then the scene element's `type`, then game.
    pub fn scene_kind(&self, scene_id: &str) -> SceneKind {
        let entry_kind = self
            .game
            .scene_entry(scene_id)
            .and_then(|entry| entry.kind_override);
        entry_kind
            .or_else(|| self.descriptor(scene_id).and_then(|descriptor| descriptor.kind))
            .unwrap_or_default()
    }

    /// Scene-level assets shadow game-level ones with the same id.
    pub fn asset(&self, scene_id: Option<&str>, asset_id: &str) -> Option<&AssetDescriptor> {
        let scene_asset = scene_id
            .and_then(|id| self.descriptor(id))
            .and_then(|descriptor| descriptor.assets.iter().find(|asset| asset.id == asset_id));
        scene_asset.or_else(|| self.game.assets.iter().find(|asset| asset.id == asset_id))
    }

    fn ensure_loaded(&mut self, scene_id: &str) -> Result<(), SceneLoadError> {
        let Some(entry) = self.game.scene_entry(scene_id) else {
            return Err(SceneLoadError::UnknownScene(scene_id.to_string()));
        };
        let SceneSource::External(src) = &entry.source else {
            return Ok(());
        };
        if self.loaded.contains_key(scene_id) {
            return Ok(());
        }
        let path = self.content_root.join(src);
        let descriptor = load_scene_file(&path)?;
        debug!(scene = scene_id, path = %path.display(), "scene_file_parsed");
        self.loaded.insert(scene_id.to_string(), descriptor);
        Ok(())
    }

    fn saved_snapshot(&self, scene_id: &str) -> Option<SceneSnapshot> {
        match load_json::<SceneSnapshot, _>(&*self.store, &scene_key(scene_id)) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(scene = scene_id, error = %error, "scene_snapshot_load_failed");
                None
            }
        }
    }
}

impl SceneLoader for SceneLibrary {
    fn contains_scene(&self, scene_id: &str) -> bool {
        self.game.scene_entry(scene_id).is_some()
    }

    fn build_scene(&mut self, scene_id: &str, rng: &mut SmallRng) -> Result<SceneSetup, SceneLoadError> {
        self.ensure_loaded(scene_id)?;
        let kind = self.scene_kind(scene_id);
        let snapshot = self.saved_snapshot(scene_id);
        let Some(descriptor) = self.descriptor(scene_id) else {
            return Err(SceneLoadError::UnknownScene(scene_id.to_string()));
        };
        Ok(content::build_scene(descriptor, kind, snapshot.as_ref(), rng))
    }

    fn persist_scene(&mut self, scene: &SceneState) {
        let Some(snapshot) = SceneSnapshot::capture(scene) else {
            return;
        };
        match save_json(&mut *self.store, &scene_key(&scene.id), &snapshot) {
            Ok(()) => info!(scene = %scene.id, entries = snapshot.len(), "scene_snapshot_saved"),
            Err(error) => warn!(scene = %scene.id, error = %error, "scene_snapshot_save_failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::parse_game_document;
    use crate::persist::MemoryStore;
    use crate::sim::{Entity, EntityKind, GridPos};
    use rand::SeedableRng;
    use std::fs;

    fn library(raw: &str, root: &Path) -> SceneLibrary {
        let game = parse_game_document(raw, &root.join("game.xml")).expect("game");
        SceneLibrary::new(game, root, Box::new(MemoryStore::default()))
    }

    #[test]
    fn external_scenes_are_parsed_lazily_and_cached() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("cave.xml"),
            r#"<Scene id="cave" width="4" height="3"><Player x="1" y="1"/></Scene>"#,
        )
        .expect("write scene");
        let mut library = library(
            r#"<Game><Scene id="cave" src="cave.xml"/></Game>"#,
            dir.path(),
        );
        assert!(library.descriptor("cave").is_none());

        let mut rng = SmallRng::seed_from_u64(3);
        let setup = library.build_scene("cave", &mut rng).expect("build");
        assert_eq!(setup.scene.width, 4);
        assert_eq!(setup.scene.kind, SceneKind::Game);
        assert!(library.descriptor("cave").is_some());

        fs::remove_file(dir.path().join("cave.xml")).expect("remove");
        assert!(library.build_scene("cave", &mut rng).is_ok());
    }

    #[test]
    fn missing_external_file_is_a_content_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut library = library(
            r#"<Game><Scene id="gone" src="gone.xml"/></Game>"#,
            dir.path(),
        );
        let mut rng = SmallRng::seed_from_u64(3);
        let error = library.build_scene("gone", &mut rng).expect_err("missing file");
        assert!(matches!(error, SceneLoadError::Content(_)));
    }

    #[test]
    fn kind_resolution_prefers_the_entry() {
        let library = library(
            r#"<Game>
                 <Scene id="a" type="ui"/>
                 <Scene id="b"/>
               </Game>"#,
            Path::new("."),
        );
        assert_eq!(library.scene_kind("a"), SceneKind::Ui);
        assert_eq!(library.scene_kind("b"), SceneKind::Game);
    }

    #[test]
    fn persisted_snapshot_feeds_the_next_build() {
        let mut library = library(
            r#"<Game><Scene id="v" width="6" height="6"><Object id="crate" x="1" y="1"/><Player x="0" y="0"/></Scene></Game>"#,
            Path::new("."),
        );
        let mut scene = SceneState::new("v", SceneKind::Game, 6, 6);
        scene.push_entity(Entity::new(EntityKind::Object, GridPos::new(4.0, 4.0)).with_id("crate"));
        scene.push_entity(Entity::new(EntityKind::Player, GridPos::new(2.0, 3.0)));
        library.persist_scene(&scene);

        let mut rng = SmallRng::seed_from_u64(3);
        let setup = library.build_scene("v", &mut rng).expect("build");
        assert_eq!(setup.scene.entity(0).map(|e| e.position), Some(GridPos::new(4.0, 4.0)));
        assert_eq!(setup.player.map(|p| p.position), Some(GridPos::new(2.0, 3.0)));
    }

    #[test]
    fn scene_assets_shadow_game_assets() {
        let library = library(
            r##"<Game>
                 <Assets><Asset id="tree" type="cube3d" placeholder="#0A0"/></Assets>
                 <Scene id="a"><Assets><Asset id="tree" type="cube3d" placeholder="#050"/></Assets></Scene>
               </Game>"##,
            Path::new("."),
        );
        assert_eq!(
            library.asset(Some("a"), "tree").map(|a| a.placeholder.as_str()),
            Some("#050")
        );
        assert_eq!(
            library.asset(None, "tree").map(|a| a.placeholder.as_str()),
            Some("#0A0")
        );
    }
}
