mod build;
mod error;
mod game;
mod scene;
mod xml;

pub use build::{build_scene, instantiate, SPAWNER_MAX_ATTEMPTS};
pub use error::{ContentError, ContentErrorCode, SourceLocation};
pub use game::{
    load_game_file, parse_game_document, AssetDescriptor, AssetKind, GameDescriptor, InputMode,
    SceneEntry, SceneSource, DEFAULT_CUBE_HEIGHT_PX,
};
pub use scene::{
    load_scene_file, parse_scene_document, EntityDescriptor, SceneDescriptor, SpawnerDescriptor,
    UiElementDescriptor, UiElementKind, UiLength, DEFAULT_FAIL_MESSAGE,
};
