use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::sim::entity::DEFAULT_PLACEHOLDER_COLOR;
use crate::sim::scene::SceneKind;

use super::error::{ContentError, ContentErrorCode};
use super::scene::{parse_scene_node, SceneDescriptor};
use super::xml::{descendants_named, XmlReader};

pub const DEFAULT_CUBE_HEIGHT_PX: f64 = 32.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    Mouse,
    Keyboard,
    #[default]
    Both,
}

impl InputMode {
    pub fn from_token(token: &str) -> Self {
        match token {
            "mouse" => Self::Mouse,
            "keyboard" => Self::Keyboard,
            _ => Self::Both,
        }
    }

    pub fn allows_mouse(self) -> bool {
        matches!(self, Self::Mouse | Self::Both)
    }

    pub fn allows_keyboard(self) -> bool {
        matches!(self, Self::Keyboard | Self::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Sprite,
    Cube3d,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetDescriptor {
    pub id: String,
    pub kind: AssetKind,
    pub src: Option<String>,
    pub placeholder: String,
    pub height: f64,
    /// Frame size for sprite sheets; the full image when absent.
    pub frame_width: Option<u32>,
    pub frame_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneSource {
    Inline(Box<SceneDescriptor>),
    /// Path relative to the content root, parsed on first load.
    External(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    pub id: String,
    pub kind_override: Option<SceneKind>,
    pub source: SceneSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameDescriptor {
    pub tile_width: f64,
    pub tile_height: f64,
    pub input_mode: InputMode,
    /// Initial globals in document order.
    pub globals: Vec<(String, String)>,
    pub assets: Vec<AssetDescriptor>,
    /// The first entry is the start scene.
    pub scenes: Vec<SceneEntry>,
    pub file_path: PathBuf,
}

impl GameDescriptor {
    pub fn start_scene(&self) -> Option<&str> {
        self.scenes.first().map(|entry| entry.id.as_str())
    }

    pub fn scene_entry(&self, id: &str) -> Option<&SceneEntry> {
        self.scenes.iter().find(|entry| entry.id == id)
    }
}

pub fn load_game_file(path: &Path) -> Result<GameDescriptor, ContentError> {
    let raw = fs::read_to_string(path).map_err(|source| ContentError::read(path, source))?;
    parse_game_document(&raw, path)
}

pub fn parse_game_document(raw: &str, file_path: &Path) -> Result<GameDescriptor, ContentError> {
    let doc = Document::parse(raw).map_err(|error| ContentError::malformed(file_path, &error))?;
    let reader = XmlReader::new(&doc, file_path);
    let root = doc.root_element();
    if !root.has_tag_name("Game") {
        return Err(reader.error(
            root,
            ContentErrorCode::InvalidRoot,
            format!("expected root <Game>, found <{}>", root.tag_name().name()),
        ));
    }

    let mut globals = Vec::new();
    for globals_node in descendants_named(root, "Globals") {
        for var in descendants_named(globals_node, "Var") {
            let name = reader.required(var, "name")?;
            let value = var.attribute("value").unwrap_or_default().to_string();
            globals.push((name, value));
        }
    }

    let mut assets = Vec::new();
    for assets_node in root
        .children()
        .filter(|child| child.is_element() && child.has_tag_name("Assets"))
    {
        for asset in descendants_named(assets_node, "Asset") {
            assets.push(parse_asset(&reader, asset)?);
        }
    }

    let mut seen = HashSet::new();
    let mut scenes = Vec::new();
    for scene in descendants_named(root, "Scene") {
        let entry = parse_scene_entry(&reader, scene)?;
        if !seen.insert(entry.id.clone()) {
            return Err(reader.error(
                scene,
                ContentErrorCode::DuplicateScene,
                format!("scene id '{}' is declared more than once", entry.id),
            ));
        }
        scenes.push(entry);
    }
    if scenes.is_empty() {
        return Err(ContentError::without_location(
            ContentErrorCode::NoScenes,
            "game declares no <Scene> entries",
            file_path,
        ));
    }

    Ok(GameDescriptor {
        tile_width: reader.integer_or(root, "tileW", 64)? as f64,
        tile_height: reader.integer_or(root, "tileH", 32)? as f64,
        input_mode: InputMode::from_token(reader.attr(root, "inputMode").unwrap_or("both")),
        globals,
        assets,
        scenes,
        file_path: file_path.to_path_buf(),
    })
}

fn parse_scene_entry<'input>(
    reader: &XmlReader<'_, 'input>,
    node: Node<'_, 'input>,
) -> Result<SceneEntry, ContentError> {
    let id = reader.required(node, "id")?;
    let kind_override = reader.attr(node, "type").map(SceneKind::from_token);
    let source = match reader.string(node, "src") {
        Some(src) => SceneSource::External(src),
        None => SceneSource::Inline(Box::new(parse_scene_node(reader, node)?)),
    };
    Ok(SceneEntry {
        id,
        kind_override,
        source,
    })
}

pub(crate) fn parse_asset<'input>(
    reader: &XmlReader<'_, 'input>,
    node: Node<'_, 'input>,
) -> Result<AssetDescriptor, ContentError> {
    let kind = match reader.attr(node, "type") {
        Some("cube3d") => AssetKind::Cube3d,
        _ => AssetKind::Sprite,
    };
    let frame = |name: &str| -> Result<Option<u32>, ContentError> {
        let value = reader.integer_or(node, name, 0)?;
        Ok((value > 0).then_some(value.min(u32::MAX as i64) as u32))
    };
    Ok(AssetDescriptor {
        id: reader.required(node, "id")?,
        kind,
        src: reader.string(node, "src"),
        placeholder: reader.string_or(node, "placeholder", DEFAULT_PLACEHOLDER_COLOR),
        height: reader.integer_or(node, "height", DEFAULT_CUBE_HEIGHT_PX as i64)? as f64,
        frame_width: frame("frameW")?,
        frame_height: frame("frameH")?,
    })
}
