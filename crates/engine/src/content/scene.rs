use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};

use crate::rules::Condition;
use crate::sim::entity::{
    Attachment, AttachmentKind, Behavior, Interaction, DEFAULT_ENTITY_SPEED,
    DEFAULT_PLACEHOLDER_COLOR,
};
use crate::sim::grid::{BorderDirection, SceneAdjacency};
use crate::sim::scene::{SceneKind, DEFAULT_SCENE_HEIGHT, DEFAULT_SCENE_WIDTH};

use super::error::{ContentError, ContentErrorCode};
use super::game::{parse_asset, AssetDescriptor};
use super::xml::{child_elements, descendants_named, first_child_named, XmlReader};

pub const DEFAULT_FAIL_MESSAGE: &str = "Conditions not met";
pub const DEFAULT_SPAWNER_COUNT: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiLength {
    Px(f64),
    Percent(f64),
}

impl UiLength {
    fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if let Some(percent) = trimmed.strip_suffix('%') {
            return percent.trim().parse().ok().map(Self::Percent);
        }
        let number = trimmed.strip_suffix("px").unwrap_or(trimmed);
        number.trim().parse().ok().map(Self::Px)
    }

    pub fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Px(value) => value,
            Self::Percent(value) => extent * value / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiElementKind {
    Button,
    Image,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiElementDescriptor {
    pub kind: UiElementKind,
    /// Raw content, templates unexpanded.
    pub content: String,
    pub src: Option<String>,
    pub top: Option<UiLength>,
    pub left: Option<UiLength>,
    pub bottom: Option<UiLength>,
    pub right: Option<UiLength>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<String>,
    pub background: Option<String>,
    pub hover_background: Option<String>,
    pub size_px: Option<f64>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub id: Option<String>,
    pub x: f64,
    pub y: f64,
    pub asset: Option<String>,
    pub asset_base_path: Option<String>,
    pub speed: f64,
    pub collision: bool,
    pub behavior: Behavior,
    pub wander_radius: f64,
    pub aggro_radius: f64,
    pub placeholder: String,
    pub interaction: Option<Interaction>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnerDescriptor {
    pub count: u32,
    pub template: EntityDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescriptor {
    pub id: String,
    /// Only set when the `<Scene>` element carries a `type` attribute.
    pub kind: Option<SceneKind>,
    pub width: i32,
    pub height: i32,
    pub background: Option<String>,
    pub adjacency: SceneAdjacency,
    pub assets: Vec<AssetDescriptor>,
    pub hud: Vec<UiElementDescriptor>,
    pub ui: Vec<UiElementDescriptor>,
    pub objects: Vec<EntityDescriptor>,
    pub mobs: Vec<EntityDescriptor>,
    pub spawners: Vec<SpawnerDescriptor>,
    pub player: Option<EntityDescriptor>,
}

pub fn load_scene_file(path: &Path) -> Result<SceneDescriptor, ContentError> {
    let raw = fs::read_to_string(path).map_err(|source| ContentError::read(path, source))?;
    parse_scene_document(&raw, path)
}

/// Parses a standalone scene file whose root element is `<Scene>`.
pub fn parse_scene_document(raw: &str, file_path: &Path) -> Result<SceneDescriptor, ContentError> {
    let doc = Document::parse(raw).map_err(|error| ContentError::malformed(file_path, &error))?;
    let reader = XmlReader::new(&doc, file_path);
    let root = doc.root_element();
    if !root.has_tag_name("Scene") {
        return Err(reader.error(
            root,
            ContentErrorCode::InvalidRoot,
            format!("expected root <Scene>, found <{}>", root.tag_name().name()),
        ));
    }
    parse_scene_node(&reader, root)
}

pub(crate) fn parse_scene_node<'input>(
    reader: &XmlReader<'_, 'input>,
    node: Node<'_, 'input>,
) -> Result<SceneDescriptor, ContentError> {
    let id = reader.required(node, "id")?;
    let kind = reader.attr(node, "type").map(SceneKind::from_token);

    let mut adjacency = SceneAdjacency::default();
    for direction in BorderDirection::ALL {
        adjacency.set(direction, reader.string(node, direction.as_token()));
    }

    let mut assets = Vec::new();
    if let Some(assets_node) = first_child_named(node, "Assets") {
        for asset in descendants_named(assets_node, "Asset") {
            assets.push(parse_asset(reader, asset)?);
        }
    }

    let hud = match first_child_named(node, "HUD") {
        Some(hud_node) => parse_ui_children(reader, hud_node)?,
        None => Vec::new(),
    };
    let ui = match descendants_named(node, "UI").next() {
        Some(ui_node) => parse_ui_children(reader, ui_node)?,
        None => Vec::new(),
    };

    let objects = descendants_named(node, "Object")
        .map(|entity| parse_entity(reader, entity))
        .collect::<Result<Vec<_>, _>>()?;
    let mobs = descendants_named(node, "Mob")
        .map(|entity| parse_entity(reader, entity))
        .collect::<Result<Vec<_>, _>>()?;
    let spawners = descendants_named(node, "Spawner")
        .map(|spawner| {
            let count = reader.integer_or(spawner, "count", DEFAULT_SPAWNER_COUNT)?;
            Ok(SpawnerDescriptor {
                count: count.clamp(0, u32::MAX as i64) as u32,
                template: parse_entity(reader, spawner)?,
            })
        })
        .collect::<Result<Vec<_>, ContentError>>()?;
    let player = descendants_named(node, "Player")
        .next()
        .map(|player| parse_entity(reader, player))
        .transpose()?;

    Ok(SceneDescriptor {
        id,
        kind,
        width: reader.integer_or(node, "width", DEFAULT_SCENE_WIDTH as i64)? as i32,
        height: reader.integer_or(node, "height", DEFAULT_SCENE_HEIGHT as i64)? as i32,
        background: reader.string(node, "background"),
        adjacency,
        assets,
        hud,
        ui,
        objects,
        mobs,
        spawners,
        player,
    })
}

fn parse_ui_children<'input>(
    reader: &XmlReader<'_, 'input>,
    container: Node<'_, 'input>,
) -> Result<Vec<UiElementDescriptor>, ContentError> {
    child_elements(container)
        .map(|element| parse_ui_element(reader, element))
        .collect()
}

fn parse_ui_element<'input>(
    reader: &XmlReader<'_, 'input>,
    node: Node<'_, 'input>,
) -> Result<UiElementDescriptor, ContentError> {
    let kind = match node.tag_name().name() {
        "Button" => UiElementKind::Button,
        "Image" => UiElementKind::Image,
        _ => UiElementKind::Text,
    };
    let length = |name: &str| -> Result<Option<UiLength>, ContentError> {
        match reader.attr(node, name) {
            None => Ok(None),
            Some(raw) => UiLength::parse(raw).map(Some).ok_or_else(|| {
                reader.error(
                    node,
                    ContentErrorCode::InvalidValue,
                    format!("attribute '{name}' must be a pixel or percent length, got '{raw}'"),
                )
            }),
        }
    };
    let optional_number = |name: &str| -> Result<Option<f64>, ContentError> {
        match reader.attr(node, name) {
            Some(_) => reader.number_or(node, name, 0.0).map(Some),
            None => Ok(None),
        }
    };

    Ok(UiElementDescriptor {
        kind,
        content: reader.string_or(node, "content", ""),
        src: reader.string(node, "src"),
        top: length("top")?,
        left: length("left")?,
        bottom: length("bottom")?,
        right: length("right")?,
        width: optional_number("width")?,
        height: optional_number("height")?,
        color: reader.string(node, "color"),
        background: reader.string(node, "background"),
        hover_background: reader.string(node, "hoverBackground"),
        size_px: optional_number("size")?,
        action: reader.string(node, "action"),
    })
}

fn parse_entity<'input>(
    reader: &XmlReader<'_, 'input>,
    node: Node<'_, 'input>,
) -> Result<EntityDescriptor, ContentError> {
    let interaction = match descendants_named(node, "Interaction").next() {
        Some(interaction) => Some(parse_interaction(reader, interaction)?),
        None => None,
    };
    let attachments = match descendants_named(node, "Attachments").next() {
        Some(container) => child_elements(container)
            .map(|child| parse_attachment(reader, child))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(EntityDescriptor {
        id: reader.string(node, "id"),
        x: reader.number_or(node, "x", 0.0)?,
        y: reader.number_or(node, "y", 0.0)?,
        asset: reader.string(node, "asset"),
        asset_base_path: reader.string(node, "asset-base-path"),
        speed: reader.number_or(node, "speed", DEFAULT_ENTITY_SPEED)?,
        collision: reader.flag(node, "collision"),
        behavior: Behavior::from_token(reader.attr(node, "behavior").unwrap_or("passive")),
        wander_radius: reader.integer_or(node, "wander-radius", 0)? as f64,
        aggro_radius: reader.integer_or(node, "aggro-radius", 0)? as f64,
        placeholder: reader.string_or(node, "placeholder", DEFAULT_PLACEHOLDER_COLOR),
        interaction,
        attachments,
    })
}

fn parse_interaction<'input>(
    reader: &XmlReader<'_, 'input>,
    node: Node<'_, 'input>,
) -> Result<Interaction, ContentError> {
    let condition = match descendants_named(node, "Condition").next() {
        Some(condition) => Some(parse_condition(reader, condition)?),
        None => None,
    };
    Ok(Interaction {
        action: reader.string_or(node, "action", ""),
        condition,
        fail_message: Some(reader.string_or(node, "failMessage", DEFAULT_FAIL_MESSAGE)),
    })
}

pub(crate) fn parse_condition<'input>(
    reader: &XmlReader<'_, 'input>,
    node: Node<'_, 'input>,
) -> Result<Condition, ContentError> {
    let kind = reader.string_or(node, "type", "");
    let condition = match kind.as_str() {
        "hasItem" | "notHasItem" => {
            let item = reader.string_or(node, "item", "");
            let quantity = reader.integer_or(node, "quantity", 1)?;
            if kind == "hasItem" {
                Condition::HasItem { item, quantity }
            } else {
                Condition::NotHasItem { item, quantity }
            }
        }
        "varEquals" | "varGreaterThan" | "varLessThan" => {
            let var = reader.string_or(node, "var", "");
            let value = node.attribute("value").unwrap_or_default().to_string();
            match kind.as_str() {
                "varEquals" => Condition::VarEquals { var, value },
                "varGreaterThan" => Condition::VarGreaterThan { var, value },
                _ => Condition::VarLessThan { var, value },
            }
        }
        "and" | "or" => {
            let children = child_elements(node)
                .filter(|child| child.has_tag_name("Condition"))
                .map(|child| parse_condition(reader, child))
                .collect::<Result<Vec<_>, _>>()?;
            if kind == "and" {
                Condition::All(children)
            } else {
                Condition::Any(children)
            }
        }
        _ => Condition::Unknown(kind),
    };
    Ok(condition)
}

fn parse_attachment<'input>(
    reader: &XmlReader<'_, 'input>,
    node: Node<'_, 'input>,
) -> Result<Attachment, ContentError> {
    let kind = if node.has_tag_name("Block") {
        AttachmentKind::Block
    } else {
        AttachmentKind::Text
    };
    let defaults = Attachment::text("");
    Ok(Attachment {
        kind,
        content: reader.string_or(node, "content", ""),
        asset: reader.string(node, "asset"),
        color: reader.string_or(node, "color", &defaults.color),
        offset_y: reader.integer_or(node, "offset-y", defaults.offset_y as i64)? as f64,
        size_px: reader.number_or(node, "size", defaults.size_px)?,
        font: reader.string_or(node, "font", &defaults.font),
        background: reader.string(node, "background"),
    })
}
