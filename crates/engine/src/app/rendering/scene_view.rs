use crate::content::{AssetDescriptor, AssetKind};
use crate::rules::render_template;
use crate::session::{text_extent, GameSession};
use crate::sim::{
    AnimationClip, AttachmentKind, Entity, GridCell, GridPos, IsoProjection, SceneState,
};

use super::color::{color_or, parse_color, shade, with_alpha, Rgba, BLACK, WHITE};
use super::font::draw_text_centered;
use super::raster::Canvas;
use super::sprites::SpriteCache;

const GAME_CLEAR_COLOR: Rgba = [0x22, 0x22, 0x22, 255];
const EMPTY_TILE_COLOR: Rgba = [0x33, 0x33, 0x33, 255];
const HOVER_TILE_COLOR: Rgba = [0x55, 0x55, 0x55, 255];
const PATH_FALLBACK_COLOR: Rgba = [255, 0, 0, 255];
const PLACEHOLDER_CUBE_HEIGHT_PX: f64 = 32.0;
const BLOCK_ATTACHMENT_HEIGHT_PX: f64 = 10.0;
const MISSING_PLACEHOLDER_COLOR: Rgba = [255, 0, 255, 255];

/// Entity indices in paint order. Stable, so ties keep list order; the
/// scene's own list is left untouched.
pub fn draw_order(entities: &[Entity]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entities.len()).collect();
    order.sort_by_key(|&index| {
        let position = entities[index].position;
        position.x.ceil() as i64 + position.y.ceil() as i64
    });
    order
}

/// Paths of the walk frames and idle frame for the entity's current facing.
pub fn directional_frame_path(base: &str, entity: &Entity) -> String {
    let facing = entity.animation.facing.as_token();
    match entity.animation.clip {
        AnimationClip::Idle => format!("{base}/idle/{facing}.png"),
        AnimationClip::Walk => {
            format!("{base}/walk/{facing}/frame_{:03}.png", entity.animation.frame)
        }
    }
}

pub(crate) fn draw_scene(
    canvas: &mut Canvas<'_>,
    session: &GameSession,
    sprites: &mut SpriteCache,
    debug_paths: bool,
) {
    let Some(scene) = session.simulation().scene() else {
        canvas.clear(BLACK);
        return;
    };
    if !scene.is_game() {
        canvas.clear(color_or(scene.background.as_deref(), BLACK));
        return;
    }
    canvas.clear(GAME_CLEAR_COLOR);

    let view = SceneView {
        session,
        scene,
        projection: session.projection(),
    };
    view.draw_tiles(canvas, sprites, session.hover_cell());
    for index in draw_order(scene.entities()) {
        if let Some(entity) = scene.entity(index) {
            view.draw_entity(canvas, sprites, entity, debug_paths);
        }
    }
}

struct SceneView<'s> {
    session: &'s GameSession,
    scene: &'s SceneState,
    projection: &'s IsoProjection,
}

impl SceneView<'_> {
    fn asset(&self, asset_id: &str) -> Option<&AssetDescriptor> {
        self.session.library().asset(Some(&self.scene.id), asset_id)
    }

    fn diamond(&self, top: (f64, f64)) -> [(f64, f64); 4] {
        let half_w = self.projection.half_tile_width();
        let half_h = self.projection.half_tile_height();
        let (x, y) = top;
        [
            (x, y),
            (x + half_w, y + half_h),
            (x, y + half_h * 2.0),
            (x - half_w, y + half_h),
        ]
    }

    fn draw_tiles(&self, canvas: &mut Canvas<'_>, sprites: &mut SpriteCache, hover: Option<GridCell>) {
        let background = self
            .scene
            .background
            .as_deref()
            .and_then(|id| self.asset(id));
        let tile_src = background
            .filter(|asset| asset.kind == AssetKind::Sprite)
            .and_then(|asset| asset.src.as_deref());
        let tile_sprite = match tile_src {
            Some(src) => sprites.get(src),
            None => None,
        };

        for y in 0..self.scene.height {
            for x in 0..self.scene.width {
                let cell = GridCell::new(x, y);
                let top = self.projection.iso_to_screen(cell.to_pos());
                let diamond = self.diamond((top.x, top.y));
                let hovered = hover == Some(cell);

                match tile_sprite {
                    Some(sprite) => {
                        canvas.blit_scaled(
                            sprite,
                            top.x - self.projection.half_tile_width(),
                            top.y,
                            self.projection.tile_width,
                            self.projection.tile_height,
                        );
                        if hovered {
                            canvas.fill_polygon(&diamond, with_alpha(WHITE, 0.3));
                        }
                    }
                    None => {
                        let fill = if hovered {
                            HOVER_TILE_COLOR
                        } else {
                            background
                                .map(|asset| color_or(Some(&asset.placeholder), EMPTY_TILE_COLOR))
                                .unwrap_or(EMPTY_TILE_COLOR)
                        };
                        canvas.fill_polygon(&diamond, fill);
                        canvas.polygon_outline(&diamond, BLACK);
                    }
                }
            }
        }
    }

    fn draw_entity(
        &self,
        canvas: &mut Canvas<'_>,
        sprites: &mut SpriteCache,
        entity: &Entity,
        debug_paths: bool,
    ) {
        let anchor = entity_anchor(self.projection, entity.position);
        let placeholder = color_or(Some(&entity.visual.placeholder), MISSING_PLACEHOLDER_COLOR);

        if (entity.is_player() || debug_paths) && !entity.motion.path.is_empty() {
            let mut points = vec![anchor];
            points.extend(
                entity
                    .motion
                    .path
                    .iter()
                    .map(|cell| entity_anchor(self.projection, cell.to_pos())),
            );
            let path_color = parse_color(&entity.visual.placeholder).unwrap_or(PATH_FALLBACK_COLOR);
            canvas.polyline(&points, path_color);
        }

        self.draw_body(canvas, sprites, entity, anchor, placeholder);
        self.draw_attachments(canvas, entity, anchor);
    }

    fn draw_body(
        &self,
        canvas: &mut Canvas<'_>,
        sprites: &mut SpriteCache,
        entity: &Entity,
        anchor: (f64, f64),
        placeholder: Rgba,
    ) {
        let (x, y) = anchor;
        if let Some(base) = entity.visual.directional_base_path.as_deref() {
            match sprites.get(&directional_frame_path(base, entity)) {
                Some(sprite) => {
                    let (w, h) = (sprite.width as f64, sprite.height as f64);
                    canvas.blit_scaled(sprite, x - w / 2.0, y - h, w, h);
                }
                None => self.draw_cube(canvas, anchor, PLACEHOLDER_CUBE_HEIGHT_PX, placeholder),
            }
            return;
        }

        let Some(asset) = entity.visual.asset.as_deref().and_then(|id| self.asset(id)) else {
            self.draw_cube(canvas, anchor, PLACEHOLDER_CUBE_HEIGHT_PX, placeholder);
            return;
        };
        let asset_color = color_or(Some(&asset.placeholder), MISSING_PLACEHOLDER_COLOR);
        let sprite = match (asset.kind, asset.src.as_deref()) {
            (AssetKind::Sprite, Some(src)) => sprites.get(src),
            _ => None,
        };
        match sprite {
            Some(sprite) => {
                let w = asset.frame_width.unwrap_or(sprite.width) as f64;
                let h = asset.frame_height.unwrap_or(sprite.height) as f64;
                canvas.blit_scaled(sprite, x - w / 2.0, y - h, w, h);
            }
            None => self.draw_cube(canvas, anchor, asset.height, asset_color),
        }
    }

    fn draw_attachments(&self, canvas: &mut Canvas<'_>, entity: &Entity, anchor: (f64, f64)) {
        for attachment in &entity.visual.attachments {
            let baseline = anchor.1 + attachment.offset_y;
            match attachment.kind {
                AttachmentKind::Text => {
                    let text = render_template(&attachment.content, self.session.rules());
                    let (width, height) = text_extent(&text, attachment.size_px);
                    if let Some(background) = attachment.background.as_deref().and_then(parse_color) {
                        canvas.fill_rect(
                            (anchor.0 - width / 2.0 - 2.0).round() as i32,
                            (baseline - height - 2.0).round() as i32,
                            (width + 4.0).round() as i32,
                            (height + 4.0).round() as i32,
                            background,
                        );
                    }
                    let color = color_or(Some(&attachment.color), WHITE);
                    draw_text_centered(
                        canvas,
                        anchor.0,
                        baseline - height,
                        &text,
                        attachment.size_px,
                        color,
                    );
                }
                AttachmentKind::Block => {
                    let Some(asset) = attachment.asset.as_deref().and_then(|id| self.asset(id)) else {
                        continue;
                    };
                    let height = if asset.height > 0.0 {
                        asset.height
                    } else {
                        BLOCK_ATTACHMENT_HEIGHT_PX
                    };
                    let color = color_or(Some(&asset.placeholder), MISSING_PLACEHOLDER_COLOR);
                    self.draw_cube(canvas, (anchor.0, baseline), height, color);
                }
            }
        }
    }

    /// Shaded box standing on the tile whose centre is `anchor`.
    fn draw_cube(&self, canvas: &mut Canvas<'_>, anchor: (f64, f64), height: f64, color: Rgba) {
        let half_w = self.projection.half_tile_width();
        let half_h = self.projection.half_tile_height();
        let (x, y) = anchor;
        let base = y + half_h;
        let faces = [
            (
                color,
                [
                    (x, base - height - half_h * 2.0),
                    (x + half_w, base - height - half_h),
                    (x, base - height),
                    (x - half_w, base - height - half_h),
                ],
            ),
            (
                shade(color, -0.4),
                [
                    (x, base - height),
                    (x + half_w, base - height - half_h),
                    (x + half_w, base - half_h),
                    (x, base),
                ],
            ),
            (
                shade(color, -0.2),
                [
                    (x, base - height),
                    (x - half_w, base - height - half_h),
                    (x - half_w, base - half_h),
                    (x, base),
                ],
            ),
        ];
        for (fill, face) in faces {
            canvas.fill_polygon(&face, fill);
            canvas.polygon_outline(&face, BLACK);
        }
    }
}

/// Screen position of an entity's tile centre.
pub fn entity_anchor(projection: &IsoProjection, position: GridPos) -> (f64, f64) {
    let top = projection.iso_to_screen(position);
    (top.x, top.y + projection.half_tile_height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{EntityKind, Facing};

    #[test]
    fn draw_order_sorts_by_ceiled_depth_and_keeps_ties_stable() {
        let entities = vec![
            Entity::new(EntityKind::Object, GridPos::new(3.0, 3.0)),
            Entity::new(EntityKind::Mob, GridPos::new(0.2, 0.0)),
            Entity::new(EntityKind::Object, GridPos::new(1.0, 0.0)),
            Entity::new(EntityKind::Player, GridPos::new(2.0, 2.0)),
        ];
        assert_eq!(draw_order(&entities), vec![1, 2, 3, 0]);
        assert_eq!(entities[0].position, GridPos::new(3.0, 3.0));
    }

    #[test]
    fn directional_paths_follow_clip_and_facing() {
        let mut hero = Entity::new(EntityKind::Player, GridPos::new(0.0, 0.0));
        assert_eq!(
            directional_frame_path("assets/hero", &hero),
            "assets/hero/idle/south.png"
        );
        hero.animation.start_walk(Facing::NorthEast);
        hero.animation.frame = 2;
        assert_eq!(
            directional_frame_path("assets/hero", &hero),
            "assets/hero/walk/north-east/frame_002.png"
        );
    }

    #[test]
    fn entity_anchor_is_tile_centre() {
        let projection = IsoProjection::default();
        let (x, y) = entity_anchor(&projection, GridPos::new(1.0, 1.0));
        assert_eq!(x, projection.offset_x);
        assert_eq!(y, projection.offset_y + 32.0 + 16.0);
    }
}
