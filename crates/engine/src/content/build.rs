use rand::Rng;
use tracing::debug;

use crate::persist::SceneSnapshot;
use crate::sim::entity::{Entity, EntityKind, EntityVisual, MobBrain, DEFAULT_DIRECTIONAL_BASE_PATH};
use crate::sim::grid::{GridCell, GridPos};
use crate::sim::scene::{SceneKind, SceneState};
use crate::sim::SceneSetup;

use super::scene::{EntityDescriptor, SceneDescriptor};

pub const SPAWNER_MAX_ATTEMPTS: u32 = 100;
const DIRECTIONAL_ASSET_ID: &str = "hero";

/// Builds a live scene: objects, mobs, spawned mobs, then the player (returned
/// separately). Snapshot positions override descriptor positions.
pub fn build_scene<R: Rng + ?Sized>(
    descriptor: &SceneDescriptor,
    kind: SceneKind,
    snapshot: Option<&SceneSnapshot>,
    rng: &mut R,
) -> SceneSetup {
    let mut scene = SceneState::new(descriptor.id.clone(), kind, descriptor.width, descriptor.height)
        .with_adjacency(descriptor.adjacency.clone());
    scene.background = descriptor.background.clone();

    if kind == SceneKind::Ui {
        return SceneSetup {
            scene,
            player: None,
        };
    }

    for object in &descriptor.objects {
        scene.push_entity(instantiate(object, EntityKind::Object, None, snapshot));
    }
    for mob in &descriptor.mobs {
        scene.push_entity(instantiate(mob, EntityKind::Mob, None, snapshot));
    }
    for spawner in &descriptor.spawners {
        for _ in 0..spawner.count {
            let Some(cell) = pick_spawn_cell(&scene, rng) else {
                debug!(scene = %scene.id, "spawner_no_free_cell");
                continue;
            };
            scene.push_entity(instantiate(
                &spawner.template,
                EntityKind::Mob,
                Some(cell.to_pos()),
                snapshot,
            ));
        }
    }

    let player = descriptor
        .player
        .as_ref()
        .map(|player| instantiate(player, EntityKind::Player, None, snapshot));

    SceneSetup { scene, player }
}

fn pick_spawn_cell<R: Rng + ?Sized>(scene: &SceneState, rng: &mut R) -> Option<GridCell> {
    if scene.width <= 0 || scene.height <= 0 {
        return None;
    }
    first_valid_draw(scene, || {
        GridCell::new(rng.gen_range(0..scene.width), rng.gen_range(0..scene.height))
    })
}

/// Draws up to `SPAWNER_MAX_ATTEMPTS` cells. A free cell found on the last
/// draw is discarded, so only the first 99 draws can place a mob.
fn first_valid_draw(scene: &SceneState, mut draw: impl FnMut() -> GridCell) -> Option<GridCell> {
    for attempt in 1..=SPAWNER_MAX_ATTEMPTS {
        let cell = draw();
        if scene.is_valid_tile(cell) {
            return (attempt < SPAWNER_MAX_ATTEMPTS).then_some(cell);
        }
    }
    None
}

pub fn instantiate(
    descriptor: &EntityDescriptor,
    kind: EntityKind,
    position_override: Option<GridPos>,
    snapshot: Option<&SceneSnapshot>,
) -> Entity {
    let base = position_override.unwrap_or(GridPos::new(descriptor.x, descriptor.y));
    let mut entity = Entity::new(kind, base);
    entity.id = descriptor.id.clone();
    if let Some(saved) = snapshot.and_then(|snapshot| snapshot.position_for(&entity)) {
        entity.place_at(saved);
    }

    entity.speed = descriptor.speed;
    entity.collision = descriptor.collision;
    entity.brain = MobBrain {
        behavior: descriptor.behavior,
        wander_radius: descriptor.wander_radius,
        aggro_radius: descriptor.aggro_radius,
        ai_timer_ms: 0.0,
    };
    entity.interaction = descriptor.interaction.clone();

    let directional = descriptor.asset_base_path.is_some()
        || descriptor.asset.as_deref() == Some(DIRECTIONAL_ASSET_ID);
    entity.visual = EntityVisual {
        asset: descriptor.asset.clone(),
        placeholder: descriptor.placeholder.clone(),
        directional_base_path: directional.then(|| {
            descriptor
                .asset_base_path
                .clone()
                .unwrap_or_else(|| DEFAULT_DIRECTIONAL_BASE_PATH.to_string())
        }),
        attachments: descriptor.attachments.clone(),
    };
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::scene::parse_scene_document;
    use crate::persist::{EntitySnapshot, PLAYER_SNAPSHOT_KEY};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::path::Path;

    fn descriptor(raw: &str) -> SceneDescriptor {
        parse_scene_document(raw, Path::new("test.xml")).expect("scene")
    }

    fn snapshot_json(raw: &str) -> SceneSnapshot {
        serde_json::from_str(raw).expect("snapshot json")
    }

    #[test]
    fn entities_are_built_in_category_order() {
        let descriptor = descriptor(
            r#"<Scene id="s" width="5" height="5">
                 <Mob id="rat" x="3" y="3"/>
                 <Object id="well" x="1" y="1" collision="true"/>
                 <Player x="0" y="0"/>
               </Scene>"#,
        );
        let mut rng = SmallRng::seed_from_u64(1);
        let setup = build_scene(&descriptor, SceneKind::Game, None, &mut rng);
        let kinds: Vec<EntityKind> = setup.scene.entities().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntityKind::Object, EntityKind::Mob]);
        assert!(setup.player.is_some());
        assert!(setup.scene.player().is_none());
    }

    #[test]
    fn snapshot_overrides_positions_by_key() {
        let descriptor = descriptor(
            r#"<Scene id="s"><Object id="crate" x="1" y="1"/><Object x="2" y="2"/><Player x="0" y="0"/></Scene>"#,
        );
        let snapshot = snapshot_json(
            r#"{"crate":{"gx":4,"gy":5,"vars":{}},"player":{"gx":7,"gy":3}}"#,
        );
        let mut rng = SmallRng::seed_from_u64(1);
        let setup = build_scene(&descriptor, SceneKind::Game, Some(&snapshot), &mut rng);

        let crate_entity = setup.scene.entity(0).expect("crate");
        assert_eq!(crate_entity.position, GridPos::new(4.0, 5.0));
        assert_eq!(crate_entity.spawn, GridPos::new(4.0, 5.0));
        assert_eq!(setup.scene.entity(1).map(|e| e.position), Some(GridPos::new(2.0, 2.0)));
        assert_eq!(setup.player.map(|p| p.position), Some(GridPos::new(7.0, 3.0)));
        assert!(snapshot.get(PLAYER_SNAPSHOT_KEY).is_some_and(|s: &EntitySnapshot| s.vars.is_empty()));
    }

    fn draws_free_on(hit: u32) -> (Option<GridCell>, u32) {
        let scene = SceneState::new("s", SceneKind::Game, 3, 3);
        let mut draws = 0u32;
        let picked = first_valid_draw(&scene, || {
            draws += 1;
            if draws == hit {
                GridCell::new(1, 1)
            } else {
                GridCell::new(-1, -1)
            }
        });
        (picked, draws)
    }

    #[test]
    fn free_cell_on_the_final_draw_is_discarded() {
        assert_eq!(draws_free_on(99), (Some(GridCell::new(1, 1)), 99));
        assert_eq!(draws_free_on(SPAWNER_MAX_ATTEMPTS), (None, SPAWNER_MAX_ATTEMPTS));
        assert_eq!(draws_free_on(0), (None, SPAWNER_MAX_ATTEMPTS));
    }

    #[test]
    fn fully_blocked_scene_spawns_nothing() {
        let descriptor = descriptor(
            r#"<Scene id="s" width="1" height="1">
                 <Object id="boulder" x="0" y="0" collision="true"/>
                 <Spawner count="2"/>
               </Scene>"#,
        );
        let mut rng = SmallRng::seed_from_u64(9);
        let setup = build_scene(&descriptor, SceneKind::Game, None, &mut rng);
        assert!(setup.scene.entities().iter().all(|entity| !entity.is_mob()));
    }

    #[test]
    fn spawners_only_use_free_cells() {
        let descriptor = descriptor(
            r#"<Scene id="s" width="2" height="1">
                 <Object x="0" y="0" collision="true"/>
                 <Spawner count="3" wander-radius="1"/>
               </Scene>"#,
        );
        let mut rng = SmallRng::seed_from_u64(42);
        let setup = build_scene(&descriptor, SceneKind::Game, None, &mut rng);
        let mobs: Vec<&Entity> = setup.scene.entities().iter().filter(|e| e.is_mob()).collect();
        assert!(!mobs.is_empty());
        for mob in mobs {
            assert_eq!(mob.cell(), GridCell::new(1, 0));
            assert_eq!(mob.brain.wander_radius, 1.0);
        }
    }

    #[test]
    fn hero_asset_and_base_path_enable_directional_sprites() {
        let descriptor = descriptor(
            r#"<Scene id="s">
                 <Object x="0" y="0" asset="hero"/>
                 <Object x="1" y="0" asset-base-path="assets/knight"/>
                 <Object x="2" y="0" asset="tree"/>
               </Scene>"#,
        );
        let mut rng = SmallRng::seed_from_u64(1);
        let setup = build_scene(&descriptor, SceneKind::Game, None, &mut rng);
        let paths: Vec<Option<&str>> = setup
            .scene
            .entities()
            .iter()
            .map(|e| e.visual.directional_base_path.as_deref())
            .collect();
        assert_eq!(paths, vec![Some("assets/hero"), Some("assets/knight"), None]);
    }

    #[test]
    fn ui_scenes_have_no_entities() {
        let descriptor = descriptor(r#"<Scene id="menu"><Player x="0" y="0"/></Scene>"#);
        let mut rng = SmallRng::seed_from_u64(1);
        let setup = build_scene(&descriptor, SceneKind::Ui, None, &mut rng);
        assert!(setup.scene.entities().is_empty());
        assert!(setup.player.is_none());
    }
}
