use rand::Rng;

use super::entity::{Behavior, Entity};
use super::grid::{round_half_up, GridCell, GridPos};
use super::pathfinding::find_path;
use super::scene::SceneState;

pub const AI_DECISION_MIN_MS: f64 = 1000.0;
pub const AI_DECISION_MAX_MS: f64 = 2500.0;
/// AI paths of this many steps or more are discarded, not truncated.
pub const MAX_AI_PATH_STEPS: usize = 15;

/// Counts down the mob's decision timer and, on expiry, picks a destination.
pub fn decide_target<R: Rng + ?Sized>(
    mob: &mut Entity,
    player_position: Option<GridPos>,
    dt_ms: f64,
    rng: &mut R,
) -> Option<GridCell> {
    mob.brain.ai_timer_ms -= dt_ms;
    if mob.brain.ai_timer_ms > 0.0 {
        return None;
    }
    mob.brain.ai_timer_ms = rng.gen_range(AI_DECISION_MIN_MS..AI_DECISION_MAX_MS);

    if mob.brain.behavior == Behavior::Aggressive {
        if let Some(player_position) = player_position {
            if mob.position.distance(player_position) <= mob.brain.aggro_radius {
                return Some(player_position.nearest_cell());
            }
        }
    }

    if mob.brain.wander_radius > 0.0 {
        let radius = mob.brain.wander_radius;
        let dx = (rng.gen::<f64>() * 2.0 - 1.0) * radius;
        let dy = (rng.gen::<f64>() * 2.0 - 1.0) * radius;
        return Some(GridCell::new(
            round_half_up(mob.spawn.x + dx),
            round_half_up(mob.spawn.y + dy),
        ));
    }

    None
}

/// Runs one decision pass over every idle mob, in scene order. Returns how many
/// mobs received a new path.
pub fn run_ai_phase<R: Rng + ?Sized>(scene: &mut SceneState, dt_ms: f64, rng: &mut R) -> usize {
    let mut assigned = 0usize;
    for index in 0..scene.entities().len() {
        let player_position = scene.player().map(|player| player.position);
        let Some(mob) = scene.entity_mut(index) else {
            continue;
        };
        if !mob.is_mob() || mob.motion.is_moving {
            continue;
        }

        let Some(target) = decide_target(mob, player_position, dt_ms, rng) else {
            continue;
        };
        let start = mob.cell();
        if !scene.is_valid_tile(target) {
            continue;
        }

        let path = find_path(scene, start, target);
        if path.is_empty() || path.len() >= MAX_AI_PATH_STEPS {
            continue;
        }
        if let Some(mob) = scene.entity_mut(index) {
            mob.assign_path(path);
            assigned += 1;
        }
    }
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EntityKind;
    use crate::sim::scene::SceneKind;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn mob_at(x: f64, y: f64, behavior: Behavior) -> Entity {
        let mut mob = Entity::new(EntityKind::Mob, GridPos::new(x, y)).with_id("wolf");
        mob.brain.behavior = behavior;
        mob
    }

    #[test]
    fn timer_blocks_decisions_until_expired() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut mob = mob_at(2.0, 2.0, Behavior::Passive);
        mob.brain.wander_radius = 2.0;
        mob.brain.ai_timer_ms = 100.0;

        assert_eq!(decide_target(&mut mob, None, 60.0, &mut rng), None);
        assert!((mob.brain.ai_timer_ms - 40.0).abs() < 1e-9);

        assert!(decide_target(&mut mob, None, 60.0, &mut rng).is_some());
        assert!(mob.brain.ai_timer_ms >= AI_DECISION_MIN_MS);
        assert!(mob.brain.ai_timer_ms < AI_DECISION_MAX_MS);
    }

    #[test]
    fn aggressive_mob_targets_player_cell_within_radius() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut mob = mob_at(2.0, 2.0, Behavior::Aggressive);
        mob.brain.aggro_radius = 5.0;
        let target = decide_target(&mut mob, Some(GridPos::new(5.2, 2.4)), 16.0, &mut rng);
        assert_eq!(target, Some(GridCell::new(5, 2)));
    }

    #[test]
    fn aggressive_mob_out_of_range_falls_back_to_wander() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut mob = mob_at(2.0, 2.0, Behavior::Aggressive);
        mob.brain.aggro_radius = 2.0;
        mob.brain.wander_radius = 1.0;
        let target = decide_target(&mut mob, Some(GridPos::new(9.0, 9.0)), 16.0, &mut rng)
            .expect("wander target");
        assert!(target.x >= 1 && target.x <= 3);
        assert!(target.y >= 1 && target.y <= 3);
    }

    #[test]
    fn wander_targets_stay_around_spawn() {
        let mut rng = SmallRng::seed_from_u64(99);
        let mut mob = mob_at(6.0, 6.0, Behavior::Passive);
        mob.spawn = GridPos::new(4.0, 4.0);
        mob.brain.wander_radius = 2.0;
        for _ in 0..200 {
            mob.brain.ai_timer_ms = 0.0;
            let target = decide_target(&mut mob, None, 1.0, &mut rng).expect("target");
            assert!((2..=6).contains(&target.x), "x {}", target.x);
            assert!((2..=6).contains(&target.y), "y {}", target.y);
        }
    }

    #[test]
    fn idle_passive_mob_without_wander_never_moves() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut mob = mob_at(2.0, 2.0, Behavior::Passive);
        assert_eq!(decide_target(&mut mob, Some(GridPos::new(2.0, 3.0)), 16.0, &mut rng), None);
    }

    #[test]
    fn ai_phase_rejects_long_paths() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut scene = SceneState::new("plains", SceneKind::Game, 30, 1);
        let mut mob = mob_at(0.0, 0.0, Behavior::Aggressive);
        mob.brain.aggro_radius = 50.0;
        scene.push_entity(mob);
        scene.push_entity(Entity::new(EntityKind::Player, GridPos::new(20.0, 0.0)));

        assert_eq!(run_ai_phase(&mut scene, 16.0, &mut rng), 0);
        assert!(scene.entity(0).is_some_and(|mob| mob.motion.path.is_empty()));
    }

    fn chase_across_plains(player_x: f64) -> (usize, SceneState) {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut scene = SceneState::new("plains", SceneKind::Game, 30, 1);
        let mut mob = mob_at(0.0, 0.0, Behavior::Aggressive);
        mob.brain.aggro_radius = 50.0;
        scene.push_entity(mob);
        scene.push_entity(Entity::new(EntityKind::Player, GridPos::new(player_x, 0.0)));
        let assigned = run_ai_phase(&mut scene, 16.0, &mut rng);
        (assigned, scene)
    }

    #[test]
    fn ai_path_step_limit_is_exclusive() {
        let (assigned, scene) = chase_across_plains(14.0);
        assert_eq!(assigned, 1);
        let mob = scene.entity(0).expect("mob");
        assert_eq!(mob.motion.path.len(), MAX_AI_PATH_STEPS - 1);
        assert_eq!(mob.motion.path.back().copied(), Some(GridCell::new(14, 0)));

        let (assigned, scene) = chase_across_plains(15.0);
        assert_eq!(assigned, 0);
        assert!(scene.entity(0).is_some_and(|mob| mob.motion.path.is_empty()));
    }

    #[test]
    fn ai_phase_skips_moving_mobs() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut scene = SceneState::new("plains", SceneKind::Game, 10, 10);
        let mut mob = mob_at(1.0, 1.0, Behavior::Aggressive);
        mob.brain.aggro_radius = 5.0;
        mob.motion.is_moving = true;
        scene.push_entity(mob);
        scene.push_entity(Entity::new(EntityKind::Player, GridPos::new(3.0, 1.0)));

        assert_eq!(run_ai_phase(&mut scene, 16.0, &mut rng), 0);
        assert!(scene.entity(0).is_some_and(|mob| mob.brain.ai_timer_ms == 0.0));
    }
}
