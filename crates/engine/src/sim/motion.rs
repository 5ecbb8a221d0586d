use super::entity::{AnimationClip, Entity, WALK_FRAME_COUNT};
use super::grid::Facing;

/// Progress gained per millisecond for each unit of entity speed.
const PROGRESS_PER_SPEED_MS: f64 = 4.0 / 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStep {
    /// No waypoints were queued.
    Idle,
    Moving,
    /// The last waypoint was reached during this step.
    Arrived,
}

/// Advances one entity along its waypoint queue by `dt_ms`.
///
/// At most one segment completes per call; leftover progress is discarded.
pub fn advance_entity(entity: &mut Entity, dt_ms: f64) -> MotionStep {
    let directional = entity.visual.uses_directional_sprites();

    if entity.motion.path.is_empty() {
        entity.motion.is_moving = false;
        if directional && entity.animation.clip != AnimationClip::Idle {
            entity.animation.set_idle();
        }
        return MotionStep::Idle;
    }

    if !entity.motion.is_moving {
        begin_segment(entity, directional);
    }

    if directional && entity.animation.clip == AnimationClip::Walk {
        advance_walk_frame(entity, dt_ms);
    }

    entity.motion.progress += entity.speed * PROGRESS_PER_SPEED_MS * dt_ms;
    if entity.motion.progress < 1.0 {
        entity.position = entity
            .motion
            .segment_start
            .lerp(entity.motion.segment_target, entity.motion.progress);
        return MotionStep::Moving;
    }

    entity.position = entity.motion.segment_target;
    entity.motion.path.pop_front();
    entity.motion.progress = 0.0;

    match entity.motion.path.front().copied() {
        Some(next) => {
            entity.motion.segment_start = entity.position;
            entity.motion.segment_target = next.to_pos();
            if directional {
                entity.animation.facing =
                    Facing::from_movement(entity.motion.segment_start, entity.motion.segment_target);
            }
            MotionStep::Moving
        }
        None => {
            entity.motion.is_moving = false;
            if directional {
                entity.animation.set_idle();
            }
            MotionStep::Arrived
        }
    }
}

fn begin_segment(entity: &mut Entity, directional: bool) {
    let Some(first) = entity.motion.path.front().copied() else {
        return;
    };
    entity.motion.is_moving = true;
    entity.motion.progress = 0.0;
    entity.motion.segment_start = entity.position;
    entity.motion.segment_target = first.to_pos();
    if directional {
        let facing = Facing::from_movement(entity.motion.segment_start, entity.motion.segment_target);
        entity.animation.start_walk(facing);
    }
}

fn advance_walk_frame(entity: &mut Entity, dt_ms: f64) {
    let animation = &mut entity.animation;
    animation.timer_ms += dt_ms;
    if animation.timer_ms >= animation.frame_interval_ms {
        animation.timer_ms = 0.0;
        animation.frame = (animation.frame + 1) % WALK_FRAME_COUNT;
    }
}
