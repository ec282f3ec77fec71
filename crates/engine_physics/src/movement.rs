//! Swept movement.
//!
//! [`Physics::move_body`] advances a body in substeps of at most
//! [`PhysicsConfig::max_substep`]. Each substep is tested against other
//! bodies (notification only) and then against the level:
//!
//! 1. No tile overlap: commit the substep.
//! 2. Overlap: fire the level hook (once per move), then
//!    - if moving along Y alone collides, snap flush on Y and drop the Y
//!      component of the remaining movement;
//!    - else if moving along X alone collides, do the same on X;
//!    - else (a corner hit) halve the remaining movement.
//!
//! Case 2 is limited to [`PhysicsConfig::max_iterations`] passes per move.

use engine_component::World;
use engine_level::Level;
use engine_math::{Rect, Vec2};
use tracing::trace;

use crate::body::{Position, RigidBody};
use crate::config::PhysicsConfig;

/// Ulp steps [`snap_axis`] may take to clear a tile after rounding.
const MAX_NUDGES: u32 = 8;

type LevelHook<'a> = Box<dyn FnOnce() + 'a>;
type BodyHook<'a> = Box<dyn FnMut(&RigidBody, Vec2) + 'a>;

/// Optional collision callbacks for one [`Physics::move_body`] call.
///
/// ```rust,ignore
/// let hooks = MoveHooks::new()
///     .on_level(|| broke = true)
///     .on_body(|other, _remaining| hits.push(other.entity));
/// ```
#[derive(Default)]
pub struct MoveHooks<'a> {
    on_level: Option<LevelHook<'a>>,
    on_body: Option<BodyHook<'a>>,
}

impl<'a> MoveHooks<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_level: None,
            on_body: None,
        }
    }

    /// Called the first time the move runs into a solid tile.
    #[must_use]
    pub fn on_level(mut self, hook: impl FnOnce() + 'a) -> Self {
        self.on_level = Some(Box::new(hook));
        self
    }

    /// Called for each other body overlapping a substep, with the movement
    /// still remaining at that point. May fire many times per move.
    #[must_use]
    pub fn on_body(mut self, hook: impl FnMut(&RigidBody, Vec2) + 'a) -> Self {
        self.on_body = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for MoveHooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoveHooks")
            .field("on_level", &self.on_level.is_some())
            .field("on_body", &self.on_body.is_some())
            .finish()
    }
}

/// The movement resolver.
#[derive(Debug, Clone, Default)]
pub struct Physics {
    config: PhysicsConfig,
}

impl Physics {
    #[must_use]
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Returns `true` if the body, nudged down by
    /// [`PhysicsConfig::ground_epsilon`], touches a solid tile.
    #[must_use]
    pub fn is_grounded(&self, level: &Level, position: Vec2, body: &RigidBody) -> bool {
        let probe = body.rect_at(position - Vec2::new(0.0, self.config.ground_epsilon));
        level.overlap(&probe).is_some()
    }

    /// Move `body`, currently centered at `position`, by `movement`, and
    /// return where it ends up.
    ///
    /// `world` is only read, to find the other bodies reported through
    /// [`MoveHooks::on_body`]; the caller writes the result back into the
    /// entity's [`Position`]. Non-finite movement is ignored.
    pub fn move_body(
        &self,
        world: &World,
        level: &Level,
        position: Vec2,
        body: &RigidBody,
        movement: Vec2,
        hooks: MoveHooks<'_>,
    ) -> Vec2 {
        let MoveHooks {
            mut on_level,
            mut on_body,
        } = hooks;
        if !movement.is_finite() {
            return position;
        }

        let others = if on_body.is_some() {
            other_bodies(world, body)
        } else {
            Vec::new()
        };

        let cfg = &self.config;
        let mut position = position;
        let mut remaining = movement;
        let mut passes = 0;
        let mut substeps = 0;

        while remaining.x.abs() >= cfg.epsilon || remaining.y.abs() >= cfg.epsilon {
            if passes >= cfg.max_iterations || substeps >= cfg.max_substeps {
                trace!(
                    entity = %body.entity,
                    passes,
                    substeps,
                    "movement stopped at iteration limit"
                );
                break;
            }

            let step = if remaining.length() > cfg.max_substep {
                remaining.normalize() * cfg.max_substep
            } else {
                remaining
            };
            let target = body.rect_at(position + step);

            if let Some(hook) = on_body.as_mut() {
                for (rect, other) in &others {
                    if rect.overlaps(&target) {
                        hook(other, remaining);
                    }
                }
            }

            if level.overlap(&target).is_none() {
                position += step;
                remaining -= step;
                substeps += 1;
                continue;
            }

            passes += 1;
            if let Some(hook) = on_level.take() {
                hook();
            }

            let half = body.size * 0.5;
            if step.y != 0.0
                && let Some(tile) = level.overlap(&body.rect_at(position + Vec2::new(0.0, step.y)))
            {
                let edge = if step.y > 0.0 {
                    tile.bottom() - half.y
                } else {
                    tile.top() + half.y
                };
                position.y = snap_axis(position.y, step.y, edge, |y| {
                    !body.rect_at(Vec2::new(position.x, y)).overlaps(&tile)
                });
                remaining.y = 0.0;
                continue;
            }

            if step.x != 0.0
                && let Some(tile) = level.overlap(&body.rect_at(position + Vec2::new(step.x, 0.0)))
            {
                let edge = if step.x > 0.0 {
                    tile.left() - half.x
                } else {
                    tile.right() + half.x
                };
                position.x = snap_axis(position.x, step.x, edge, |x| {
                    !body.rect_at(Vec2::new(x, position.y)).overlaps(&tile)
                });
                remaining.x = 0.0;
                continue;
            }

            remaining *= 0.5;
        }

        position
    }
}

/// Coordinate on one axis for a body moving by `step` from `from` into a
/// tile whose near edge puts the body's center at `edge`.
///
/// Rounding in `edge` can leave the body a fraction of a unit inside the
/// tile, so the result is stepped back one ulp at a time until `clear`
/// holds. It never lies behind `from` or beyond `from + step`.
fn snap_axis(from: f32, step: f32, edge: f32, clear: impl Fn(f32) -> bool) -> f32 {
    let mut snapped = edge;
    for _ in 0..MAX_NUDGES {
        if clear(snapped) {
            break;
        }
        snapped = if step > 0.0 {
            snapped.next_down()
        } else {
            snapped.next_up()
        };
    }
    if step > 0.0 {
        snapped.clamp(from, from + step)
    } else {
        snapped.clamp(from + step, from)
    }
}

/// Every body except `body` itself, with its current rectangle.
fn other_bodies(world: &World, body: &RigidBody) -> Vec<(Rect, RigidBody)> {
    world
        .components::<RigidBody>()
        .filter(|(entity, _)| *entity != body.entity)
        .filter_map(|(entity, other)| {
            let position = world.get::<Position>(entity).ok()?;
            Some((other.rect_at(position.as_vec()), *other))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_component::Entity;
    use engine_level::SpawnCallbacks;

    const BODY: Vec2 = Vec2::new(12.0, 12.0);

    fn level(text: &str) -> Level {
        Level::parse(text, &mut (), &mut SpawnCallbacks::new()).unwrap()
    }

    /// A solid column at tile x = 2 (world x 32..48), three tiles high.
    fn wall_level() -> Level {
        level("..#.\n..#.\n..#.\n")
    }

    fn body() -> RigidBody {
        RigidBody::new(Entity::INVALID, BODY)
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    #[test]
    fn test_free_movement() {
        let physics = Physics::default();
        let world = World::new();
        let level = level("....\n....\n....\n");
        let end = physics.move_body(
            &world,
            &level,
            Vec2::new(24.0, 24.0),
            &body(),
            Vec2::new(3.0, -4.0),
            MoveHooks::new(),
        );
        assert!(approx(end, Vec2::new(27.0, 20.0)), "{end}");
    }

    #[test]
    fn test_no_tunneling_through_thin_wall() {
        let physics = Physics::default();
        let world = World::new();
        let level = wall_level();
        // Three and four tile widths in one call.
        for dx in [48.0, 64.0] {
            let end = physics.move_body(
                &world,
                &level,
                Vec2::new(8.0, 24.0),
                &body(),
                Vec2::new(dx, 0.0),
                MoveHooks::new(),
            );
            assert_eq!(end, Vec2::new(26.0, 24.0));
            assert_eq!(body().rect_at(end).right(), 32.0);
        }
    }

    #[test]
    fn test_no_tunneling_moving_left() {
        let physics = Physics::default();
        let world = World::new();
        let level = wall_level();
        let end = physics.move_body(
            &world,
            &level,
            Vec2::new(58.0, 24.0),
            &body(),
            Vec2::new(-50.0, 0.0),
            MoveHooks::new(),
        );
        assert_eq!(end, Vec2::new(54.0, 24.0));
        assert_eq!(body().rect_at(end).left(), 48.0);
    }

    #[test]
    fn test_axis_separation_slides_along_wall() {
        let physics = Physics::default();
        let world = World::new();
        let level = wall_level();
        let mut level_hits = 0;
        let end = physics.move_body(
            &world,
            &level,
            Vec2::new(26.0, 20.0),
            &body(),
            Vec2::new(5.0, 5.0),
            MoveHooks::new().on_level(|| level_hits += 1),
        );
        // X is blocked flush against the wall, Y is applied in full.
        assert!(approx(end, Vec2::new(26.0, 25.0)), "{end}");
        assert_eq!(level_hits, 1);
    }

    #[test]
    fn test_landing_snaps_flush_on_floor() {
        let physics = Physics::default();
        let world = World::new();
        let level = level("....\n....\n####\n");
        let end = physics.move_body(
            &world,
            &level,
            Vec2::new(24.0, 40.0),
            &body(),
            Vec2::new(2.0, -30.0),
            MoveHooks::new(),
        );
        assert_eq!(body().rect_at(end).bottom(), 16.0);
        assert!(end.x > 24.0 && end.x <= 26.0 + 1e-3, "{end}");
    }

    #[test]
    fn test_level_hook_fires_once() {
        let physics = Physics::default();
        let world = World::new();
        // Floor plus a wall on the right.
        let level = level("...#\n...#\n####\n");
        let mut level_hits = 0;
        physics.move_body(
            &world,
            &level,
            Vec2::new(24.0, 26.0),
            &body(),
            Vec2::new(30.0, -30.0),
            MoveHooks::new().on_level(|| level_hits += 1),
        );
        assert_eq!(level_hits, 1);
    }

    #[test]
    fn test_corner_hit_stops_short() {
        let physics = Physics::default();
        let world = World::new();
        let level = level("...\n.#.\n...\n");
        let end = physics.move_body(
            &world,
            &level,
            Vec2::new(8.0, 8.0),
            &body(),
            Vec2::new(10.0, 10.0),
            MoveHooks::new(),
        );
        assert!(level.overlap(&body().rect_at(end)).is_none(), "{end}");
        assert!(end.x < 10.0 + 1e-3 && end.y < 10.0 + 1e-3, "{end}");
    }

    #[test]
    fn test_enclosed_body_terminates() {
        let physics = Physics::default();
        let world = World::new();
        let level = level("###\n###\n###\n");
        for movement in [
            Vec2::new(5.0, 5.0),
            Vec2::new(-100.0, 3.0),
            Vec2::new(0.0, -0.5),
        ] {
            let end = physics.move_body(
                &world,
                &level,
                Vec2::new(24.0, 24.0),
                &body(),
                movement,
                MoveHooks::new(),
            );
            assert!(end.is_finite());
        }
    }

    #[test]
    fn test_degenerate_movement() {
        let physics = Physics::new(PhysicsConfig::default().with_max_substeps(64));
        let world = World::new();
        let level = level("....\n");
        let start = Vec2::new(8.0, 8.0);
        let nan = physics.move_body(&world, &level, start, &body(), Vec2::NAN, MoveHooks::new());
        assert_eq!(nan, start);

        let far = physics.move_body(
            &world,
            &level,
            start,
            &body(),
            Vec2::new(1e9, 0.0),
            MoveHooks::new(),
        );
        assert!(approx(far, Vec2::new(72.0, 8.0)), "{far}");
    }

    #[test]
    fn test_body_hook_reports_others_without_blocking() {
        let physics = Physics::default();
        let level = level("........\n");
        let mut world = World::new();

        let mover = world.spawn((Position::new(8.0, 8.0),)).unwrap();
        world
            .insert_component(mover, RigidBody::new(mover, BODY))
            .unwrap();
        let target = world.spawn((Position::new(40.0, 8.0),)).unwrap();
        world
            .insert_component(target, RigidBody::new(target, BODY))
            .unwrap();
        let far_away = world.spawn((Position::new(120.0, 8.0),)).unwrap();
        world
            .insert_component(far_away, RigidBody::new(far_away, BODY))
            .unwrap();

        let body = *world.get::<RigidBody>(mover).unwrap();
        let mut hits: Vec<Entity> = Vec::new();
        let end = physics.move_body(
            &world,
            &level,
            Vec2::new(8.0, 8.0),
            &body,
            Vec2::new(48.0, 0.0),
            MoveHooks::new().on_body(|other, remaining| {
                assert!(remaining.x > 0.0);
                hits.push(other.entity);
            }),
        );

        assert_eq!(end, Vec2::new(56.0, 8.0));
        assert!(hits.contains(&target));
        assert!(!hits.contains(&mover));
        assert!(!hits.contains(&far_away));
    }

    #[test]
    fn test_grounded() {
        let physics = Physics::default();
        let level = level("....\n####\n");
        // Bottom edge exactly on the floor top (y = 16).
        let resting = Vec2::new(24.0, 22.0);
        assert!(physics.is_grounded(&level, resting, &body()));
        assert!(!physics.is_grounded(&level, resting + Vec2::new(0.0, 0.05), &body()));
    }

    #[test]
    fn test_landed_body_walks_along_floor() {
        let physics = Physics::default();
        let world = World::new();
        let level = level("......\n......\n######\n");
        for size in [13.1, 12.3, 11.7, 9.9, 10.3, 12.9, 7.7] {
            let body = RigidBody::new(Entity::INVALID, Vec2::splat(size));
            let landed = physics.move_body(
                &world,
                &level,
                Vec2::new(40.0, 30.0),
                &body,
                Vec2::new(0.0, -10.0),
                MoveHooks::new(),
            );
            assert!(level.overlap(&body.rect_at(landed)).is_none(), "{size}: {landed}");
            assert!((body.rect_at(landed).bottom() - 16.0).abs() < 1e-4, "{size}: {landed}");
            assert!(physics.is_grounded(&level, landed, &body), "{size}");

            let walked = physics.move_body(
                &world,
                &level,
                landed,
                &body,
                Vec2::new(1.0, -0.1),
                MoveHooks::new(),
            );
            assert!((walked.x - (landed.x + 1.0)).abs() < 1e-3, "{size}: {walked}");
            assert!((walked.y - landed.y).abs() < 1e-4, "{size}: {walked}");
            assert!(level.overlap(&body.rect_at(walked)).is_none(), "{size}: {walked}");
        }
    }

    #[test]
    fn test_snap_never_moves_body_backwards() {
        let physics = Physics::default();
        let world = World::new();
        let level = level("......\n......\n######\n");
        // Starts sunk into the floor; a sideways move must not jump the body
        // to the far edge of the tile underneath.
        let start = Vec2::new(40.0, 21.5);
        let end = physics.move_body(
            &world,
            &level,
            start,
            &body(),
            Vec2::new(1.0, 0.0),
            MoveHooks::new(),
        );
        assert!(end.x >= start.x && end.x <= start.x + 1.0 + 1e-3, "{end}");
        assert!(end.y >= start.y, "{end}");
    }

    #[test]
    fn test_snap_axis_steps_out_of_rounding() {
        // Edge rounded one ulp into the tile on the way down.
        let top = 16.0_f32;
        let edge = top.next_down() + 6.0;
        let clear = |y: f32| y - 6.0 >= top;
        let snapped = snap_axis(30.0, -10.0, edge, clear);
        assert!(clear(snapped), "{snapped}");
        assert!(snapped <= 30.0 && snapped >= 20.0);
        // A snap behind the start of the step is clamped to it.
        assert_eq!(snap_axis(40.0, 1.0, 20.0, |_| true), 40.0);
        assert_eq!(snap_axis(40.0, -1.0, 60.0, |_| true), 40.0);
    }
}
