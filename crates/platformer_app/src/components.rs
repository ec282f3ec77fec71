//! Gameplay components.

use engine_component::{Component, Entity};
use engine_level::Color;
use engine_math::Vec2;

macro_rules! component {
    ($($ty:ident),+ $(,)?) => {
        $(impl Component for $ty {
            fn type_name() -> &'static str {
                stringify!($ty)
            }
        })+
    };
}

component!(
    Player, Velocity, Enemy, Plant, Turnip, Carrot, Spawner, Temporary, Particle, Background,
    Foreground, Sprite,
);

/// The player character.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// 0.0 is full, 1.0 is starved.
    pub hunger: f32,
    /// Eases towards `hunger` for the hunger bar.
    pub displayed_hunger: f32,
    /// Walk animation phase in [0, 1).
    pub walking_part: f32,
    /// -1.0 facing left, 1.0 facing right.
    pub look_direction: f32,
    /// The turnip being carried. A weak reference; check liveness before use.
    pub turnip: Option<Entity>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            hunger: 0.0,
            displayed_hunger: 0.0,
            walking_part: 0.0,
            look_direction: 1.0,
            turnip: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn as_vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// A walking enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enemy {
    /// -1.0 or 1.0.
    pub direction: f32,
}

impl Default for Enemy {
    fn default() -> Self {
        Self { direction: -1.0 }
    }
}

/// A turnip plant. Ready to pull once `growth` reaches 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plant {
    pub growth: f32,
    /// Growth per second.
    pub rate: f32,
}

impl Plant {
    #[must_use]
    pub fn is_ripe(&self) -> bool {
        self.growth >= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Turnip {
    /// Set once the turnip leaves the player's hands.
    pub thrown: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Carrot;

/// Periodically spawns an enemy at its position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spawner {
    /// Seconds until the next spawn.
    pub timer: f32,
}

/// Deleted once `lifetime` runs out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Temporary {
    pub lifetime: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle;

/// Drawn before the level.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Background;

/// Drawn after everything else.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Foreground;

/// A colored rectangle centered on the entity's position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sprite {
    pub size: Vec2,
    pub color: Color,
}

impl Sprite {
    #[must_use]
    pub const fn new(size: Vec2, color: Color) -> Self {
        Self { size, color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_component::ComponentTypeId;

    #[test]
    fn test_names_are_distinct() {
        let ids = [
            ComponentTypeId::of::<Player>(),
            ComponentTypeId::of::<Velocity>(),
            ComponentTypeId::of::<Enemy>(),
            ComponentTypeId::of::<Plant>(),
            ComponentTypeId::of::<Turnip>(),
            ComponentTypeId::of::<Carrot>(),
            ComponentTypeId::of::<Spawner>(),
            ComponentTypeId::of::<Temporary>(),
            ComponentTypeId::of::<Particle>(),
            ComponentTypeId::of::<Background>(),
            ComponentTypeId::of::<Foreground>(),
            ComponentTypeId::of::<Sprite>(),
            ComponentTypeId::of::<engine_physics::Position>(),
            ComponentTypeId::of::<engine_physics::RigidBody>(),
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(Player::type_name(), "Player");
    }

    #[test]
    fn test_player_defaults_face_right() {
        let player = Player::default();
        assert_eq!(player.look_direction, 1.0);
        assert_eq!(player.turnip, None);
    }
}
