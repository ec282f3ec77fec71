//! Spatial components.

use engine_component::{Component, Entity};
use engine_math::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// World position of an entity's center.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn as_vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set(&mut self, value: Vec2) {
        self.x = value.x;
        self.y = value.y;
    }
}

impl From<Vec2> for Position {
    fn from(value: Vec2) -> Self {
        Self::new(value.x, value.y)
    }
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// Axis-aligned collision box, centered on the entity's [`Position`].
///
/// Bodies are expected to be no larger than one tile.
///
/// `entity` points back at the owning entity. Collision hooks receive the
/// body rather than the entity, and use it to look up what they hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    /// Full width and height.
    pub size: Vec2,
    /// The entity this body belongs to.
    pub entity: Entity,
}

impl RigidBody {
    #[must_use]
    pub const fn new(entity: Entity, size: Vec2) -> Self {
        Self { size, entity }
    }

    /// The body's rectangle when centered at `center`.
    #[must_use]
    pub fn rect_at(&self, center: Vec2) -> Rect {
        Rect::from_center_size(center, self.size)
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new(Entity::INVALID, Vec2::ZERO)
    }
}

impl Component for RigidBody {
    fn type_name() -> &'static str {
        "RigidBody"
    }
}
