//! # engine_math
//!
//! Math types for the platformer engine. Re-exports [`glam`] for vector math
//! and defines [`Rect`], the center-plus-size box every collision query in
//! the engine is phrased in.
//!
//! World space is Y-up: `top()` is the larger Y coordinate.

pub mod rect;

// Re-export glam types for convenience.
pub use glam::{IVec2, UVec2, Vec2, ivec2, uvec2, vec2};

pub use rect::Rect;
