//! # engine_physics
//!
//! Moves rectangular bodies through a [`Level`](engine_level::Level)
//! without tunneling. Movement is cut into substeps of at most one world
//! unit; a substep that would overlap a solid tile is resolved one axis at a
//! time (Y first), snapping the body flush to the tile it hit.
//!
//! Other bodies never block movement. They are reported through
//! [`MoveHooks`] so gameplay code can react (a projectile hitting an enemy,
//! a player touching a pickup).

pub mod body;
pub mod config;
pub mod movement;

pub use body::{Position, RigidBody};
pub use config::PhysicsConfig;
pub use movement::{MoveHooks, Physics};
