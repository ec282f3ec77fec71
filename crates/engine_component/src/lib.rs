//! # engine_component
//!
//! The entity-component store the rest of the engine is built on.
//!
//! This crate provides:
//!
//! - [`Entity`]: generational `u64` entity identifiers.
//! - [`EntityAllocator`]: slot allocator with a free list.
//! - [`Component`]: implemented by every per-entity data type.
//! - [`SparseSet`]: per-type storage with O(1) insert, remove and lookup.
//! - [`Query`]: tuples of component types iterated together.
//! - [`Bundle`]: tuples of components attached in one call.
//! - [`Commands`]: structural changes deferred until iteration is over.
//! - [`World`]: the store itself.

pub mod bundle;
pub mod commands;
pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod storage;
pub mod world;

pub use bundle::Bundle;
pub use commands::Commands;
pub use component::{Component, ComponentTypeId};
pub use entity::{Entity, EntityAllocator};
pub use error::WorldError;
pub use query::{Column, Fetch, Query, QueryIter};
pub use storage::{ErasedStorage, SparseSet};
pub use world::World;
