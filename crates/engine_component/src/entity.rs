//! Entity type and allocation utilities.
//!
//! An [`Entity`] is a lightweight `u64` identifier with no inherent data. It
//! packs a slot index (low 32 bits) and a generation (high 32 bits). Slots
//! are recycled after deletion, but every recycle bumps the generation, so a
//! handle kept past its entity's deletion never aliases a newer entity.

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Handle to one game object: the player, an enemy, a particle.
///
/// Carries no data itself; everything about the object lives in components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// The null / invalid entity sentinel. No allocator ever hands it out.
    pub const INVALID: Entity = Entity(0);

    /// Build an entity from a slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    /// Create an entity from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// The storage slot this entity occupies.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns `true` if this is not [`Entity::INVALID`].
    ///
    /// This says nothing about liveness; ask the world for that.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}v{})", self.index(), self.generation())
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
}

/// Allocates entity IDs and tracks which of them are live.
///
/// Freed slots go on a free list and are handed out again with the next
/// generation. Generations start at 1, so [`Entity::INVALID`] is never
/// produced.
#[derive(Debug)]
pub struct EntityAllocator {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl EntityAllocator {
    /// Creates a new, empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Allocates a fresh entity ID.
    ///
    /// Fails with [`WorldError::EntitiesExhausted`] once every index a `u32`
    /// can hold is live.
    pub fn allocate(&mut self) -> Result<Entity, WorldError> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            self.live += 1;
            return Ok(Entity::new(index, slot.generation));
        }

        let index = next_index(self.slots.len())?;
        self.slots.push(Slot {
            generation: 1,
            alive: true,
        });
        self.live += 1;
        Ok(Entity::new(index, 1))
    }

    /// Releases `entity`, making its slot available for reuse.
    ///
    /// Returns `false` if the entity was not live.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let index = entity.index();
        let slot = &mut self.slots[index as usize];
        slot.alive = false;
        // Generation 0 would let a recycled slot produce Entity::INVALID.
        slot.generation = slot.generation.checked_add(1).unwrap_or(1);
        self.free.push(index);
        self.live -= 1;
        true
    }

    /// Returns `true` if `entity` was allocated and has not been freed since.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index() as usize)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation())
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn count(&self) -> usize {
        self.live
    }

    /// Iterates live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| Entity::new(index as u32, slot.generation))
    }
}

fn next_index(len: usize) -> Result<u32, WorldError> {
    u32::try_from(len).map_err(|_| WorldError::EntitiesExhausted)
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
