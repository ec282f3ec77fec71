//! Per-type component storage.
//!
//! Each component type lives in its own [`SparseSet`]: a dense array of
//! values (fast iteration) plus a sparse entity-index → dense-row table
//! (O(1) lookup, insert and remove). The world holds one set per type behind
//! the type-erased [`ErasedStorage`] trait.

use std::any::{Any, TypeId};

use crate::component::Component;
use crate::entity::Entity;
use crate::error::WorldError;

/// Dense storage for one component type, indexed sparsely by entity.
///
/// Removal swaps the last row into the hole, so storage order is insertion
/// order until the first removal and stays deterministic afterwards.
#[derive(Debug, Clone)]
pub struct SparseSet<T> {
    /// `sparse[entity.index()]` is the dense row holding that entity's value.
    sparse: Vec<Option<u32>>,
    /// Owning entity of each dense row.
    entities: Vec<Entity>,
    /// Component values. `values[i]` belongs to `entities[i]`.
    values: Vec<T>,
}

impl<T> SparseSet<T> {
    /// Create a new, empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns the number of stored components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no components are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dense row of `entity`, checking the generation as well as the slot.
    #[must_use]
    pub fn row(&self, entity: Entity) -> Option<usize> {
        let row = (*self.sparse.get(entity.index() as usize)?)? as usize;
        (self.entities[row] == entity).then_some(row)
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.row(entity).is_some()
    }

    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.row(entity).map(|row| &self.values[row])
    }

    #[must_use]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.row(entity).map(|row| &mut self.values[row])
    }

    /// Store `value` for `entity` and return a reference to it.
    ///
    /// Returns the value back if the entity already has one; the existing
    /// value is left untouched.
    pub fn insert(&mut self, entity: Entity, value: T) -> Result<&mut T, T> {
        if self.contains(entity) {
            return Err(value);
        }
        let index = entity.index() as usize;
        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, None);
        }
        let row = self.values.len();
        self.sparse[index] = Some(row as u32);
        self.entities.push(entity);
        self.values.push(value);
        Ok(&mut self.values[row])
    }

    /// Remove and return the value stored for `entity`.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let row = self.row(entity)?;
        self.sparse[entity.index() as usize] = None;
        self.entities.swap_remove(row);
        let value = self.values.swap_remove(row);
        if let Some(&moved) = self.entities.get(row) {
            self.sparse[moved.index() as usize] = Some(row as u32);
        }
        Some(value)
    }

    /// Owning entities in storage order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Iterate `(entity, value)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Iterate `(entity, value)` pairs mutably in storage order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    /// Split into the lookup tables and the mutable value column.
    ///
    /// Queries use this to hand out `&mut T` for several rows at once while
    /// still resolving entities to rows.
    pub(crate) fn split_mut(&mut self) -> (&[Option<u32>], &[Entity], &mut [T]) {
        (&self.sparse, &self.entities, &mut self.values)
    }
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`SparseSet`], so the world can hold sets of
/// different component types in one map.
pub trait ErasedStorage: Any {
    /// Name of the stored component type.
    fn component_name(&self) -> &'static str;

    /// Rust type of the stored component, used to detect name-hash clashes.
    fn value_type(&self) -> TypeId;

    /// Drop the component of `entity`, if any. Returns whether one existed.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    fn contains_entity(&self, entity: Entity) -> bool;

    fn len(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A [`SparseSet`] tagged with its component's name.
pub(crate) struct NamedStorage<T> {
    pub(crate) name: &'static str,
    pub(crate) set: SparseSet<T>,
}

impl<T: 'static> ErasedStorage for NamedStorage<T> {
    fn component_name(&self) -> &'static str {
        self.name
    }

    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.set.remove(entity).is_some()
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.set.contains(entity)
    }

    fn len(&self) -> usize {
        self.set.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub(crate) fn downcast_ref<T: Component>(
    storage: &dyn ErasedStorage,
) -> Result<&SparseSet<T>, WorldError> {
    match storage.as_any().downcast_ref::<NamedStorage<T>>() {
        Some(named) => Ok(&named.set),
        None => Err(WorldError::TypeIdCollision {
            existing: storage.component_name(),
            requested: T::type_name(),
        }),
    }
}

pub(crate) fn downcast_mut<T: Component>(
    storage: &mut dyn ErasedStorage,
) -> Result<&mut SparseSet<T>, WorldError> {
    let existing = storage.component_name();
    match storage.as_any_mut().downcast_mut::<NamedStorage<T>>() {
        Some(named) => Ok(&mut named.set),
        None => Err(WorldError::TypeIdCollision {
            existing,
            requested: T::type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut set = SparseSet::new();
        let e = Entity::new(5, 1);
        set.insert(e, 3.5_f32).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(e), Some(&3.5));
    }

    #[test]
    fn test_insert_duplicate_returns_value() {
        let mut set = SparseSet::new();
        let e = Entity::new(0, 1);
        set.insert(e, 1).unwrap();
        assert!(matches!(set.insert(e, 2), Err(2)));
        assert_eq!(set.get(e), Some(&1));
    }

    #[test]
    fn test_stale_generation_is_not_found() {
        let mut set = SparseSet::new();
        set.insert(Entity::new(2, 1), "old").unwrap();
        assert!(!set.contains(Entity::new(2, 2)));
        assert_eq!(set.remove(Entity::new(2, 2)), None);
    }

    #[test]
    fn test_remove_keeps_other_rows_addressable() {
        let mut set = SparseSet::new();
        let a = Entity::new(0, 1);
        let b = Entity::new(1, 1);
        let c = Entity::new(2, 1);
        set.insert(a, 'a').unwrap();
        set.insert(b, 'b').unwrap();
        set.insert(c, 'c').unwrap();

        assert_eq!(set.remove(a), Some('a'));
        assert_eq!(set.get(b), Some(&'b'));
        assert_eq!(set.get(c), Some(&'c'));
        assert_eq!(set.entities(), &[c, b]);
        assert!(!set.contains(a));
    }

    #[test]
    fn test_remove_last_row() {
        let mut set = SparseSet::new();
        let a = Entity::new(0, 1);
        let b = Entity::new(1, 1);
        set.insert(a, 1).unwrap();
        set.insert(b, 2).unwrap();
        assert_eq!(set.remove(b), Some(2));
        assert_eq!(set.entities(), &[a]);
        assert_eq!(set.get(a), Some(&1));
    }

    #[test]
    fn test_erased_storage_downcast() {
        let mut storage: Box<dyn ErasedStorage> = Box::new(NamedStorage {
            name: "Score",
            set: SparseSet::<u32>::new(),
        });
        let e = Entity::new(0, 1);
        storage
            .as_any_mut()
            .downcast_mut::<NamedStorage<u32>>()
            .unwrap()
            .set
            .insert(e, 10)
            .unwrap();
        assert!(storage.contains_entity(e));
        assert_eq!(storage.component_name(), "Score");
        assert_eq!(storage.value_type(), TypeId::of::<u32>());
        assert!(storage.remove_entity(e));
        assert_eq!(storage.len(), 0);
    }
}
