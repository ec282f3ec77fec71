//! World state storage.
//!
//! The [`World`] owns entity identity and every component value. It is the
//! single source of truth for gameplay state during a session.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::bundle::Bundle;
use crate::commands::Commands;
use crate::component::Component;
use crate::entity::{Entity, EntityAllocator};
use crate::error::WorldError;
use crate::query::{Query, QueryIter, Storages};
use crate::storage::{NamedStorage, SparseSet, downcast_mut, downcast_ref};

/// The entity-component store.
///
/// Component types are registered lazily the first time a value of that
/// type is stored. Each type lives in its own sparse set, so entities are
/// free to carry any combination of components.
#[derive(Default)]
pub struct World {
    /// Entity ID allocator.
    allocator: EntityAllocator,
    /// One storage per component type.
    storages: Storages,
}

impl World {
    /// Create a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            storages: HashMap::new(),
        }
    }

    // -- Entity lifecycle --

    /// Create an entity with a default-constructed component of every type
    /// in `B`.
    ///
    /// ```rust,ignore
    /// let player = world.create::<(Position, RigidBody, Player)>()?;
    /// ```
    pub fn create<B: Bundle + Default>(&mut self) -> Result<Entity, WorldError> {
        self.spawn(B::default())
    }

    /// Create an entity carrying the components in `bundle`.
    ///
    /// If the bundle names a component type twice the entity is rolled back
    /// and [`WorldError::DuplicateComponent`] is returned.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) -> Result<Entity, WorldError> {
        let entity = self.allocator.allocate()?;
        if let Err(err) = bundle.insert_into(self, entity) {
            self.delete(entity)?;
            return Err(err);
        }
        trace!(%entity, "entity created");
        Ok(entity)
    }

    /// Create an entity with no components.
    pub fn spawn_empty(&mut self) -> Result<Entity, WorldError> {
        let entity = self.allocator.allocate()?;
        trace!(%entity, "empty entity created");
        Ok(entity)
    }

    /// Delete an entity together with all of its components.
    pub fn delete(&mut self, entity: Entity) -> Result<(), WorldError> {
        self.check_alive(entity)?;
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        self.allocator.free(entity);
        trace!(%entity, "entity deleted");
        Ok(())
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Return the count of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.allocator.count()
    }

    /// Return all live entities.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.allocator.iter().collect()
    }

    // -- Component operations --

    /// Attach a default `T` to `entity` and return it for initialisation.
    pub fn add_component<T: Component>(&mut self, entity: Entity) -> Result<&mut T, WorldError> {
        self.insert_component(entity, T::default())
    }

    /// Attach `value` to `entity`.
    pub fn insert_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<&mut T, WorldError> {
        self.check_alive(entity)?;
        let set = self.storage_or_insert::<T>()?;
        set.insert(entity, value)
            .map_err(|_| WorldError::DuplicateComponent {
                entity,
                component: T::type_name(),
            })
    }

    /// Detach `T` from `entity` and return its value.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<T, WorldError> {
        self.check_alive(entity)?;
        self.storage_mut::<T>()?
            .and_then(|set| set.remove(entity))
            .ok_or(WorldError::MissingComponent {
                entity,
                component: T::type_name(),
            })
    }

    /// Shared access to `entity`'s `T`.
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T, WorldError> {
        self.check_alive(entity)?;
        self.storage::<T>()?
            .and_then(|set| set.get(entity))
            .ok_or(WorldError::MissingComponent {
                entity,
                component: T::type_name(),
            })
    }

    /// Mutable access to `entity`'s `T`.
    ///
    /// The reference is valid until the next structural change of the world,
    /// which the borrow checker enforces.
    pub fn get_component<T: Component>(&mut self, entity: Entity) -> Result<&mut T, WorldError> {
        self.check_alive(entity)?;
        self.storage_mut::<T>()?
            .and_then(|set| set.get_mut(entity))
            .ok_or(WorldError::MissingComponent {
                entity,
                component: T::type_name(),
            })
    }

    /// Check if an entity has a specific component. Never fails; unknown
    /// entities have no components.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.is_alive(entity)
            && matches!(self.storage::<T>(), Ok(Some(set)) if set.contains(entity))
    }

    /// Iterate every `(entity, &T)` pair in storage order.
    pub fn components<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.storage::<T>()
            .ok()
            .flatten()
            .into_iter()
            .flat_map(|set| set.iter())
    }

    /// Number of entities carrying a `T`.
    #[must_use]
    pub fn count<T: Component>(&self) -> usize {
        self.storage::<T>().ok().flatten().map_or(0, |set| set.len())
    }

    // -- Iteration --

    /// Lazily iterate `(entity, components)` for every entity having all of
    /// the component types in `Q`.
    pub fn query<Q: Query>(&mut self) -> Result<QueryIter<'_, Q>, WorldError> {
        let fetch = Q::fetch(&mut self.storages)?;
        Ok(QueryIter::new(fetch))
    }

    /// Lazily iterate the components of every entity matching `Q`.
    ///
    /// ```rust,ignore
    /// let first_enemy = world.iter::<(Position, Enemy)>()?.next();
    /// ```
    pub fn iter<Q: Query>(&mut self) -> Result<impl Iterator<Item = Q::Item<'_>>, WorldError> {
        Ok(self.query::<Q>()?.map(|(_, item)| item))
    }

    /// Call `visitor` once for every entity matching `Q`.
    pub fn iterate_comps<Q: Query>(
        &mut self,
        mut visitor: impl FnMut(Q::Item<'_>),
    ) -> Result<(), WorldError> {
        for (_, item) in self.query::<Q>()? {
            visitor(item);
        }
        Ok(())
    }

    /// Call `visitor` once for every entity matching `Q`, with the entity
    /// handle and a command queue.
    ///
    /// Structural changes recorded in the queue are applied after the last
    /// entity has been visited, so they never disturb the iteration.
    pub fn iterate_handle<Q: Query>(
        &mut self,
        mut visitor: impl FnMut(Entity, Q::Item<'_>, &mut Commands),
    ) -> Result<(), WorldError> {
        let mut commands = Commands::new();
        for (entity, item) in self.query::<Q>()? {
            visitor(entity, item, &mut commands);
        }
        self.apply(commands)
    }

    /// Apply a queue of deferred commands.
    pub fn apply(&mut self, commands: Commands) -> Result<(), WorldError> {
        commands.apply(self)
    }

    // -- Storage access --

    fn check_alive(&self, entity: Entity) -> Result<(), WorldError> {
        if self.allocator.is_alive(entity) {
            Ok(())
        } else {
            Err(WorldError::UnknownEntity(entity))
        }
    }

    fn storage<T: Component>(&self) -> Result<Option<&SparseSet<T>>, WorldError> {
        self.storages
            .get(&T::component_type_id())
            .map(|storage| downcast_ref::<T>(&**storage))
            .transpose()
    }

    fn storage_mut<T: Component>(&mut self) -> Result<Option<&mut SparseSet<T>>, WorldError> {
        self.storages
            .get_mut(&T::component_type_id())
            .map(|storage| downcast_mut::<T>(&mut **storage))
            .transpose()
    }

    fn storage_or_insert<T: Component>(&mut self) -> Result<&mut SparseSet<T>, WorldError> {
        let storage = self
            .storages
            .entry(T::component_type_id())
            .or_insert_with(|| {
                debug!(component = T::type_name(), "registering component storage");
                Box::new(NamedStorage {
                    name: T::type_name(),
                    set: SparseSet::<T>::new(),
                })
            });
        downcast_mut::<T>(&mut **storage)
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self
            .storages
            .values()
            .map(|s| (s.component_name(), s.len()))
            .collect();
        types.sort_unstable();
        f.debug_struct("World")
            .field("entities", &self.allocator.count())
            .field("components", &types)
            .finish()
    }
}
