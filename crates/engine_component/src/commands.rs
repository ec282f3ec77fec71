//! Deferred structural changes.
//!
//! Creating, deleting, or re-shaping entities while a query is running is
//! not allowed. Code that discovers such changes mid-iteration records them
//! in a [`Commands`] queue, and the queue is applied once the iteration is
//! over, either by [`World::iterate_handle`] or by [`World::apply`].

use tracing::debug;

use crate::bundle::Bundle;
use crate::component::Component;
use crate::entity::Entity;
use crate::error::WorldError;
use crate::world::World;

type Command = Box<dyn FnOnce(&mut World) -> Result<(), WorldError>>;

/// A queue of world mutations applied later, in the order recorded.
#[derive(Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    #[must_use]
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue an arbitrary mutation.
    pub fn push(&mut self, command: impl FnOnce(&mut World) -> Result<(), WorldError> + 'static) {
        self.queue.push(Box::new(command));
    }

    /// Queue creation of a new entity carrying `bundle`.
    pub fn spawn<B: Bundle>(&mut self, bundle: B) {
        self.push(move |world| world.spawn(bundle).map(|_| ()));
    }

    /// Queue deletion of `entity`.
    ///
    /// Several visitors may decide to delete the same entity in one pass, so
    /// deleting an entity that is already gone is not an error here.
    pub fn delete(&mut self, entity: Entity) {
        self.push(move |world| {
            if world.is_alive(entity) {
                world.delete(entity)
            } else {
                Ok(())
            }
        });
    }

    /// Queue attaching a default `T` to `entity`.
    pub fn add<T: Component>(&mut self, entity: Entity) {
        self.push(move |world| world.add_component::<T>(entity).map(|_| ()));
    }

    /// Queue attaching `value` to `entity`.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) {
        self.push(move |world| world.insert_component(entity, value).map(|_| ()));
    }

    /// Queue detaching `T` from `entity`.
    pub fn remove<T: Component>(&mut self, entity: Entity) {
        self.push(move |world| world.remove_component::<T>(entity).map(|_| ()));
    }

    /// Run every queued command against `world`.
    ///
    /// All commands run even if one fails; the first failure is returned.
    pub(crate) fn apply(self, world: &mut World) -> Result<(), WorldError> {
        if !self.queue.is_empty() {
            debug!(commands = self.queue.len(), "applying deferred commands");
        }
        let mut first_error = None;
        for command in self.queue {
            if let Err(err) = command(world) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commands")
            .field("len", &self.queue.len())
            .finish()
    }
}
