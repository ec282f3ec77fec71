//! Multi-component queries.
//!
//! A [`Query`] is a tuple of component types, e.g. `(Position, RigidBody)`.
//! Running it yields one item per entity that has *every* listed component,
//! as a tuple of mutable references in the same order.
//!
//! Iteration is driven by the storage order of the first type in the tuple,
//! and each matching entity is visited exactly once. The set of entities is
//! fixed when the query starts; the borrow checker rejects structural changes
//! to the world while a query is alive (use [`Commands`] for those).
//!
//! [`Commands`]: crate::Commands

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::component::{Component, ComponentTypeId};
use crate::entity::Entity;
use crate::error::WorldError;
use crate::storage::{ErasedStorage, SparseSet, downcast_mut};

/// Component storages keyed by type id, as owned by a [`World`](crate::World).
pub type Storages = HashMap<ComponentTypeId, Box<dyn ErasedStorage>>;

/// A tuple of component types that can be iterated together.
///
/// Implemented for tuples of one to six [`Component`] types.
pub trait Query {
    /// The per-entity item: a tuple of `&mut` component references.
    type Item<'w>;

    /// Borrowed column state the iterator pulls items from.
    type Fetch<'w>: Fetch<'w, Item = Self::Item<'w>>;

    /// Borrow every column named by the query.
    ///
    /// Returns `Ok(None)` when one of the types has never been stored, in
    /// which case nothing can match.
    fn fetch(storages: &mut Storages) -> Result<Option<Self::Fetch<'_>>, WorldError>;
}

/// Column state of a running query.
pub trait Fetch<'w> {
    type Item;

    /// Entities to visit, in order.
    fn driver(&self) -> &'w [Entity];

    /// Take the item for `entity`, or `None` if it lacks one of the columns.
    fn take(&mut self, entity: Entity) -> Option<Self::Item>;
}

/// One component column borrowed for the duration of a query.
///
/// Each row is handed out at most once, which is what lets several rows be
/// borrowed mutably at the same time. Taken rows are recorded in a bitset
/// that only grows as far as the highest row taken, so a query that stops
/// early never touches the rest of the column.
pub struct Column<'w, T> {
    sparse: &'w [Option<u32>],
    entities: &'w [Entity],
    values: *mut T,
    taken: Vec<u64>,
    _values: PhantomData<&'w mut [T]>,
}

impl<'w, T> Column<'w, T> {
    fn new(set: &'w mut SparseSet<T>) -> Self {
        let (sparse, entities, values) = set.split_mut();
        debug_assert_eq!(entities.len(), values.len());
        Self {
            sparse,
            entities,
            values: values.as_mut_ptr(),
            taken: Vec::new(),
            _values: PhantomData,
        }
    }

    fn row(&self, entity: Entity) -> Option<usize> {
        let row = (*self.sparse.get(entity.index() as usize)?)? as usize;
        (*self.entities.get(row)? == entity).then_some(row)
    }

    fn is_taken(&self, row: usize) -> bool {
        self.taken
            .get(row / 64)
            .is_some_and(|word| word & (1 << (row % 64)) != 0)
    }

    fn has(&self, entity: Entity) -> bool {
        self.row(entity).is_some_and(|row| !self.is_taken(row))
    }

    fn take(&mut self, entity: Entity) -> Option<&'w mut T> {
        let row = self.row(entity)?;
        if self.is_taken(row) {
            return None;
        }
        let word = row / 64;
        if self.taken.len() <= word {
            self.taken.resize(word + 1, 0);
        }
        self.taken[word] |= 1 << (row % 64);
        // SAFETY: `row` indexes `entities`, which is as long as the value
        // slice borrowed mutably for 'w. The bit just set guarantees no other
        // reference to this row was handed out.
        Some(unsafe { &mut *self.values.add(row) })
    }
}

fn check_distinct(ids: &[(ComponentTypeId, &'static str)]) -> Result<(), WorldError> {
    for (i, (id, name)) in ids.iter().enumerate() {
        if ids[..i].iter().any(|(other, _)| other == id) {
            return Err(WorldError::AliasedQuery(name));
        }
    }
    Ok(())
}

macro_rules! impl_query {
    ($(($ty:ident, $col:ident)),+) => {
        impl<$($ty: Component),+> Query for ($($ty,)+) {
            type Item<'w> = ($(&'w mut $ty,)+);
            type Fetch<'w> = ($(Column<'w, $ty>,)+);

            fn fetch(storages: &mut Storages) -> Result<Option<Self::Fetch<'_>>, WorldError> {
                check_distinct(&[$(($ty::component_type_id(), $ty::type_name())),+])?;
                let [$($col),+] = storages.get_disjoint_mut([$(&$ty::component_type_id()),+]);
                $(
                    let Some($col) = $col else {
                        return Ok(None);
                    };
                )+
                Ok(Some(($(Column::new(downcast_mut::<$ty>(&mut **$col)?),)+)))
            }
        }

        impl<'w, $($ty: Component),+> Fetch<'w> for ($(Column<'w, $ty>,)+) {
            type Item = ($(&'w mut $ty,)+);

            fn driver(&self) -> &'w [Entity] {
                self.0.entities
            }

            fn take(&mut self, entity: Entity) -> Option<Self::Item> {
                let ($($col,)+) = self;
                if !($($col.has(entity))&&+) {
                    return None;
                }
                Some(($($col.take(entity)?,)+))
            }
        }
    };
}

impl_query!((A, a));
impl_query!((A, a), (B, b));
impl_query!((A, a), (B, b), (C, c));
impl_query!((A, a), (B, b), (C, c), (D, d));
impl_query!((A, a), (B, b), (C, c), (D, d), (E, e));
impl_query!((A, a), (B, b), (C, c), (D, d), (E, e), (F, f));

/// Lazy iterator over the results of a [`Query`].
///
/// Yields `(Entity, item)` pairs. Dropping it early is fine; calling the
/// query again starts over.
pub struct QueryIter<'w, Q: Query> {
    driver: std::slice::Iter<'w, Entity>,
    fetch: Option<Q::Fetch<'w>>,
}

impl<'w, Q: Query> QueryIter<'w, Q> {
    pub(crate) fn new(fetch: Option<Q::Fetch<'w>>) -> Self {
        let driver: &'w [Entity] = match &fetch {
            Some(fetch) => fetch.driver(),
            None => &[],
        };
        Self {
            driver: driver.iter(),
            fetch,
        }
    }
}

impl<'w, Q: Query> Iterator for QueryIter<'w, Q> {
    type Item = (Entity, Q::Item<'w>);

    fn next(&mut self) -> Option<Self::Item> {
        let fetch = self.fetch.as_mut()?;
        for &entity in self.driver.by_ref() {
            if let Some(item) = fetch.take(entity) {
                return Some((entity, item));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.driver.len()))
    }
}
