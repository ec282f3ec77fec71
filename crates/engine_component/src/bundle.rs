//! Component bundles: tuples of components inserted onto an entity together.

use crate::component::Component;
use crate::entity::Entity;
use crate::error::WorldError;
use crate::world::World;

/// A set of components that can be attached to an entity in one call.
///
/// Implemented for tuples of one to eight [`Component`] types. A tuple of
/// components that are all `Default` is itself `Default`, which is what
/// [`World::create`] builds on.
pub trait Bundle: 'static {
    /// Attach every component of the bundle to `entity`, in tuple order.
    fn insert_into(self, world: &mut World, entity: Entity) -> Result<(), WorldError>;
}

macro_rules! impl_bundle {
    ($($ty:ident),+) => {
        impl<$($ty: Component),+> Bundle for ($($ty,)+) {
            #[allow(non_snake_case)]
            fn insert_into(self, world: &mut World, entity: Entity) -> Result<(), WorldError> {
                let ($($ty,)+) = self;
                $(
                    world.insert_component(entity, $ty)?;
                )+
                Ok(())
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);
