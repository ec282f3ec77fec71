//! World error types.

use crate::entity::Entity;

/// Errors reported by structural and lookup operations on the [`World`].
///
/// All of these indicate a logic error in the calling code rather than a
/// runtime condition to recover from.
///
/// [`World`]: crate::World
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The entity was never created or has already been deleted.
    #[error("{0} does not exist")]
    UnknownEntity(Entity),

    /// The entity exists but has no component of this type.
    #[error("component '{component}' not found on {entity}")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    /// The entity already has a component of this type.
    #[error("component '{component}' already present on {entity}")]
    DuplicateComponent {
        entity: Entity,
        component: &'static str,
    },

    /// A query listed the same component type more than once.
    #[error("query names component '{0}' more than once")]
    AliasedQuery(&'static str),

    /// Two distinct Rust types produced the same component type id.
    #[error("component name '{requested}' hashes to the same id as '{existing}'")]
    TypeIdCollision {
        existing: &'static str,
        requested: &'static str,
    },

    /// Every entity index is in use.
    #[error("entity index space exhausted")]
    EntitiesExhausted,
}
