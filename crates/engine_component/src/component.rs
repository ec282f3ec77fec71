//! The [`Component`] trait and component type ids.
//!
//! A component type is identified by the FNV-1a 64-bit hash of its name, so
//! ids are the same in every build and readable in logs. Storing two Rust
//! types whose names hash alike is refused by the world.

/// Id of a component type: FNV-1a 64 of [`Component::type_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    /// Hash `name`: for each byte, xor it in, then multiply by the prime.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::PRIME);
            i += 1;
        }
        Self(hash)
    }

    #[must_use]
    pub fn of<T: Component>() -> Self {
        T::component_type_id()
    }
}

/// Per-entity data.
///
/// `Default` is required so [`World::create`](crate::World::create) can
/// build an entity from types alone and let the caller fill values in.
///
/// ```rust
/// use engine_component::Component;
///
/// #[derive(Debug, Default)]
/// struct Lives(u8);
///
/// impl Component for Lives {
///     fn type_name() -> &'static str {
///         "Lives"
///     }
/// }
/// ```
pub trait Component: Default + 'static {
    /// Stable name of the type, hashed into its [`ComponentTypeId`].
    fn type_name() -> &'static str;

    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Lives(u8);

    impl Component for Lives {
        fn type_name() -> &'static str {
            "Lives"
        }
    }

    #[derive(Debug, Default)]
    struct Coins(u32);

    impl Component for Coins {
        fn type_name() -> &'static str {
            "Coins"
        }
    }

    #[test]
    fn test_id_is_hash_of_name() {
        assert_eq!(ComponentTypeId::of::<Lives>(), ComponentTypeId::from_name("Lives"));
        assert_ne!(ComponentTypeId::of::<Lives>(), ComponentTypeId::of::<Coins>());
    }

    #[test]
    fn test_fnv1a_vectors() {
        assert_eq!(ComponentTypeId::from_name("").0, 0xcbf2_9ce4_8422_2325);
        assert_eq!(ComponentTypeId::from_name("a").0, 0xaf63_dc4c_8601_ec8c);
    }
}
