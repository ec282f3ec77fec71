//! Spawn markers.
//!
//! Level text can mark cells with characters that have a registered
//! callback. While the level is parsed each marked cell invokes its callback
//! with the cell's grid coordinates, which is how entities get placed from
//! level data.
//!
//! Callbacks receive a shared context value (usually the game world) instead
//! of capturing it, so any number of them can mutate the same state.

use std::collections::HashMap;

use engine_math::IVec2;

type SpawnFn<'a, C> = Box<dyn FnMut(&mut C, IVec2) + 'a>;

/// Map from level characters to spawn callbacks.
pub struct SpawnCallbacks<'a, C> {
    callbacks: HashMap<char, SpawnFn<'a, C>>,
}

impl<'a, C> SpawnCallbacks<'a, C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }

    /// Register `callback` for `marker`, replacing any earlier one.
    #[must_use]
    pub fn on(mut self, marker: char, callback: impl FnMut(&mut C, IVec2) + 'a) -> Self {
        self.callbacks.insert(marker, Box::new(callback));
        self
    }

    #[must_use]
    pub fn handles(&self, marker: char) -> bool {
        self.callbacks.contains_key(&marker)
    }

    /// Invoke the callback for `marker`, if any. Returns whether one ran.
    pub fn dispatch(&mut self, marker: char, ctx: &mut C, cell: IVec2) -> bool {
        match self.callbacks.get_mut(&marker) {
            Some(callback) => {
                callback(ctx, cell);
                true
            }
            None => false,
        }
    }
}

impl<C> Default for SpawnCallbacks<'_, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for SpawnCallbacks<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut markers: Vec<char> = self.callbacks.keys().copied().collect();
        markers.sort_unstable();
        f.debug_struct("SpawnCallbacks")
            .field("markers", &markers)
            .finish()
    }
}
