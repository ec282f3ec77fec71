//! # engine_level
//!
//! Static level geometry. A [`Level`] is a dense grid of [`TileCode`]s built
//! once from a text map; any non-empty tile is solid. Characters in the map
//! can also trigger [`SpawnCallbacks`] so entity placement lives in level
//! data.
//!
//! Drawing goes through the [`Renderer`] and [`AssetLoader`] contracts, which
//! the host application implements.

pub mod error;
pub mod level;
pub mod render;
pub mod spawn;
pub mod tiles;

pub use error::{AssetError, LevelError};
pub use level::Level;
pub use render::{AssetLoader, Color, ImageId, Renderer, SpriteId};
pub use spawn::SpawnCallbacks;
pub use tiles::{TILE_SIZE, TILESET_PATH, TILESET_TILE_COUNT, TileCode};
