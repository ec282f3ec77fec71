//! Level and asset error types.

use std::path::PathBuf;

/// Failure to load a visual resource.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The resource does not exist or could not be decoded.
    #[error("could not load asset '{path}': {reason}")]
    Load { path: String, reason: String },
}

/// Errors that can occur while building a [`Level`](crate::Level).
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// The level file could not be read.
    #[error("could not read level '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The map text has no tiles.
    #[error("level map is empty")]
    Empty,

    /// The tileset image has room for fewer tiles than the tile table uses.
    #[error("tileset is {width}x{height} texels, too small for the tile table")]
    TilesetTooSmall { width: u32, height: u32 },

    /// Loading the tileset failed.
    #[error(transparent)]
    Asset(#[from] AssetError),
}
