//! Tile codes and the map character table.

/// Side length of one tile in world units.
pub const TILE_SIZE: f32 = 16.0;

/// Side length of one tile in tileset texels.
pub const TILE_TEXELS: u32 = 16;

/// Number of tiles sliced from the tileset image.
pub const TILESET_TILE_COUNT: usize = 15;

/// Asset path of the tileset image.
pub const TILESET_PATH: &str = "Tileset.png";

/// The type of one grid cell.
///
/// Code 0 is empty. Every other code is solid; the code only selects which
/// tileset sprite is drawn (sprite index `code - 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileCode(pub u8);

impl TileCode {
    pub const EMPTY: TileCode = TileCode(0);

    /// Map a level-text character to its tile code.
    ///
    /// Characters outside the table are empty.
    #[must_use]
    pub const fn from_char(c: char) -> Self {
        let code = match c {
            '[' => 1,
            '=' => 2,
            ']' => 3,
            '<' => 4,
            '#' => 5,
            '>' => 6,
            ';' => 7,
            '-' => 8,
            ':' => 9,
            '(' => 10,
            '_' => 11,
            ')' => 12,
            'G' => 14,
            _ => 0,
        };
        Self(code)
    }

    #[must_use]
    pub const fn is_solid(self) -> bool {
        self.0 != 0
    }

    /// Index into the tileset sprites, or `None` for the empty tile.
    #[must_use]
    pub const fn sprite_index(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0 as usize - 1)
        }
    }
}
