//! The tile grid.
//!
//! ## Coordinates
//!
//! Row 0 of the map text is the *top* of the level. World space is Y-up, so
//! text row `r` becomes tile row `height - 1 - r`. Tile `(x, y)` covers
//! `[x·16, x·16 + 16] × [y·16, y·16 + 16]` in world units and the whole map
//! covers `[0, width·16] × [0, height·16]`. Cells outside the grid are empty.

use std::path::Path;

use engine_math::{IVec2, Rect, Vec2, ivec2, uvec2};
use tracing::debug;

use crate::error::LevelError;
use crate::render::{AssetLoader, Renderer, SpriteId};
use crate::spawn::SpawnCallbacks;
use crate::tiles::{TILE_SIZE, TILE_TEXELS, TILESET_PATH, TILESET_TILE_COUNT, TileCode};

/// Static collision and visual geometry of one level.
#[derive(Debug, Clone)]
pub struct Level {
    /// Tile codes, row-major, text row 0 first.
    tiles: Vec<TileCode>,
    width: i32,
    height: i32,
    /// Tileset sprites, indexed by [`TileCode::sprite_index`]. Empty when
    /// the level was parsed without an asset loader.
    sprites: Vec<SpriteId>,
}

impl Level {
    /// Build a level from map text, loading its tileset through `assets`.
    ///
    /// Every character with a registered callback in `spawns` invokes it
    /// with `ctx` and the character's tile coordinates.
    pub fn new<C>(
        text: &str,
        assets: &mut dyn AssetLoader,
        ctx: &mut C,
        spawns: &mut SpawnCallbacks<'_, C>,
    ) -> Result<Self, LevelError> {
        let sprites = load_tileset(assets)?;
        let mut level = Self::parse(text, ctx, spawns)?;
        level.sprites = sprites;
        Ok(level)
    }

    /// Read the map text from `path` and build the level as [`Level::new`]
    /// does.
    pub fn load<C>(
        path: impl AsRef<Path>,
        assets: &mut dyn AssetLoader,
        ctx: &mut C,
        spawns: &mut SpawnCallbacks<'_, C>,
    ) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LevelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(&text, assets, ctx, spawns)
    }

    /// Build the collision grid from map text without any visuals.
    ///
    /// Rows shorter than the widest row are padded with empty tiles.
    pub fn parse<C>(
        text: &str,
        ctx: &mut C,
        spawns: &mut SpawnCallbacks<'_, C>,
    ) -> Result<Self, LevelError> {
        let rows: Vec<Vec<char>> = text
            .lines()
            .map(|line| line.chars().filter(|&c| c != '\r').collect())
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let height = rows.len();
        if width == 0 {
            return Err(LevelError::Empty);
        }

        let mut tiles = vec![TileCode::EMPTY; width * height];
        let mut spawned = 0;
        for (r, row) in rows.iter().enumerate() {
            let tile_y = (height - 1 - r) as i32;
            for (x, &c) in row.iter().enumerate() {
                tiles[r * width + x] = TileCode::from_char(c);
                if spawns.dispatch(c, ctx, ivec2(x as i32, tile_y)) {
                    spawned += 1;
                }
            }
        }

        debug!(width, height, spawned, "level parsed");
        Ok(Self {
            tiles,
            width: width as i32,
            height: height as i32,
            sprites: Vec::new(),
        })
    }

    /// Width in tiles.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x >= self.width || cell.y >= self.height {
            return None;
        }
        let row = self.height - 1 - cell.y;
        Some((row * self.width + cell.x) as usize)
    }

    /// The tile at `cell`, empty outside the grid.
    #[must_use]
    pub fn tile_at(&self, cell: IVec2) -> TileCode {
        self.index(cell)
            .map_or(TileCode::EMPTY, |index| self.tiles[index])
    }

    /// The cell containing world point `point`.
    #[must_use]
    pub fn cell_of(point: Vec2) -> IVec2 {
        (point / TILE_SIZE).floor().as_ivec2()
    }

    /// World rectangle covered by `cell`.
    #[must_use]
    pub fn cell_rect(cell: IVec2) -> Rect {
        let half = TILE_SIZE * 0.5;
        Rect::new(
            cell.x as f32 * TILE_SIZE + half,
            cell.y as f32 * TILE_SIZE + half,
            TILE_SIZE,
            TILE_SIZE,
        )
    }

    /// First solid tile overlapping `rect`, as a world rectangle.
    ///
    /// Only the cell containing the rectangle's center and its eight
    /// neighbours are examined (bottom row first, left to right). This is
    /// exact for rectangles no larger than one tile.
    #[must_use]
    pub fn overlap(&self, rect: &Rect) -> Option<Rect> {
        let center = Self::cell_of(rect.center);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let cell = center + ivec2(dx, dy);
                if !self.tile_at(cell).is_solid() {
                    continue;
                }
                let tile = Self::cell_rect(cell);
                if tile.overlaps(rect) {
                    return Some(tile);
                }
            }
        }
        None
    }

    /// World rectangle enclosing the whole grid.
    #[must_use]
    pub fn map_bounds(&self) -> Rect {
        let size = Vec2::new(self.width as f32, self.height as f32) * TILE_SIZE;
        Rect::from_center_size(size * 0.5, size)
    }

    /// Draw every non-empty tile, top row first.
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        if self.sprites.is_empty() {
            return;
        }
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let cell = ivec2(x, y);
                let Some(sprite) = self
                    .tile_at(cell)
                    .sprite_index()
                    .and_then(|i| self.sprites.get(i))
                else {
                    continue;
                };
                renderer.draw_sprite(Self::cell_rect(cell), *sprite);
            }
        }
    }
}

/// Slice the tileset image into [`TILESET_TILE_COUNT`] tile sprites, left to
/// right, top to bottom.
fn load_tileset(assets: &mut dyn AssetLoader) -> Result<Vec<SpriteId>, LevelError> {
    let image = assets.load_image(TILESET_PATH)?;
    let size = assets.image_size(image);
    let per_row = size.x / TILE_TEXELS;
    let rows = size.y / TILE_TEXELS;
    if per_row == 0 || ((per_row * rows) as usize) < TILESET_TILE_COUNT {
        return Err(LevelError::TilesetTooSmall {
            width: size.x,
            height: size.y,
        });
    }

    let tile = uvec2(TILE_TEXELS, TILE_TEXELS);
    Ok((0..TILESET_TILE_COUNT as u32)
        .map(|i| {
            let origin = uvec2(i % per_row, i / per_row) * TILE_TEXELS;
            assets.create_sprite(image, origin, tile)
        })
        .collect())
}
