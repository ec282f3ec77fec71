//! Rendering and asset-loading contracts.
//!
//! The engine core never talks to a graphics API. Hosts implement these
//! traits; the level uses them to slice its tileset and draw itself.

use engine_math::{Rect, UVec2, Vec2};

use crate::error::AssetError;

/// Handle to a loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

/// Handle to a rectangular region of a loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u32);

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }
}

/// A surface that accepts draw calls in world coordinates.
pub trait Renderer {
    /// Clear the frame.
    fn clear(&mut self, color: Color);

    /// Fill `rect`.
    fn draw_rect(&mut self, rect: Rect, color: Color);

    /// Blit `sprite` stretched over `rect`.
    fn draw_sprite(&mut self, rect: Rect, sprite: SpriteId);

    /// Set the world position shown at the center of the viewport.
    fn set_camera(&mut self, center: Vec2);

    /// Visible area in world units.
    fn viewport(&self) -> Vec2;
}

/// Synchronous loader for images and sprites.
pub trait AssetLoader {
    /// Load the image at `path`.
    fn load_image(&mut self, path: &str) -> Result<ImageId, AssetError>;

    /// Size of a loaded image in texels.
    fn image_size(&self, image: ImageId) -> UVec2;

    /// Create a sprite covering `size` texels of `image` starting at `origin`
    /// (top-left).
    fn create_sprite(&mut self, image: ImageId, origin: UVec2, size: UVec2) -> SpriteId;
}
