//! Headless implementations of the host services: input, audio, assets and
//! rendering.

use std::collections::HashMap;
use std::ops::Range;

use engine_level::{AssetError, AssetLoader, Color, ImageId, Renderer, SpriteId, TILESET_PATH};
use engine_math::{Rect, UVec2, Vec2, uvec2};
use tracing::debug;

/// Keys the game reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Jump,
    Action,
}

/// Synchronous key state for the current tick.
pub trait Input {
    /// The key is held this tick.
    fn is_down(&self, key: Key) -> bool;

    /// The key went down this tick.
    fn was_pressed(&self, key: Key) -> bool;
}

/// Input replayed from a fixed script of key presses.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    holds: Vec<(Key, Range<u64>)>,
    tick: u64,
}

impl ScriptedInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `key` during `ticks`.
    #[must_use]
    pub fn hold(mut self, key: Key, ticks: Range<u64>) -> Self {
        self.holds.push((key, ticks));
        self
    }

    /// A short walk through the meadow: run right, hop, pull and throw.
    #[must_use]
    pub fn demo() -> Self {
        let mut script = Self::new();
        for start in (0..2400).step_by(240) {
            script = script
                .hold(Key::Right, start..start + 150)
                .hold(Key::Jump, start + 40..start + 55)
                .hold(Key::Left, start + 170..start + 200)
                .hold(Key::Action, start + 205..start + 210)
                .hold(Key::Action, start + 225..start + 230);
        }
        script
    }

    /// Move the script to `tick`.
    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    fn held_at(&self, key: Key, tick: u64) -> bool {
        self.holds
            .iter()
            .any(|(k, ticks)| *k == key && ticks.contains(&tick))
    }
}

impl Input for ScriptedInput {
    fn is_down(&self, key: Key) -> bool {
        self.held_at(key, self.tick)
    }

    fn was_pressed(&self, key: Key) -> bool {
        self.held_at(key, self.tick)
            && (self.tick == 0 || !self.held_at(key, self.tick - 1))
    }
}

/// Short sound effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clip {
    Jump,
    Pull,
    Throw,
    Break,
    Hit,
    Eat,
    Music,
}

/// Fire-and-forget sound playback.
pub trait Audio {
    fn play(&mut self, clip: Clip, looping: bool);
}

/// Audio sink that logs and counts what would have played.
#[derive(Debug, Default)]
pub struct LogAudio {
    played: HashMap<Clip, u32>,
}

impl LogAudio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `clip` was played.
    #[must_use]
    pub fn count(&self, clip: Clip) -> u32 {
        self.played.get(&clip).copied().unwrap_or(0)
    }
}

impl Audio for LogAudio {
    fn play(&mut self, clip: Clip, looping: bool) {
        debug!(?clip, looping, "play");
        *self.played.entry(clip).or_default() += 1;
    }
}

/// Asset loader over a table of known image sizes. Nothing is decoded.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    images: Vec<(String, UVec2)>,
    sprites: Vec<(ImageId, UVec2, UVec2)>,
}

impl MemoryAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that knows the standard tileset (5×3 tiles).
    #[must_use]
    pub fn headless() -> Self {
        Self::new().with_image(TILESET_PATH, uvec2(80, 48))
    }

    #[must_use]
    pub fn with_image(mut self, path: impl Into<String>, size: UVec2) -> Self {
        self.images.push((path.into(), size));
        self
    }

    /// Number of sprites created so far.
    #[must_use]
    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }
}

impl AssetLoader for MemoryAssets {
    fn load_image(&mut self, path: &str) -> Result<ImageId, AssetError> {
        self.images
            .iter()
            .position(|(known, _)| known == path)
            .map(|index| ImageId(index as u32))
            .ok_or_else(|| AssetError::Load {
                path: path.to_string(),
                reason: "no such image".to_string(),
            })
    }

    fn image_size(&self, image: ImageId) -> UVec2 {
        self.images
            .get(image.0 as usize)
            .map_or(UVec2::ZERO, |(_, size)| *size)
    }

    fn create_sprite(&mut self, image: ImageId, origin: UVec2, size: UVec2) -> SpriteId {
        self.sprites.push((image, origin, size));
        SpriteId(self.sprites.len() as u32 - 1)
    }
}

/// Renderer that only counts draw calls, for running without a window.
#[derive(Debug, Clone)]
pub struct HeadlessRenderer {
    viewport: Vec2,
    camera: Vec2,
    /// Frames cleared so far.
    pub frames: u64,
    /// Rectangles drawn in the current frame.
    pub rects: Vec<(Rect, Color)>,
    /// Sprites drawn in the current frame.
    pub sprites: usize,
}

impl HeadlessRenderer {
    #[must_use]
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            camera: Vec2::ZERO,
            frames: 0,
            rects: Vec::new(),
            sprites: 0,
        }
    }

    #[must_use]
    pub fn camera(&self) -> Vec2 {
        self.camera
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new(Vec2::new(240.0, 135.0))
    }
}

impl Renderer for HeadlessRenderer {
    fn clear(&mut self, _color: Color) {
        self.frames += 1;
        self.rects.clear();
        self.sprites = 0;
    }

    fn draw_rect(&mut self, rect: Rect, color: Color) {
        self.rects.push((rect, color));
    }

    fn draw_sprite(&mut self, _rect: Rect, _sprite: SpriteId) {
        self.sprites += 1;
    }

    fn set_camera(&mut self, center: Vec2) {
        self.camera = center;
    }

    fn viewport(&self) -> Vec2 {
        self.viewport
    }
}
