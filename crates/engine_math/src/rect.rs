//! Axis-aligned rectangle.
//!
//! [`Rect`] stores its center and full size rather than a corner, matching
//! how entity positions are stored (the authoritative position of an entity
//! is the center of its body).

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in Y-up world space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Rect {
    /// Center point.
    pub center: Vec2,
    /// Full width and height.
    pub size: Vec2,
}

impl Rect {
    /// Create a rectangle from its center coordinates and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            center: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Create a rectangle from a center point and a size.
    #[must_use]
    pub const fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Half of [`Rect::size`].
    #[must_use]
    pub fn half_size(&self) -> Vec2 {
        self.size * 0.5
    }

    #[must_use]
    pub fn left(&self) -> f32 {
        self.center.x - self.size.x * 0.5
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.center.x + self.size.x * 0.5
    }

    #[must_use]
    pub fn top(&self) -> f32 {
        self.center.y + self.size.y * 0.5
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.center.y - self.size.y * 0.5
    }

    /// The same rectangle moved by `offset`.
    #[must_use]
    pub fn translated(mut self, offset: Vec2) -> Self {
        self.center += offset;
        self
    }

    /// Returns `true` if the interiors of the two rectangles intersect.
    ///
    /// Rectangles that only share an edge do not overlap, so a body resting
    /// flush against a wall is not reported as colliding with it.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.bottom() < other.top()
            && self.top() > other.bottom()
    }

    /// Returns `true` if `point` lies inside or on the border.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.bottom()
            && point.y <= self.top()
    }

    /// Clamp `point` so a box of `extent` centered on it stays inside `self`.
    ///
    /// If the extent is larger than the rectangle on an axis, that axis is
    /// pinned to the center. Used for camera clamping against map bounds.
    #[must_use]
    pub fn clamp_inside(&self, point: Vec2, extent: Vec2) -> Vec2 {
        let half = extent * 0.5;
        let clamp_axis = |p: f32, lo: f32, hi: f32, mid: f32| {
            if lo > hi { mid } else { p.clamp(lo, hi) }
        };
        Vec2::new(
            clamp_axis(
                point.x,
                self.left() + half.x,
                self.right() - half.x,
                self.center.x,
            ),
            clamp_axis(
                point.y,
                self.bottom() + half.y,
                self.top() - half.y,
                self.center.y,
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let r = Rect::new(10.0, 20.0, 4.0, 6.0);
        assert_eq!(r.left(), 8.0);
        assert_eq!(r.right(), 12.0);
        assert_eq!(r.bottom(), 17.0);
        assert_eq!(r.top(), 23.0);
    }

    #[test]
    fn test_overlap_intersecting() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(6.0, 6.0, 4.0, 4.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(10.0, 0.0, 10.0, 10.0);
        let above = Rect::new(0.0, 10.0, 10.0, 10.0);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&above));
    }

    #[test]
    fn test_contained_rect_overlaps() {
        let outer = Rect::new(8.0, 8.0, 16.0, 16.0);
        let inner = Rect::new(8.0, 8.0, 2.0, 2.0);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_translated() {
        let r = Rect::new(1.0, 1.0, 2.0, 2.0).translated(Vec2::new(3.0, -1.0));
        assert_eq!(r.center, Vec2::new(4.0, 0.0));
        assert_eq!(r.size, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_clamp_inside() {
        let bounds = Rect::new(50.0, 50.0, 100.0, 100.0);
        let view = Vec2::new(20.0, 20.0);
        assert_eq!(bounds.clamp_inside(Vec2::new(0.0, 0.0), view), Vec2::new(10.0, 10.0));
        assert_eq!(bounds.clamp_inside(Vec2::new(50.0, 95.0), view), Vec2::new(50.0, 90.0));
        // A view wider than the map is centered.
        let wide = Vec2::new(200.0, 20.0);
        assert_eq!(bounds.clamp_inside(Vec2::new(0.0, 0.0), wide), Vec2::new(50.0, 10.0));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let r = Rect::new(1.5, -2.0, 16.0, 8.0);
        let json = serde_json::to_string(&r).unwrap();
        let restored: Rect = serde_json::from_str(&json).unwrap();
        assert_eq!(r, restored);
    }
}
