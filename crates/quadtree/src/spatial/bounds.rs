//! Axis-aligned rectangles in screen orientation (y grows downward).

use glam::Vec2;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Create bounds from a top-left corner and a size.
    #[inline]
    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Create bounds from its four edges. `top` is the smaller y.
    #[inline]
    pub fn from_edges(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self::new(left, top, right, bottom)
    }

    /// Create bounds from center and half extent.
    #[inline]
    pub fn from_center(cx: f32, cy: f32, size: f32) -> Self {
        Self {
            min_x: cx - size,
            min_y: cy - size,
            max_x: cx + size,
            max_y: cy + size,
        }
    }

    /// Check if two bounds overlap. Touching edges count as overlap.
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Check if `other` lies entirely inside these bounds (edges inclusive).
    #[inline]
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Inclusive point-in-rectangle test.
    #[inline]
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Inclusive test of a disc against these bounds, per axis.
    #[inline]
    pub fn overlaps_disc(&self, center: Vec2, radius: f32) -> bool {
        center.x + radius >= self.min_x
            && center.x - radius <= self.max_x
            && center.y + radius >= self.min_y
            && center.y - radius <= self.max_y
    }

    /// Get the width of the bounds.
    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Get the height of the bounds.
    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn min_side(&self) -> f32 {
        self.width().min(self.height())
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite() && self.min_y.is_finite() && self.max_x.is_finite() && self.max_y.is_finite()
    }

    /// Point where the quadrant split lines cross.
    #[inline]
    fn split_point(&self) -> (f32, f32) {
        (
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }

    /// Whether splitting yields four strictly smaller quadrants.
    ///
    /// False once the extent is so small relative to the coordinates that
    /// the split line rounds onto an edge.
    pub fn is_splittable(&self) -> bool {
        let (mid_x, mid_y) = self.split_point();
        mid_x > self.min_x && mid_x < self.max_x && mid_y > self.min_y && mid_y < self.max_y
    }

    /// Split into four quadrants ordered south-east, south-west, north-west, north-east.
    ///
    /// Neighbouring quadrants share the exact same split coordinate, so the
    /// four tile the parent with no gap.
    pub fn quadrants(&self) -> [Bounds; 4] {
        let (mid_x, mid_y) = self.split_point();
        [
            Bounds::new(mid_x, mid_y, self.max_x, self.max_y),
            Bounds::new(self.min_x, mid_y, mid_x, self.max_y),
            Bounds::new(self.min_x, self.min_y, mid_x, mid_y),
            Bounds::new(mid_x, self.min_y, self.max_x, mid_y),
        ]
    }
}
