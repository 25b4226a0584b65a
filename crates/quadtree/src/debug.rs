//! Debug drawing hooks used by [`QuadTree::trace_debug`](crate::QuadTree::trace_debug).

use crate::spatial::Bounds;

/// RGB color used for outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Outline style for node rectangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub stroke: Color,
    pub line_width: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: Color::new(0x3c, 0xb3, 0x71),
            line_width: 1.0,
        }
    }
}

/// A drawing surface that can outline rectangles.
pub trait Painter {
    fn draw_rectangle(&mut self, bounds: Bounds, style: &Style);
}

impl<T: Painter + ?Sized> Painter for &mut T {
    fn draw_rectangle(&mut self, bounds: Bounds, style: &Style) {
        (**self).draw_rectangle(bounds, style);
    }
}

/// Painter that records every call, for tests and headless inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingPainter {
    pub rectangles: Vec<(Bounds, Style)>,
}

impl Painter for RecordingPainter {
    fn draw_rectangle(&mut self, bounds: Bounds, style: &Style) {
        self.rectangles.push((bounds, *style));
    }
}
