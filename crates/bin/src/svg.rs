//! SVG output for tree traces.

use std::fmt::Write;

use quadtree::{Body, Bounds, Painter, Style};

/// Painter that accumulates an SVG document covering `view`.
pub struct SvgPainter {
    view: Bounds,
    body: String,
}

impl SvgPainter {
    pub fn new(view: Bounds) -> Self {
        Self {
            view,
            body: String::with_capacity(64 * 1024),
        }
    }

    /// Draw a body as a filled circle.
    pub fn draw_body(&mut self, body: &Body) {
        let _ = writeln!(
            self.body,
            r##"  <circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="#4682b4" fill-opacity="0.5"/>"##,
            body.position.x, body.position.y, body.radius
        );
    }

    /// Close the document and return it.
    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{} {} {} {}\">\n{}</svg>\n",
            self.view.min_x,
            self.view.min_y,
            self.view.width(),
            self.view.height(),
            self.body
        )
    }
}

impl Painter for SvgPainter {
    fn draw_rectangle(&mut self, bounds: Bounds, style: &Style) {
        let _ = writeln!(
            self.body,
            r#"  <rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="rgb({},{},{})" stroke-width="{}"/>"#,
            bounds.min_x,
            bounds.min_y,
            bounds.width(),
            bounds.height(),
            style.stroke.r,
            style.stroke.g,
            style.stroke.b,
            style.line_width
        );
    }
}
