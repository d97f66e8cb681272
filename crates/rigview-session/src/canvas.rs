//! Offscreen drawing surface for identity passes.
//!
//! Hover picking needs a tiny subset of a renderer: clear to a flat color,
//! draw unit quads through an MVP matrix in a flat color, read one pixel
//! back. [`PickCanvas`] captures that subset so the pass code runs against a
//! GPU framebuffer in a host application and against [`SoftwareCanvas`] in
//! tests and headless tools.

use nalgebra::{Matrix4, Vector4};
use rigview_core::pick::PickColor;

/// Render target for identity passes.
///
/// Draw order resolves overlap: the last quad drawn owns the pixel. There
/// is no depth buffer in this protocol.
pub trait PickCanvas {
    /// Target size in pixels, `(width, height)`.
    fn viewport(&self) -> (u32, u32);

    /// Fill the whole target with one color.
    fn clear(&mut self, color: PickColor);

    /// Draw the unit quad (corners `(±1, ±1, 0)`) transformed by `mvp`,
    /// filled with `color`.
    ///
    /// Quads with any corner at `w <= 0` are dropped whole rather than
    /// clipped against the near plane.
    fn draw_quad(&mut self, mvp: &Matrix4<f32>, color: PickColor);

    /// Color at pixel `(x, y)`, origin top-left. `None` outside the target.
    fn read_pixel(&self, x: u32, y: u32) -> Option<PickColor>;
}

/// CPU rasterizer implementing the identity-pass protocol.
pub struct SoftwareCanvas {
    width: u32,
    height: u32,
    pixels: Vec<PickColor>,
}

impl SoftwareCanvas {
    /// Create a canvas of the given pixel size.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "canvas must not be empty");
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0]; (width as usize) * (height as usize)],
        }
    }

    fn fill_triangle(&mut self, a: [f32; 2], b: [f32; 2], c: [f32; 2], color: PickColor) {
        let area = edge(a, b, c);
        if area.abs() < f32::EPSILON {
            return;
        }

        let min_x = a[0].min(b[0]).min(c[0]).floor().max(0.0) as u32;
        let max_x = (a[0].max(b[0]).max(c[0]).ceil()).min(self.width as f32) as u32;
        let min_y = a[1].min(b[1]).min(c[1]).floor().max(0.0) as u32;
        let max_y = (a[1].max(b[1]).max(c[1]).ceil()).min(self.height as f32) as u32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                // Sample at the pixel centre.
                let p = [x as f32 + 0.5, y as f32 + 0.5];
                let w0 = edge(b, c, p);
                let w1 = edge(c, a, p);
                let w2 = edge(a, b, p);
                // Accept both windings; the sign of the area picks the side.
                let inside = if area > 0.0 {
                    w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                } else {
                    w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                };
                if inside {
                    self.pixels[(y * self.width + x) as usize] = color;
                }
            }
        }
    }
}

impl PickCanvas for SoftwareCanvas {
    fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: PickColor) {
        self.pixels.fill(color);
    }

    fn draw_quad(&mut self, mvp: &Matrix4<f32>, color: PickColor) {
        const CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

        let mut screen = [[0.0f32; 2]; 4];
        for (corner, out) in CORNERS.iter().zip(screen.iter_mut()) {
            let clip = mvp * Vector4::new(corner[0], corner[1], 0.0, 1.0);
            if clip.w <= f32::EPSILON {
                return;
            }
            let ndc_x = clip.x / clip.w;
            let ndc_y = clip.y / clip.w;
            // Viewport transform with the y flip to a top-left origin.
            *out = [
                (ndc_x + 1.0) * 0.5 * self.width as f32,
                (1.0 - ndc_y) * 0.5 * self.height as f32,
            ];
        }

        self.fill_triangle(screen[0], screen[1], screen[2], color);
        self.fill_triangle(screen[0], screen[2], screen[3], color);
    }

    fn read_pixel(&self, x: u32, y: u32) -> Option<PickColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }
}

/// Twice the signed area of triangle `(a, b, p)`.
fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}
