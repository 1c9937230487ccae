use eframe::egui;
use egui::{Pos2, Rect};
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Longest edge a loaded image may have on the surface.
pub const MAX_DIMENSION: u32 = 1200;

static TRANSPARENT_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Scale `(width, height)` so the longer side is at most `max_edge`,
/// preserving aspect ratio. Images already within bounds are untouched.
pub fn fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width <= max_edge && height <= max_edge {
        return (width.max(1), height.max(1));
    }
    let ratio = (max_edge as f64 / width as f64).min(max_edge as f64 / height as f64);
    let w = (width as f64 * ratio).round().max(1.0) as u32;
    let h = (height as f64 * ratio).round().max(1.0) as u32;
    (w.min(max_edge), h.min(max_edge))
}

// ============================================================================
// SURFACE: the single mutable raster the editor draws on
// ============================================================================

/// RGBA drawing surface. Straight (non-premultiplied) alpha throughout.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl Surface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> [u32; 2] {
        [self.pixels.width(), self.pixels.height()]
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> &Rgba<u8> {
        if x < self.width() && y < self.height() {
            self.pixels.get_pixel(x, y)
        } else {
            &TRANSPARENT_PIXEL
        }
    }

    /// Resize to fit [`MAX_DIMENSION`], clear, and draw `image` at (0, 0).
    pub fn load_scaled(&mut self, image: &RgbaImage) {
        let (w, h) = fit_dimensions(image.width(), image.height(), MAX_DIMENSION);
        self.pixels = if (w, h) == image.dimensions() {
            image.clone()
        } else {
            image::imageops::resize(image, w, h, FilterType::Lanczos3)
        };
    }

    /// Replace the whole raster, adopting the new dimensions.
    pub fn restore(&mut self, pixels: &RgbaImage) {
        if self.pixels.dimensions() != pixels.dimensions() {
            log::debug!(
                "surface resized {:?} -> {:?} on restore",
                self.pixels.dimensions(),
                pixels.dimensions()
            );
        }
        self.pixels = pixels.clone();
    }

    // ------------------------------------------------------------------------
    // Erasing
    // ------------------------------------------------------------------------

    /// Erase a round-capped line of `width` from `from` to `to`
    /// (destination-out at full strength: covered pixels become transparent).
    ///
    /// `from == to` erases a single dot. A pixel is covered when its centre
    /// lies within `width / 2` of the segment. Returns the touched rectangle in
    /// surface pixels, or `None` if the segment misses the surface.
    pub fn erase_segment(&mut self, from: Pos2, to: Pos2, width: f32) -> Option<Rect> {
        let radius = (width * 0.5).max(0.0);
        let (w, h) = self.pixels.dimensions();

        let min_x = (from.x.min(to.x) - radius).floor().max(0.0);
        let min_y = (from.y.min(to.y) - radius).floor().max(0.0);
        let max_x = (from.x.max(to.x) + radius).ceil().min(w as f32);
        let max_y = (from.y.max(to.y) + radius).ceil().min(h as f32);
        if min_x >= max_x || min_y >= max_y {
            return None;
        }
        let (x0, y0, x1, y1) = (min_x as u32, min_y as u32, max_x as u32, max_y as u32);

        let stride = w as usize * 4;
        let radius_sq = radius * radius;
        let buf: &mut [u8] = &mut self.pixels;
        buf[y0 as usize * stride..y1 as usize * stride]
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(row, line)| {
                let cy = (y0 as usize + row) as f32 + 0.5;
                for x in x0..x1 {
                    let cx = x as f32 + 0.5;
                    if dist_sq_to_segment(Pos2::new(cx, cy), from, to) <= radius_sq {
                        let i = x as usize * 4;
                        line[i..i + 4].copy_from_slice(&[0, 0, 0, 0]);
                    }
                }
            });

        Some(Rect::from_min_max(
            Pos2::new(x0 as f32, y0 as f32),
            Pos2::new(x1 as f32, y1 as f32),
        ))
    }

    // ------------------------------------------------------------------------
    // Compositing
    // ------------------------------------------------------------------------

    /// Flatten the surface over an optional opaque backdrop into a new buffer
    /// of the same size. `None` leaves uncovered pixels transparent.
    pub fn composite_over(&self, backdrop: Option<Rgba<u8>>) -> RgbaImage {
        let (w, h) = self.pixels.dimensions();
        let mut out = RgbaImage::from_pixel(w, h, backdrop.unwrap_or(TRANSPARENT_PIXEL));
        let stride = w as usize * 4;
        let src: &[u8] = &self.pixels;
        let dst: &mut [u8] = &mut out;
        dst.par_chunks_mut(stride)
            .zip(src.par_chunks(stride))
            .for_each(|(dst_row, src_row)| {
                for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                    let blended = alpha_over(Rgba([s[0], s[1], s[2], s[3]]), Rgba([d[0], d[1], d[2], d[3]]));
                    d.copy_from_slice(&blended.0);
                }
            });
        out
    }

    /// Count of pixels with non-zero alpha; handy for status text and tests.
    pub fn opaque_pixel_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p[3] > 0).count()
    }
}

/// Squared distance from `p` to the segment `a`–`b`.
fn dist_sq_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    };
    let closest = a + ab * t;
    (p - closest).length_sq()
}

/// Source-over blend of straight-alpha pixels.
pub fn alpha_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3];
    if sa == 255 || dst[3] == 0 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let sa = sa as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| -> u8 {
        let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
