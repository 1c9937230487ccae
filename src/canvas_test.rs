use super::*;
use egui::pos2;

fn opaque(w: u32, h: u32) -> Surface {
    Surface::from_image(RgbaImage::from_pixel(w, h, Rgba([200, 100, 50, 255])))
}

#[test]
fn fit_clamps_longer_side_and_keeps_ratio() {
    assert_eq!(fit_dimensions(3000, 1500, MAX_DIMENSION), (1200, 600));
    assert_eq!(fit_dimensions(1500, 3000, MAX_DIMENSION), (600, 1200));
    assert_eq!(fit_dimensions(2400, 2400, MAX_DIMENSION), (1200, 1200));
}

#[test]
fn fit_leaves_small_images_alone() {
    assert_eq!(fit_dimensions(800, 600, MAX_DIMENSION), (800, 600));
    assert_eq!(fit_dimensions(1200, 10, MAX_DIMENSION), (1200, 10));
}

#[test]
fn fit_never_collapses_to_zero() {
    assert_eq!(fit_dimensions(100_000, 10, MAX_DIMENSION), (1200, 1));
}

#[test]
fn load_scaled_resizes_large_sources() {
    let mut s = Surface::default();
    s.load_scaled(&RgbaImage::from_pixel(3000, 1500, Rgba([1, 2, 3, 255])));
    assert_eq!(s.size(), [1200, 600]);
    assert_eq!(*s.get_pixel(600, 300), Rgba([1, 2, 3, 255]));
}

#[test]
fn erase_dot_clears_disc_only() {
    let mut s = opaque(21, 21);
    let touched = s.erase_segment(pos2(10.5, 10.5), pos2(10.5, 10.5), 6.0);
    assert!(touched.is_some());
    // Centre and points within radius 3 are cleared.
    assert_eq!(s.get_pixel(10, 10)[3], 0);
    assert_eq!(s.get_pixel(12, 10)[3], 0);
    assert_eq!(s.get_pixel(10, 8)[3], 0);
    // Corners of the bounding square lie outside the round footprint.
    assert_eq!(s.get_pixel(13, 13)[3], 255);
    assert_eq!(s.get_pixel(7, 7)[3], 255);
    // Far away is untouched.
    assert_eq!(*s.get_pixel(0, 0), Rgba([200, 100, 50, 255]));
}

#[test]
fn erase_line_clears_band_between_endpoints() {
    let mut s = opaque(40, 20);
    s.erase_segment(pos2(5.0, 10.0), pos2(35.0, 10.0), 4.0);
    for x in 5..35 {
        assert_eq!(s.get_pixel(x, 9)[3], 0, "x={x} row 9");
        assert_eq!(s.get_pixel(x, 10)[3], 0, "x={x} row 10");
    }
    for x in 0..40 {
        assert_eq!(s.get_pixel(x, 6)[3], 255, "x={x} row 6");
        assert_eq!(s.get_pixel(x, 13)[3], 255, "x={x} row 13");
    }
    // Round caps extend 2px past each endpoint, not further.
    assert_eq!(s.get_pixel(3, 9)[3], 0);
    assert_eq!(s.get_pixel(1, 9)[3], 255);
    assert_eq!(s.get_pixel(36, 9)[3], 0);
    assert_eq!(s.get_pixel(38, 9)[3], 255);
}

#[test]
fn erase_sets_alpha_zero_regardless_of_color() {
    let mut s = Surface::from_image(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 17])));
    s.erase_segment(pos2(2.0, 2.0), pos2(2.0, 2.0), 10.0);
    assert!(s.pixels().pixels().all(|p| *p == Rgba([0, 0, 0, 0])));
}

#[test]
fn erase_outside_surface_is_ignored() {
    let mut s = opaque(10, 10);
    assert!(s.erase_segment(pos2(-50.0, -50.0), pos2(-40.0, -40.0), 4.0).is_none());
    assert_eq!(s.opaque_pixel_count(), 100);
}

#[test]
fn composite_without_backdrop_preserves_alpha() {
    let mut img = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
    img.put_pixel(1, 0, Rgba([40, 50, 60, 0]));
    let s = Surface::from_image(img.clone());
    assert_eq!(s.composite_over(None), img);
}

#[test]
fn composite_fills_transparent_pixels_with_backdrop() {
    let mut img = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
    img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
    let out = Surface::from_image(img).composite_over(Some(Rgba([255, 255, 255, 255])));
    assert_eq!(*out.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    assert_eq!(*out.get_pixel(1, 0), Rgba([255, 255, 255, 255]));
}

#[test]
fn alpha_over_blends_half_transparent_source() {
    let out = alpha_over(Rgba([0, 0, 0, 128]), Rgba([255, 255, 255, 255]));
    assert_eq!(out[3], 255);
    assert!((out[0] as i32 - 127).abs() <= 1);
}
