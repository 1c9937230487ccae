use super::*;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([220, 20, 30, 255]);

/// White 20x20 frame with a red square covering 6..14 on both axes.
fn subject_on_white() -> RgbaImage {
    RgbaImage::from_fn(20, 20, |x, y| {
        if (6..14).contains(&x) && (6..14).contains(&y) {
            RED
        } else {
            WHITE
        }
    })
}

#[test]
fn border_color_is_the_majority() {
    let mut img = subject_on_white();
    img.put_pixel(0, 0, RED);
    assert_eq!(dominant_border_color(&img), Some(WHITE));
}

#[test]
fn transparent_border_has_no_seed() {
    let img = RgbaImage::new(8, 8);
    assert_eq!(dominant_border_color(&img), None);
    assert_eq!(remove_edge_background(&img, DEFAULT_TOLERANCE, DEFAULT_SMOOTHNESS), img);
}

#[test]
fn backdrop_becomes_transparent_and_subject_survives() {
    let out = remove_edge_background(&subject_on_white(), DEFAULT_TOLERANCE, DEFAULT_SMOOTHNESS);
    assert_eq!(out.dimensions(), (20, 20));
    assert_eq!(out.get_pixel(0, 0)[3], 0);
    assert_eq!(out.get_pixel(19, 10)[3], 0);
    assert_eq!(out.get_pixel(3, 3)[3], 0);
    // Fringe rings soften slightly; the interior is untouched.
    for y in 6..14 {
        for x in 6..14 {
            assert!(out.get_pixel(x, y)[3] > 200, "({x},{y})");
        }
    }
    for y in 8..12 {
        for x in 8..12 {
            assert_eq!(*out.get_pixel(x, y), RED, "({x},{y})");
        }
    }
}

#[test]
fn enclosed_backdrop_colour_is_kept() {
    // Red ring with a white hole: the hole is not reachable from the border.
    let img = RgbaImage::from_fn(20, 20, |x, y| {
        let in_ring = (4..16).contains(&x) && (4..16).contains(&y);
        let in_hole = (8..12).contains(&x) && (8..12).contains(&y);
        if in_ring && !in_hole { RED } else { WHITE }
    });
    let out = remove_edge_background(&img, DEFAULT_TOLERANCE, 0);
    assert_eq!(out.get_pixel(1, 1)[3], 0);
    assert_eq!(*out.get_pixel(9, 9), WHITE);
    assert_eq!(*out.get_pixel(5, 5), RED);
}

#[test]
fn near_matches_within_tolerance_are_keyed() {
    let mut img = subject_on_white();
    img.put_pixel(2, 2, Rgba([250, 252, 249, 255]));
    let out = remove_edge_background(&img, DEFAULT_TOLERANCE, 0);
    assert!(out.get_pixel(2, 2)[3] < 8);
}
