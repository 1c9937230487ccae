use super::*;

#[test]
fn parses_sentinel_and_hex_forms() {
    assert_eq!(BackgroundColor::parse("transparent"), Some(BackgroundColor::Transparent));
    assert_eq!(BackgroundColor::parse(" Transparent "), Some(BackgroundColor::Transparent));
    assert_eq!(BackgroundColor::parse("#ef4444"), Some(BackgroundColor::Rgb([0xef, 0x44, 0x44])));
    assert_eq!(BackgroundColor::parse("3B82F6"), Some(BackgroundColor::Rgb([0x3b, 0x82, 0xf6])));
    assert_eq!(BackgroundColor::parse("#fff"), Some(BackgroundColor::WHITE));
}

#[test]
fn rejects_malformed_colors() {
    assert_eq!(BackgroundColor::parse("#12345"), None);
    assert_eq!(BackgroundColor::parse("#gggggg"), None);
    assert_eq!(BackgroundColor::parse("red"), None);
    assert_eq!(BackgroundColor::parse(""), None);
}

#[test]
fn css_form_parses_back() {
    for preset in PRESETS {
        assert_eq!(BackgroundColor::parse(&preset.to_css()), Some(*preset));
    }
}

#[test]
fn default_is_transparent_and_has_no_fill() {
    let bg = BackgroundColor::default();
    assert!(bg.is_transparent());
    assert_eq!(bg.fill_pixel(), None);
    assert_eq!(bg.picker_rgb(), [255, 255, 255]);
    assert_eq!(BackgroundColor::Rgb([1, 2, 3]).fill_pixel(), Some(Rgba([1, 2, 3, 255])));
}
