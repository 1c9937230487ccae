use super::*;
use image::Rgba;

fn sample() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
    img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
    img
}

#[test]
fn export_name_uses_prefix_timestamp_and_extension() {
    assert_eq!(export_file_name(ExportFormat::Png, 1_700_000_000_123), "lumina_edit_1700000000123.png");
    assert_eq!(export_file_name(ExportFormat::Jpeg, 5), "lumina_edit_5.jpeg");
}

#[test]
fn format_parse_accepts_aliases() {
    assert_eq!(ExportFormat::parse("JPG"), Some(ExportFormat::Jpeg));
    assert_eq!(ExportFormat::parse("jpeg"), Some(ExportFormat::Jpeg));
    assert_eq!(ExportFormat::parse("png"), Some(ExportFormat::Png));
    assert_eq!(ExportFormat::parse("tiff"), None);
    assert_eq!(ExportFormat::from_path(Path::new("out/shot.JPG")), Some(ExportFormat::Jpeg));
}

#[test]
fn png_data_url_decodes_to_same_pixels() {
    let img = sample();
    let url = encode_png_data_url(&img).unwrap();
    assert!(url.starts_with("data:image/png;base64,"));
    let back = decode_data_url(&url).unwrap();
    assert_eq!(back, img);
}

#[test]
fn parse_rejects_non_data_urls() {
    assert!(matches!(parse_data_url("https://example.com/a.png"), Err(ImageIoError::NotDataUrl)));
    assert!(matches!(parse_data_url("data:image/png,abc"), Err(ImageIoError::NotBase64)));
    assert!(matches!(parse_data_url("data:image/png;base64,@@@"), Err(ImageIoError::Base64(_))));
}

#[test]
fn parse_tolerates_wrapped_payload() {
    let url = to_data_url("text/plain", b"hello world");
    let (head, payload) = url.split_once(',').unwrap();
    let wrapped = format!("{},{}\n{}", head, &payload[..4], &payload[4..]);
    let (mime, bytes) = parse_data_url(&wrapped).unwrap();
    assert_eq!(mime, "text/plain");
    assert_eq!(bytes, b"hello world");
}

#[test]
fn sniff_detects_encoded_formats() {
    let img = sample();
    let png = encode(&img, ExportFormat::Png).unwrap();
    let jpeg = encode(&img, ExportFormat::Jpeg).unwrap();
    assert_eq!(sniff_mime(&png).unwrap(), "image/png");
    assert_eq!(sniff_mime(&jpeg).unwrap(), "image/jpeg");
    assert!(matches!(sniff_mime(b"plain text"), Err(ImageIoError::UnknownFormat)));
}

#[test]
fn gif_is_not_an_accepted_source() {
    let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
    assert!(matches!(sniff_mime(gif), Err(ImageIoError::UnknownFormat)));
    assert!(bytes_to_data_url(gif).is_err());
}

#[test]
fn jpeg_output_is_opaque_rgb() {
    let jpeg = encode(&sample(), ExportFormat::Jpeg).unwrap();
    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!(decoded.color(), image::ColorType::Rgb8);
    assert_eq!((decoded.width(), decoded.height()), (4, 3));
}

#[test]
fn read_file_as_data_url_round_trips_file_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pic.png");
    let png = encode(&sample(), ExportFormat::Png).unwrap();
    std::fs::write(&path, &png).unwrap();
    let url = read_file_as_data_url(&path).unwrap();
    let (mime, bytes) = parse_data_url(&url).unwrap();
    assert_eq!(mime, "image/png");
    assert_eq!(bytes, png);
}
