//! Image I/O: data URLs, decoding, and export encoding.
//!
//! Everything that crosses the boundary between the editor and the outside
//! world (file picker, AI service, export) travels as a `data:` URL or as raw
//! encoded bytes. The editor itself only ever sees decoded `RgbaImage`s.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, ImageFormat, RgbaImage};

/// JPEG quality used for every export (the `0.9` of a browser canvas).
pub const JPEG_QUALITY: u8 = 90;

/// Prefix of exported file names.
pub const EXPORT_PREFIX: &str = "lumina_edit_";

#[derive(Debug, thiserror::Error)]
pub enum ImageIoError {
    #[error("not a data URL")]
    NotDataUrl,
    #[error("data URL is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unrecognised image data")]
    UnknownFormat,
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("could not encode image: {0}")]
    Encode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// EXPORT FORMAT
// ============================================================================

/// Formats the editor can export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpeg => "JPEG",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    /// JPEG has no alpha channel; transparent pixels need a backdrop.
    pub fn supports_transparency(&self) -> bool {
        matches!(self, ExportFormat::Png)
    }

    /// Parse a user-supplied name (`png`, `jpg`, `jpeg`, any case).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "jpg" | "jpeg" => Some(ExportFormat::Jpeg),
            _ => None,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::parse)
    }
}

/// `lumina_edit_<unix-ms>.<ext>`
pub fn export_file_name(format: ExportFormat, timestamp_ms: u128) -> String {
    format!("{}{}.{}", EXPORT_PREFIX, timestamp_ms, format.extension())
}

/// Milliseconds since the Unix epoch, `0` if the clock is before it.
pub fn unix_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

// ============================================================================
// DATA URLS
// ============================================================================

pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Build `data:<mime>;base64,<payload>`.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, encode_base64(bytes))
}

/// Split a data URL into its mime type and decoded bytes.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), ImageIoError> {
    let rest = url.trim().strip_prefix("data:").ok_or(ImageIoError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageIoError::NotDataUrl)?;
    let mut parts = header.split(';');
    let mime = parts.next().unwrap_or("").to_string();
    if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(ImageIoError::NotBase64);
    }
    // Some producers wrap long payloads; whitespace is never part of base64.
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact.as_bytes())?;
    Ok((mime, bytes))
}

/// Mime type for raw encoded image bytes, sniffed from their content.
pub fn sniff_mime(bytes: &[u8]) -> Result<&'static str, ImageIoError> {
    let format = image::guess_format(bytes).map_err(|_| ImageIoError::UnknownFormat)?;
    Ok(match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        _ => return Err(ImageIoError::UnknownFormat),
    })
}

/// Wrap encoded image bytes (e.g. a picked file) into a data URL.
pub fn bytes_to_data_url(bytes: &[u8]) -> Result<String, ImageIoError> {
    let mime = sniff_mime(bytes)?;
    Ok(to_data_url(mime, bytes))
}

/// Read an image file from disk as a data URL.
pub fn read_file_as_data_url(path: &Path) -> Result<String, ImageIoError> {
    let bytes = std::fs::read(path)?;
    bytes_to_data_url(&bytes)
}

// ============================================================================
// DECODE / ENCODE
// ============================================================================

pub fn decode_image_bytes(bytes: &[u8]) -> Result<RgbaImage, ImageIoError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| ImageIoError::Decode(e.to_string()))
}

pub fn decode_data_url(url: &str) -> Result<RgbaImage, ImageIoError> {
    let (_, bytes) = parse_data_url(url)?;
    decode_image_bytes(&bytes)
}

/// Encode an RGBA image. JPEG drops the alpha channel; callers flatten first.
pub fn encode(image: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>, ImageIoError> {
    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut out)
                .write_image(image.as_raw(), image.width(), image.height(), image::ColorType::Rgba8)
                .map_err(|e| ImageIoError::Encode(e.to_string()))?;
        }
        ExportFormat::Jpeg => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
            encoder
                .encode(
                    rgb_image.as_raw(),
                    rgb_image.width(),
                    rgb_image.height(),
                    image::ColorType::Rgb8,
                )
                .map_err(|e| ImageIoError::Encode(e.to_string()))?;
        }
    }
    Ok(out)
}

/// PNG data URL of an image, the form the AI service consumes.
pub fn encode_png_data_url(image: &RgbaImage) -> Result<String, ImageIoError> {
    let bytes = encode(image, ExportFormat::Png)?;
    Ok(to_data_url(ExportFormat::Png.mime(), &bytes))
}

#[cfg(test)]
#[path = "io_test.rs"]
mod tests;
