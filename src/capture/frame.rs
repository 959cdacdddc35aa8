//! Data-URL transport for captured frames and encoded previews.
//!
//! The host delivers visible-tab captures as `data:<mime>;base64,<payload>`
//! strings and panels display previews the same way, so both directions
//! go through here.

use super::region::CropError;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::DynamicImage;
use regex::Regex;
use std::sync::LazyLock;

static DATA_URL_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:(?P<mime>[^;,]+)(?:;[^;,]*)*;base64,").unwrap());

/// Raw bitmap of the visible viewport, in device pixels.
///
/// Lives only for the duration of one crop.
pub struct CaptureFrame {
    image: DynamicImage,
}

impl CaptureFrame {
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Decode a host capture (`data:image/png;base64,...`).
    pub fn from_data_url(data_url: &str) -> Result<Self, CropError> {
        let bytes = decode_data_url(data_url)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| CropError::DecodeFailed(e.to_string()))?;
        Ok(Self { image })
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Extract the binary payload of a base64 data URL.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>, CropError> {
    let header = DATA_URL_HEADER
        .find(data_url)
        .ok_or(CropError::MalformedDataUrl)?;

    STANDARD
        .decode(data_url[header.end()..].trim_end())
        .map_err(|e| CropError::DecodeFailed(e.to_string()))
}

/// Wrap PNG bytes as a data URL a panel can display directly.
pub fn encode_png_data_url(png_bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn frame_decodes_host_capture() {
        let url = encode_png_data_url(&png_bytes(64, 48));
        assert!(url.starts_with("data:image/png;base64,"));

        let frame = CaptureFrame::from_data_url(&url).unwrap();
        assert_eq!((frame.width(), frame.height()), (64, 48));
    }

    #[test]
    fn header_parameters_are_tolerated() {
        let bytes = png_bytes(2, 2);
        let url = format!(
            "data:image/png;charset=binary;base64,{}",
            STANDARD.encode(&bytes)
        );
        assert_eq!(decode_data_url(&url).unwrap(), bytes);
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(matches!(
            decode_data_url("https://example.com/a.png"),
            Err(CropError::MalformedDataUrl)
        ));
        assert!(matches!(
            decode_data_url("data:image/png,rawpixels"),
            Err(CropError::MalformedDataUrl)
        ));
    }

    #[test]
    fn rejects_payload_that_is_not_an_image() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(b"not a png"));
        assert!(matches!(
            CaptureFrame::from_data_url(&url),
            Err(CropError::DecodeFailed(_))
        ));
    }
}
