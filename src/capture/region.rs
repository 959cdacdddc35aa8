//! Pure region cropping logic: functional core.
//!
//! This module has zero infrastructure dependencies.
//! It takes a captured viewport and a CSS-pixel rectangle in, and returns
//! an encoded preview that fits the output envelope.

use super::frame::{encode_png_data_url, CaptureFrame};
use super::PreviewArtifact;
use crate::protocol::SelectionRect;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba};
use std::io::Cursor;

pub const MAX_OUTPUT_WIDTH: u32 = 1280;
pub const MAX_OUTPUT_HEIGHT: u32 = 720;

/// Largest preview the pipeline will produce on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputEnvelope {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for OutputEnvelope {
    fn default() -> Self {
        Self {
            max_width: MAX_OUTPUT_WIDTH,
            max_height: MAX_OUTPUT_HEIGHT,
        }
    }
}

/// Source region in device pixels and the destination size it is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlan {
    pub sx: u32,
    pub sy: u32,
    pub sw: u32,
    pub sh: u32,
    pub dw: u32,
    pub dh: u32,
}

impl CropPlan {
    pub fn is_downscaled(&self) -> bool {
        self.dw != self.sw || self.dh != self.sh
    }
}

/// Map a CSS-pixel selection onto the device-pixel capture and fit it
/// into `envelope`.
///
/// `scale = min(1, max_w / sw, max_h / sh)`; the destination is
/// `floor(s · scale)` on each axis, at least 1. The floors are computed in
/// integer arithmetic so the binding axis lands exactly on the envelope.
pub fn plan_crop(rect: &SelectionRect, envelope: OutputEnvelope) -> CropPlan {
    let dpr = rect.effective_dpr();

    let sx = device_px(rect.x * dpr);
    let sy = device_px(rect.y * dpr);
    let sw = device_px(rect.w * dpr).max(1);
    let sh = device_px(rect.h * dpr).max(1);

    let max_w = envelope.max_width.max(1) as u64;
    let max_h = envelope.max_height.max(1) as u64;
    let (w, h) = (sw as u64, sh as u64);

    let (dw, dh) = if w <= max_w && h <= max_h {
        (w, h)
    } else if max_w * h <= max_h * w {
        // width is the binding ratio
        (max_w, h * max_w / w)
    } else {
        (w * max_h / h, max_h)
    };

    CropPlan {
        sx,
        sy,
        sw,
        sh,
        dw: (dw as u32).max(1),
        dh: (dh as u32).max(1),
    }
}

/// floor() into the non-negative device-pixel range.
fn device_px(css_times_dpr: f64) -> u32 {
    if css_times_dpr.is_finite() && css_times_dpr > 0.0 {
        css_times_dpr.floor().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Crops the selection out of `frame`, downscales it into `envelope` and
/// returns PNG bytes together with the plan that produced them.
///
/// This is a pure function with no side effects.
pub fn crop_to_png_bytes(
    frame: &CaptureFrame,
    rect: &SelectionRect,
    envelope: OutputEnvelope,
) -> Result<(Vec<u8>, CropPlan), CropError> {
    let plan = plan_crop(rect, envelope);
    let surface = render_plan(frame.image(), &plan);

    let mut png_bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageRgb8(surface)
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| CropError::EncodingFailed(e.to_string()))?;

    Ok((png_bytes, plan))
}

/// Same as [`crop_to_png_bytes`], wrapped as a displayable artifact.
pub fn crop_to_preview(
    frame: &CaptureFrame,
    rect: &SelectionRect,
    envelope: OutputEnvelope,
) -> Result<PreviewArtifact, CropError> {
    let (png_bytes, plan) = crop_to_png_bytes(frame, rect, envelope)?;

    log::info!(
        "[CROP] {}x{} at {},{} (device) -> {}x{}{}, {} bytes",
        plan.sw,
        plan.sh,
        plan.sx,
        plan.sy,
        plan.dw,
        plan.dh,
        if plan.is_downscaled() { " downscaled" } else { "" },
        png_bytes.len()
    );

    Ok(PreviewArtifact::image(
        encode_png_data_url(&png_bytes),
        plan.dw,
        plan.dh,
    ))
}

/// Draw the plan's source region onto an opaque black surface of the
/// destination size.
///
/// Parts of the source rectangle outside the bitmap stay background, the
/// way a canvas `drawImage` clips.
fn render_plan(source: &DynamicImage, plan: &CropPlan) -> RgbImage {
    let mut surface = RgbImage::from_pixel(plan.dw, plan.dh, Rgb([0, 0, 0]));

    let (img_w, img_h) = (source.width(), source.height());
    if plan.sx >= img_w || plan.sy >= img_h {
        return surface;
    }

    let visible_w = (plan.sx as u64 + plan.sw as u64).min(img_w as u64) as u32 - plan.sx;
    let visible_h = (plan.sy as u64 + plan.sh as u64).min(img_h as u64) as u32 - plan.sy;

    let target_w = scaled_len(visible_w, plan.dw, plan.sw);
    let target_h = scaled_len(visible_h, plan.dh, plan.sh);

    let region = source
        .crop_imm(plan.sx, plan.sy, visible_w, visible_h)
        .to_rgba8();
    let region = if (target_w, target_h) == (visible_w, visible_h) {
        region
    } else {
        imageops::resize(&region, target_w, target_h, FilterType::Triangle)
    };

    for (x, y, pixel) in region.enumerate_pixels() {
        if x < plan.dw && y < plan.dh {
            surface.put_pixel(x, y, over_black(pixel));
        }
    }

    surface
}

/// `len · dst / src`, rounded, clamped to `1..=dst`.
fn scaled_len(len: u32, dst: u32, src: u32) -> u32 {
    let scaled = (len as u64 * dst as u64 + src as u64 / 2) / src.max(1) as u64;
    (scaled as u32).clamp(1, dst)
}

fn over_black(pixel: &Rgba<u8>) -> Rgb<u8> {
    let [r, g, b, a] = pixel.0;
    let blend = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
    Rgb([blend(r), blend(g), blend(b)])
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Capture is not a base64 data URL")]
    MalformedDataUrl,

    #[error("Image decoding failed: {0}")]
    DecodeFailed(String),

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}
