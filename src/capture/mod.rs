//! Capture → crop → downscale pipeline: public API.
//!
//! This module owns everything that touches pixels. The orchestrator hands
//! it a captured viewport (as the host delivers it, a PNG data URL) and the
//! user's rectangle; it hands back an encoded [`PreviewArtifact`].

mod frame;
mod region;

pub use frame::{decode_data_url, encode_png_data_url, CaptureFrame};
pub use region::{
    crop_to_png_bytes, crop_to_preview, plan_crop, CropError, CropPlan, OutputEnvelope,
    MAX_OUTPUT_HEIGHT, MAX_OUTPUT_WIDTH,
};

use crate::protocol::PreviewKind;

/// Encoded result of one completed selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewArtifact {
    pub kind: PreviewKind,
    /// `data:image/png;base64,...`
    pub encoded_data: String,
    pub width: u32,
    pub height: u32,
}

impl PreviewArtifact {
    pub fn image(encoded_data: String, width: u32, height: u32) -> Self {
        Self {
            kind: PreviewKind::Image,
            encoded_data,
            width,
            height,
        }
    }
}
