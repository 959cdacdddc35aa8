//! Runtime configuration.
//!
//! Defaults match the shipped extension. Each value can be overridden from
//! the environment (or a `.env` file next to the binary) for experiments
//! with other preview sizes.

use crate::capture::OutputEnvelope;

pub const ENV_MAX_OUTPUT_WIDTH: &str = "SNIP_MAX_OUTPUT_WIDTH";
pub const ENV_MAX_OUTPUT_HEIGHT: &str = "SNIP_MAX_OUTPUT_HEIGHT";
pub const ENV_MIN_SELECTION_PX: &str = "SNIP_MIN_SELECTION_PX";

/// Smallest drag, in CSS pixels per side, that counts as a selection.
pub const MIN_SELECTION_PX: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnipConfig {
    pub envelope: OutputEnvelope,
    pub min_selection_px: f64,
}

impl Default for SnipConfig {
    fn default() -> Self {
        Self {
            envelope: OutputEnvelope::default(),
            min_selection_px: MIN_SELECTION_PX,
        }
    }
}

impl SnipConfig {
    /// Load `.env` if present, then read overrides from the process env.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("[CONFIG] Loaded {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Missing, unparsable and
    /// non-positive values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let max_width = positive(&lookup, ENV_MAX_OUTPUT_WIDTH, |raw| raw.parse::<u32>().ok())
            .unwrap_or(defaults.envelope.max_width);
        let max_height = positive(&lookup, ENV_MAX_OUTPUT_HEIGHT, |raw| raw.parse::<u32>().ok())
            .unwrap_or(defaults.envelope.max_height);
        let min_selection_px = positive(&lookup, ENV_MIN_SELECTION_PX, |raw| {
            raw.parse::<f64>().ok().filter(|v| v.is_finite())
        })
        .unwrap_or(defaults.min_selection_px);

        Self {
            envelope: OutputEnvelope {
                max_width,
                max_height,
            },
            min_selection_px,
        }
    }
}

fn positive<T, L, P>(lookup: &L, key: &str, parse: P) -> Option<T>
where
    T: PartialOrd + Default + Copy,
    L: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let raw = lookup(key)?;
    match parse(raw.trim()) {
        Some(value) if value > T::default() => Some(value),
        _ => {
            log::warn!("[CONFIG] Ignoring {}={:?}, using default", key, raw);
            None
        }
    }
}
