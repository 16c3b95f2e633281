/// Levels analysis and stretch for auto-enhance.
use anyhow::Result;

use super::{clamp_channel, map_rgb};
use crate::history::{Adjustment, PixelBuffer};

/// Fraction of visible pixels ignored at each end of every channel.
const CLIP_FRACTION: f64 = 0.005;

/// Per-channel black and white points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    pub low: [u8; 3],
    pub high: [u8; 3],
}

impl Levels {
    /// Levels that leave every channel as it is.
    pub const IDENTITY: Levels = Levels {
        low: [0; 3],
        high: [255; 3],
    };

    /// Returns true if stretching with these levels changes nothing.
    pub fn is_identity(&self) -> bool {
        (0..3).all(|c| self.high[c] <= self.low[c] || (self.low[c] == 0 && self.high[c] == 255))
    }
}

impl From<Levels> for Adjustment {
    fn from(levels: Levels) -> Self {
        Adjustment::AutoEnhance {
            low: levels.low,
            high: levels.high,
        }
    }
}

/// Computes auto-enhance levels for `buffer` without modifying it.
///
/// Fully transparent pixels are ignored. A buffer with no visible pixels
/// yields [`Levels::IDENTITY`].
pub fn analyze_levels(buffer: &PixelBuffer) -> Levels {
    let mut histograms = [[0u64; 256]; 3];
    let mut visible = 0u64;
    for px in buffer.pixels().filter(|px| px[3] != 0) {
        visible += 1;
        for (hist, &value) in histograms.iter_mut().zip(&px[..3]) {
            hist[usize::from(value)] += 1;
        }
    }
    if visible == 0 {
        return Levels::IDENTITY;
    }

    let clip = (visible as f64 * CLIP_FRACTION).floor() as u64;
    let mut levels = Levels::IDENTITY;
    for (c, hist) in histograms.iter().enumerate() {
        levels.low[c] = bound(hist.iter().enumerate(), clip);
        levels.high[c] = bound(hist.iter().enumerate().rev(), clip);
    }
    levels
}

/// First histogram bin, in iteration order, where the running count exceeds `clip`.
fn bound<'a>(bins: impl Iterator<Item = (usize, &'a u64)>, clip: u64) -> u8 {
    let mut seen = 0;
    for (value, &count) in bins {
        seen += count;
        if seen > clip {
            return value as u8;
        }
    }
    0
}

/// Remaps each channel so `low` becomes 0 and `high` becomes 255.
///
/// Channels whose `high` is not above `low` are left unchanged.
pub(super) fn stretch(input: &PixelBuffer, levels: Levels) -> Result<PixelBuffer> {
    let ramps: [Option<(f32, f32)>; 3] = std::array::from_fn(|c| {
        let (low, high) = (levels.low[c], levels.high[c]);
        (high > low).then(|| (f32::from(low), 255.0 / f32::from(high - low)))
    });
    Ok(map_rgb(input, |rgb| {
        std::array::from_fn(|c| match ramps[c] {
            Some((low, scale)) => clamp_channel((f32::from(rgb[c]) - low) * scale),
            None => rgb[c],
        })
    }))
}
