/// Per-channel effects: brightness, contrast, saturation, RGB shift.
use anyhow::Result;

use super::{clamp_channel, ensure_range, map_rgb};
use crate::history::PixelBuffer;

/// Rec. 601 luma weights.
const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

fn add_clamped(channel: u8, delta: i16) -> u8 {
    (i16::from(channel) + delta).clamp(0, 255) as u8
}

/// Adds `delta` to each color channel.
pub(super) fn brightness(input: &PixelBuffer, delta: i16) -> Result<PixelBuffer> {
    if !(-255..=255).contains(&delta) {
        anyhow::bail!("brightness delta {delta} is outside -255..=255");
    }
    Ok(map_rgb(input, |rgb| rgb.map(|c| add_clamped(c, delta))))
}

/// Adds a separate offset to each of R, G and B.
pub(super) fn rgb_shift(input: &PixelBuffer, deltas: [i16; 3]) -> Result<PixelBuffer> {
    if let Some(bad) = deltas.iter().find(|d| !(-255..=255).contains(*d)) {
        anyhow::bail!("channel offset {bad} is outside -255..=255");
    }
    Ok(map_rgb(input, |[r, g, b]| {
        [
            add_clamped(r, deltas[0]),
            add_clamped(g, deltas[1]),
            add_clamped(b, deltas[2]),
        ]
    }))
}

/// Stretches or compresses values around mid-gray.
///
/// `amount` runs from -100 (flat gray) to 100 (near threshold).
pub(super) fn contrast(input: &PixelBuffer, amount: f32) -> Result<PixelBuffer> {
    ensure_range("contrast", amount, -100.0, 100.0)?;
    let c = amount * 2.55;
    let factor = (259.0 * (c + 255.0)) / (255.0 * (259.0 - c));
    Ok(map_rgb(input, |rgb| {
        rgb.map(|v| clamp_channel(factor * (f32::from(v) - 128.0) + 128.0))
    }))
}

/// Scales each channel's distance from the pixel's luma.
///
/// `amount` of -100 gives grayscale, 100 doubles the saturation.
pub(super) fn saturation(input: &PixelBuffer, amount: f32) -> Result<PixelBuffer> {
    ensure_range("saturation", amount, -100.0, 100.0)?;
    let scale = 1.0 + amount / 100.0;
    Ok(map_rgb(input, |rgb| {
        let luma: f32 = rgb.iter().zip(LUMA).map(|(&c, w)| f32::from(c) * w).sum();
        rgb.map(|v| clamp_channel(luma + (f32::from(v) - luma) * scale))
    }))
}
