/// Hue rotation in HSL space.
use anyhow::Result;

use super::{clamp_channel, map_rgb};
use crate::history::PixelBuffer;

/// Rotates every pixel's hue by `degrees`. Any finite angle is accepted.
pub(super) fn rotate(input: &PixelBuffer, degrees: f32) -> Result<PixelBuffer> {
    if !degrees.is_finite() {
        anyhow::bail!("hue rotation {degrees} is not a finite angle");
    }
    let shift = degrees.rem_euclid(360.0) / 360.0;
    if shift == 0.0 {
        return Ok(input.clone());
    }
    Ok(map_rgb(input, |rgb| {
        let (h, s, l) = to_hsl(rgb);
        if s == 0.0 {
            return rgb;
        }
        from_hsl((h + shift).fract(), s, l)
    }))
}

/// Returns hue in `0..1`, saturation and lightness.
fn to_hsl([r, g, b]: [u8; 3]) -> (f32, f32, f32) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let d = max - min;
    if d == 0.0 {
        return (0.0, 0.0, l);
    }
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

fn from_hsl(h: f32, s: f32, l: f32) -> [u8; 3] {
    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    [h + 1.0 / 3.0, h, h - 1.0 / 3.0].map(|t| clamp_channel(hue_to_channel(p, q, t) * 255.0))
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotated(rgb: [u8; 3], degrees: f32) -> [u8; 4] {
        let input = PixelBuffer::filled(1, 1, [rgb[0], rgb[1], rgb[2], 200]);
        rotate(&input, degrees).unwrap().pixel(0, 0).unwrap()
    }

    #[test]
    fn test_primary_colors_cycle() {
        assert_eq!(rotated([255, 0, 0], 120.0), [0, 255, 0, 200]);
        assert_eq!(rotated([0, 255, 0], 120.0), [0, 0, 255, 200]);
        assert_eq!(rotated([0, 0, 255], 120.0), [255, 0, 0, 200]);
    }

    #[test]
    fn test_negative_and_full_turns() {
        assert_eq!(rotated([255, 0, 0], -120.0), [0, 0, 255, 200]);
        assert_eq!(rotated([12, 200, 99], 360.0), [12, 200, 99, 200]);
    }

    #[test]
    fn test_gray_is_unchanged() {
        assert_eq!(rotated([77, 77, 77], 45.0), [77, 77, 77, 200]);
    }

    #[test]
    fn test_hsl_round_trip_is_close() {
        for rgb in [[10u8, 200, 30], [250, 128, 1], [90, 60, 180]] {
            let (h, s, l) = to_hsl(rgb);
            let back = from_hsl(h, s, l);
            for (a, b) in rgb.iter().zip(back) {
                assert!(a.abs_diff(b) <= 1, "{rgb:?} came back as {back:?}");
            }
        }
    }

    #[test]
    fn test_rejects_non_finite_angle() {
        assert!(rotate(&PixelBuffer::filled(1, 1, [0; 4]), f32::NAN).is_err());
    }
}
