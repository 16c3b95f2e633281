//! Pure pixel effects.
//!
//! Every effect takes a buffer and an [`Adjustment`] and returns a new
//! buffer of the same size. Alpha is never touched. [`render`] is the
//! single entry point the history engine calls through [`EffectStep`].

mod color;
mod hue;
mod levels;

use anyhow::Result;

use crate::history::{Adjustment, EffectStep, PixelBuffer};

pub use levels::{analyze_levels, Levels};

/// Renders `adjustment` over `input`.
///
/// # Errors
///
/// Returns an error if the adjustment parameters are out of range.
pub fn render(input: &PixelBuffer, adjustment: &Adjustment) -> Result<PixelBuffer> {
    match *adjustment {
        Adjustment::Brightness { delta } => color::brightness(input, delta),
        Adjustment::Contrast { amount } => color::contrast(input, amount),
        Adjustment::Saturation { amount } => color::saturation(input, amount),
        Adjustment::Hue { degrees } => hue::rotate(input, degrees),
        Adjustment::RgbShift { red, green, blue } => color::rgb_shift(input, [red, green, blue]),
        Adjustment::AutoEnhance { low, high } => levels::stretch(input, Levels { low, high }),
    }
}

/// Wraps `adjustment` in an effect step rendered by [`render`].
pub fn step(adjustment: Adjustment) -> EffectStep {
    EffectStep::new(adjustment, render)
}

/// Applies `f` to the RGB channels of every pixel.
fn map_rgb(input: &PixelBuffer, mut f: impl FnMut([u8; 3]) -> [u8; 3]) -> PixelBuffer {
    let mut out = input.clone();
    for px in out.pixels_mut() {
        let [r, g, b] = f([px[0], px[1], px[2]]);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
    out
}

/// Rounds and clamps a channel value into `0..=255`.
fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn ensure_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        anyhow::bail!("{name} {value} is outside {min}..={max}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_dispatches_by_kind() {
        let input = PixelBuffer::filled(2, 2, [100, 100, 100, 255]);
        let out = render(&input, &Adjustment::Brightness { delta: 10 }).unwrap();
        assert!(out.pixels().all(|p| p == [110, 110, 110, 255]));

        let out = render(
            &input,
            &Adjustment::RgbShift {
                red: 5,
                green: 0,
                blue: -5,
            },
        )
        .unwrap();
        assert!(out.pixels().all(|p| p == [105, 100, 95, 255]));
    }

    #[test]
    fn test_render_rejects_bad_parameters() {
        let input = PixelBuffer::filled(1, 1, [0, 0, 0, 255]);
        assert!(render(&input, &Adjustment::Contrast { amount: 150.0 }).is_err());
        assert!(render(&input, &Adjustment::Saturation { amount: f32::NAN }).is_err());
        assert!(render(&input, &Adjustment::Hue { degrees: f32::INFINITY }).is_err());
    }

    #[test]
    fn test_step_renders_through_render() {
        let s = step(Adjustment::Brightness { delta: -1 });
        let out = s
            .render(&PixelBuffer::filled(1, 1, [1, 1, 1, 9]))
            .unwrap();
        assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 9]));
    }

    #[test]
    fn test_clamp_channel() {
        assert_eq!(clamp_channel(-3.0), 0);
        assert_eq!(clamp_channel(254.6), 255);
        assert_eq!(clamp_channel(300.0), 255);
    }
}
