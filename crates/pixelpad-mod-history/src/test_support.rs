// Shared fixtures for unit tests in this crate.
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::effect::{Adjustment, EffectStep};
use crate::operation::{LeafOperation, Operation};
use crate::surface::{MemorySurface, PixelBuffer, Region, SharedSurface};

pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Adds the brightness delta to RGB, clamped. Other adjustments pass through.
pub fn shift(input: &PixelBuffer, adjustment: &Adjustment) -> Result<PixelBuffer> {
    let delta = match adjustment {
        Adjustment::Brightness { delta } => *delta,
        _ => 0,
    };
    let mut out = input.clone();
    for px in out.pixels_mut() {
        for c in &mut px[..3] {
            *c = (i16::from(*c) + delta).clamp(0, 255) as u8;
        }
    }
    Ok(out)
}

pub fn failing(_: &PixelBuffer, _: &Adjustment) -> Result<PixelBuffer> {
    anyhow::bail!("effect exploded")
}

pub fn shrinking(_: &PixelBuffer, _: &Adjustment) -> Result<PixelBuffer> {
    Ok(PixelBuffer::filled(1, 1, [0, 0, 0, 0]))
}

pub fn surface(width: u32, height: u32) -> (Rc<RefCell<MemorySurface>>, SharedSurface) {
    let canvas = MemorySurface::filled(width, height, WHITE).into_shared();
    let shared: SharedSurface = canvas.clone();
    (canvas, shared)
}

pub fn brightness(surface: &SharedSurface, delta: i16) -> Operation {
    let (w, h) = surface.borrow().dimensions();
    LeafOperation::new(
        "Brightness",
        surface,
        Region::full(w, h),
        EffectStep::new(Adjustment::Brightness { delta }, shift),
    )
    .into()
}

pub fn contrast(surface: &SharedSurface) -> Operation {
    let (w, h) = surface.borrow().dimensions();
    LeafOperation::new(
        "Contrast",
        surface,
        Region::full(w, h),
        EffectStep::new(Adjustment::Contrast { amount: 10.0 }, shift),
    )
    .into()
}

pub fn pixels(canvas: &Rc<RefCell<MemorySurface>>) -> PixelBuffer {
    canvas.borrow().buffer().clone()
}
