/// Effect descriptors carried by leaf operations.
///
/// The history engine does not know any pixel math. A leaf stores one or
/// more [`EffectStep`]s, each pairing the adjustment parameters with the
/// pure function that renders them.
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::surface::PixelBuffer;

/// Effect category, used to decide whether two leaves may merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Brightness,
    Contrast,
    Saturation,
    Hue,
    RgbShift,
    AutoEnhance,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturation => "saturation",
            Self::Hue => "hue",
            Self::RgbShift => "rgb shift",
            Self::AutoEnhance => "auto-enhance",
        };
        f.write_str(name)
    }
}

/// Parameters of a single pixel adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Adjustment {
    /// Adds `delta` to every color channel.
    Brightness { delta: i16 },
    /// Contrast curve strength, -100..=100.
    Contrast { amount: f32 },
    /// Saturation change, -100..=100 (-100 is grayscale).
    Saturation { amount: f32 },
    /// Hue rotation in degrees.
    Hue { degrees: f32 },
    /// Per-channel offsets.
    RgbShift { red: i16, green: i16, blue: i16 },
    /// Per-channel levels stretch from `low..=high` to `0..=255`.
    AutoEnhance { low: [u8; 3], high: [u8; 3] },
}

impl Adjustment {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Brightness { .. } => EffectKind::Brightness,
            Self::Contrast { .. } => EffectKind::Contrast,
            Self::Saturation { .. } => EffectKind::Saturation,
            Self::Hue { .. } => EffectKind::Hue,
            Self::RgbShift { .. } => EffectKind::RgbShift,
            Self::AutoEnhance { .. } => EffectKind::AutoEnhance,
        }
    }

    /// Menu-style label, e.g. "Brightness".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Brightness { .. } => "Brightness",
            Self::Contrast { .. } => "Contrast",
            Self::Saturation { .. } => "Saturation",
            Self::Hue { .. } => "Hue",
            Self::RgbShift { .. } => "RGB Shift",
            Self::AutoEnhance { .. } => "Auto Enhance",
        }
    }
}

/// A pure effect: reads the input buffer and returns a new one of the same size.
pub type EffectFn = fn(&PixelBuffer, &Adjustment) -> Result<PixelBuffer>;

/// One adjustment plus the function that renders it.
#[derive(Clone, Copy)]
pub struct EffectStep {
    pub adjustment: Adjustment,
    pub run: EffectFn,
}

impl fmt::Debug for EffectStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EffectStep").field(&self.adjustment).finish()
    }
}

impl EffectStep {
    pub fn new(adjustment: Adjustment, run: EffectFn) -> Self {
        Self { adjustment, run }
    }

    pub fn kind(&self) -> EffectKind {
        self.adjustment.kind()
    }

    /// Runs the effect on `input`.
    ///
    /// # Errors
    ///
    /// Propagates whatever the effect function reports.
    pub fn render(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        (self.run)(input, &self.adjustment)
    }
}
