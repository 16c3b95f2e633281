//! Edit scripts given on the command line.
//!
//! Each `--step` is one of `brightness=N`, `contrast=N`, `saturation=N`,
//! `hue=DEG`, `rgb=R,G,B`, `auto-enhance`, `undo`, `redo`, `seal`,
//! `group=LABEL` or `end-group`.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use pixelpad_core::history::Adjustment;
use pixelpad_core::EditorSession;

/// One scripted action against a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Adjust(Adjustment),
    AutoEnhance,
    Undo,
    Redo,
    /// Stop the next adjustment from merging into the previous one.
    Seal,
    Group(String),
    EndGroup,
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (s, None),
        };
        let step = match (name.to_ascii_lowercase().as_str(), value) {
            ("brightness", Some(v)) => Step::Adjust(Adjustment::Brightness {
                delta: parse_number(name, v)?,
            }),
            ("contrast", Some(v)) => Step::Adjust(Adjustment::Contrast {
                amount: parse_number(name, v)?,
            }),
            ("saturation", Some(v)) => Step::Adjust(Adjustment::Saturation {
                amount: parse_number(name, v)?,
            }),
            ("hue", Some(v)) => Step::Adjust(Adjustment::Hue {
                degrees: parse_number(name, v)?,
            }),
            ("rgb", Some(v)) => {
                let parts = v
                    .split(',')
                    .map(|p| parse_number::<i16>(name, p.trim()))
                    .collect::<Result<Vec<_>>>()?;
                let &[red, green, blue] = parts.as_slice() else {
                    bail!("rgb expects three comma-separated offsets, got {v:?}");
                };
                Step::Adjust(Adjustment::RgbShift { red, green, blue })
            }
            ("group", Some(label)) if !label.is_empty() => Step::Group(label.to_string()),
            ("auto-enhance", None) => Step::AutoEnhance,
            ("undo", None) => Step::Undo,
            ("redo", None) => Step::Redo,
            ("seal", None) => Step::Seal,
            ("end-group", None) => Step::EndGroup,
            _ => bail!("unknown step {s:?}"),
        };
        Ok(step)
    }
}

fn parse_number<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("invalid value {value:?} for {name}"))
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Adjust(Adjustment::Brightness { delta }) => write!(f, "brightness={delta}"),
            Step::Adjust(Adjustment::Contrast { amount }) => write!(f, "contrast={amount}"),
            Step::Adjust(Adjustment::Saturation { amount }) => write!(f, "saturation={amount}"),
            Step::Adjust(Adjustment::Hue { degrees }) => write!(f, "hue={degrees}"),
            Step::Adjust(Adjustment::RgbShift { red, green, blue }) => {
                write!(f, "rgb={red},{green},{blue}")
            }
            Step::Adjust(Adjustment::AutoEnhance { .. }) | Step::AutoEnhance => {
                f.write_str("auto-enhance")
            }
            Step::Undo => f.write_str("undo"),
            Step::Redo => f.write_str("redo"),
            Step::Seal => f.write_str("seal"),
            Step::Group(label) => write!(f, "group={label}"),
            Step::EndGroup => f.write_str("end-group"),
        }
    }
}

/// Runs `steps` in order against `session`.
///
/// A group left open at the end is closed.
///
/// # Errors
///
/// Stops at the first step that fails.
pub fn run(session: &mut EditorSession, steps: &[Step]) -> Result<()> {
    for (i, step) in steps.iter().enumerate() {
        tracing::info!("Step {}: {step}", i + 1);
        run_step(session, step).with_context(|| format!("step {} ({step}) failed", i + 1))?;
    }
    if session.is_grouping() {
        tracing::debug!("Closing group left open by the script");
        session.end_grouping();
    }
    Ok(())
}

fn run_step(session: &mut EditorSession, step: &Step) -> Result<()> {
    match step {
        Step::Adjust(adjustment) => session.adjust(*adjustment)?,
        Step::AutoEnhance => match session.auto_enhance()? {
            Some(levels) => tracing::debug!("Stretched levels {levels:?}"),
            None => tracing::info!("Image already spans the full range"),
        },
        Step::Undo => {
            if !session.undo()? {
                tracing::warn!("Nothing to undo");
            }
        }
        Step::Redo => {
            if !session.redo()? {
                tracing::warn!("Nothing to redo");
            }
        }
        Step::Seal => session.seal_tail(),
        Step::Group(label) => {
            if session.is_grouping() {
                tracing::warn!("Group already open, ignoring group={label}");
            }
            session.start_grouping(label.clone());
        }
        Step::EndGroup => session.end_grouping(),
    }
    Ok(())
}
