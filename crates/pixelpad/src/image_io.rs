/// Loading and saving canvases as PNG or JPEG files.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use pixelpad_core::history::PixelBuffer;

/// Decodes an image file into an RGBA8 buffer.
pub fn load(path: &Path) -> Result<PixelBuffer> {
    let rgba = image::open(path)
        .with_context(|| format!("open image '{}'", path.display()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::new(width, height, rgba.into_raw())
}

/// Encodes `buffer` to `path`; the extension picks the format.
///
/// JPEG has no alpha channel, so it is dropped.
pub fn save(path: &Path, buffer: &PixelBuffer) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unknown image format for '{}'", path.display()))?;
    let (width, height) = buffer.dimensions();
    let rgba = RgbaImage::from_raw(width, height, buffer.as_bytes().to_vec())
        .context("canvas size does not match its pixel data")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let written = match format {
        ImageFormat::Png => rgba.save_with_format(path, ImageFormat::Png),
        ImageFormat::Jpeg => {
            DynamicImage::ImageRgba8(rgba)
                .to_rgb8()
                .save_with_format(path, ImageFormat::Jpeg)
        }
        other => bail!("unsupported output format {other:?}"),
    };
    written.with_context(|| format!("write image '{}'", path.display()))
}

/// `photo.png` becomes `photo-edited.<extension>` in the same directory.
pub fn default_output_path(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}-edited.{extension}"))
}
