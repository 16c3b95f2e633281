/// Pixel buffers and the narrow surface capability operations are bound to.
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A rectangular area of a surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Creates a region from an origin and a size.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region covering a whole surface of the given size.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Returns true if the region lies inside a `width` x `height` surface.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let right = self.x.checked_add(self.width);
        let bottom = self.y.checked_add(self.height);
        matches!((right, bottom), (Some(r), Some(b)) if r <= width && b <= height)
    }
}

/// Raw RGBA pixels with their dimensions.
///
/// The history engine never looks inside the bytes; it only needs the byte
/// length for footprint accounting and the dimensions for sanity checks.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    /// Wraps raw RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not hold exactly `width * height` pixels.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::expected_len(width, height);
        if data.len() != expected {
            anyhow::bail!(
                "pixel data is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            );
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a buffer where every pixel has the same RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let data = rgba.iter().copied().cycle().take(pixels * BYTES_PER_PIXEL).collect();
        Self {
            width,
            height,
            data,
        }
    }

    fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the pixel data in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterates over pixels as RGBA slices, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(BYTES_PER_PIXEL)
    }

    /// Mutable variant of [`PixelBuffer::pixels`].
    pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.data.chunks_exact_mut(BYTES_PER_PIXEL)
    }

    /// Returns the pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.data[start..start + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    fn row_len(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }
}

/// The live pixel store an operation reads from and writes to.
///
/// Implemented by the editor canvas. Operations only ever see this trait,
/// never the session that owns the surface.
pub trait PixelSurface {
    /// Returns `(width, height)` of the surface.
    fn dimensions(&self) -> (u32, u32);

    /// Copies the pixels of `region` out of the surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the region lies outside the surface.
    fn read_region(&self, region: Region) -> Result<PixelBuffer>;

    /// Writes `buffer` into the surface with its top-left corner at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer does not fit at that position.
    fn write_region(&mut self, buffer: &PixelBuffer, x: u32, y: u32) -> Result<()>;
}

/// Owning handle to a surface, held by the editor session.
pub type SharedSurface = Rc<RefCell<dyn PixelSurface>>;

/// Non-owning handle held by operations. Fails to upgrade once the
/// session has dropped its surface.
pub type WeakSurface = Weak<RefCell<dyn PixelSurface>>;

/// A plain in-memory RGBA surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySurface {
    buffer: PixelBuffer,
}

impl MemorySurface {
    pub fn new(buffer: PixelBuffer) -> Self {
        Self { buffer }
    }

    /// Creates a surface filled with a single RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::new(PixelBuffer::filled(width, height, rgba))
    }

    /// Wraps the surface in the shared handle operations bind to.
    pub fn into_shared(self) -> Rc<RefCell<MemorySurface>> {
        Rc::new(RefCell::new(self))
    }

    /// The full pixel contents.
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }
}

impl PixelSurface for MemorySurface {
    fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    fn read_region(&self, region: Region) -> Result<PixelBuffer> {
        if !region.fits_within(self.buffer.width, self.buffer.height) {
            anyhow::bail!(
                "region {}x{} at ({}, {}) is outside the {}x{} surface",
                region.width,
                region.height,
                region.x,
                region.y,
                self.buffer.width,
                self.buffer.height
            );
        }

        let src_row = self.buffer.row_len();
        let dst_row = region.width as usize * BYTES_PER_PIXEL;
        let x_off = region.x as usize * BYTES_PER_PIXEL;
        let mut data = Vec::with_capacity(dst_row * region.height as usize);
        for row in region.y..region.y + region.height {
            let start = row as usize * src_row + x_off;
            data.extend_from_slice(&self.buffer.data[start..start + dst_row]);
        }
        PixelBuffer::new(region.width, region.height, data)
    }

    fn write_region(&mut self, buffer: &PixelBuffer, x: u32, y: u32) -> Result<()> {
        let region = Region::new(x, y, buffer.width, buffer.height);
        if !region.fits_within(self.buffer.width, self.buffer.height) {
            anyhow::bail!(
                "{}x{} buffer does not fit at ({}, {}) on the {}x{} surface",
                buffer.width,
                buffer.height,
                x,
                y,
                self.buffer.width,
                self.buffer.height
            );
        }

        let dst_row = self.buffer.row_len();
        let src_row = buffer.row_len();
        let x_off = x as usize * BYTES_PER_PIXEL;
        for (i, chunk) in buffer.data.chunks_exact(src_row.max(1)).enumerate() {
            let start = (y as usize + i) * dst_row + x_off;
            self.buffer.data[start..start + src_row].copy_from_slice(chunk);
        }
        Ok(())
    }
}
