use thiserror::Error;

/// Every surface in the pipeline is 32 bits per pixel
pub const BYTES_PER_PIXEL: usize = 4;

// ============================================================================
// Errors
// ============================================================================

/// Rejected buffer geometry. Raised at construction and resize time so the
/// per-pixel loops never have to check anything.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame buffer must be at least 1x1, got {width}x{height}")]
    ZeroArea { width: u32, height: u32 },

    #[error("frame buffer {width}x{height} does not fit in memory")]
    TooLarge { width: u32, height: u32 },

    #[error("stride of {stride} bytes is smaller than a {width} pixel row")]
    StrideTooSmall { stride: usize, width: u32 },

    #[error("pixel slice holds {actual} bytes but {required} are needed")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("failed to allocate {bytes} bytes for the frame buffer")]
    AllocationFailed { bytes: usize },
}

/// Number of bytes a `width` x `height` surface with `stride` spans.
/// The last row only needs its visible pixels, not the full stride.
fn required_len(width: u32, height: u32, stride: usize) -> Result<usize, FrameError> {
    let row_bytes = (width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .ok_or(FrameError::TooLarge { width, height })?;
    if stride < row_bytes {
        return Err(FrameError::StrideTooSmall { stride, width });
    }
    if width == 0 || height == 0 {
        return Ok(0);
    }
    stride
        .checked_mul(height as usize - 1)
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or(FrameError::TooLarge { width, height })
}

fn packed_len(width: u32, height: u32) -> Result<usize, FrameError> {
    (width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .and_then(|row| row.checked_mul(height as usize))
        .ok_or(FrameError::TooLarge { width, height })
}

fn allocate_zeroed(bytes: usize) -> Result<Vec<u8>, FrameError> {
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(bytes)
        .map_err(|_| FrameError::AllocationFailed { bytes })?;
    pixels.resize(bytes, 0);
    Ok(pixels)
}

// ============================================================================
// Borrowed views
// ============================================================================

/// Read-only window onto 32-bit pixels: slice, dimensions and stride travel
/// together and were checked against each other when the view was built.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pixels: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> FrameView<'a> {
    /// Wrap an existing pixel slice. Zero-sized views are allowed.
    pub fn new(
        pixels: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Self, FrameError> {
        let required = required_len(width, height, stride)?;
        if pixels.len() < required {
            return Err(FrameError::BufferTooSmall {
                required,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            stride,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Visible bytes of row `y` (stride padding excluded)
    #[inline]
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.stride;
        &self.pixels[start..start + self.width as usize * BYTES_PER_PIXEL]
    }

    /// Raw 4 bytes of a pixel, or None if out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.stride + x as usize * BYTES_PER_PIXEL;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[idx..idx + BYTES_PER_PIXEL]);
        Some(out)
    }
}

/// Mutable counterpart of [`FrameView`]. This is what the core renders into
/// and what the presentation blit writes to; the borrow ends with the call.
#[derive(Debug)]
pub struct FrameViewMut<'a> {
    pixels: &'a mut [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> FrameViewMut<'a> {
    /// Wrap an existing pixel slice, e.g. a locked streaming texture.
    /// Zero-sized views are allowed; writing into them is a no-op.
    pub fn new(
        pixels: &'a mut [u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Self, FrameError> {
        let required = required_len(width, height, stride)?;
        if pixels.len() < required {
            return Err(FrameError::BufferTooSmall {
                required,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            stride,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Visible bytes of row `y` (stride padding excluded)
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let end = start + self.width as usize * BYTES_PER_PIXEL;
        &mut self.pixels[start..end]
    }

    /// Iterate visible rows top to bottom
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        let height = if row_bytes == 0 { 0 } else { self.height as usize };
        self.pixels
            .chunks_mut(self.stride.max(1))
            .take(height)
            .map(move |row| &mut row[..row_bytes])
    }
}

// ============================================================================
// FrameBuffer
// ============================================================================

/// Platform-owned offscreen pixel grid, tightly packed (stride = width * 4).
/// The core never sees this type, only the views it lends out.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
}

impl FrameBuffer {
    /// Create a zeroed frame buffer. Anything below 1x1 is rejected here so
    /// the render step can assume a non-empty surface.
    pub fn with_size(width: u32, height: u32) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroArea { width, height });
        }
        let bytes = packed_len(width, height)?;
        Ok(Self {
            pixels: allocate_zeroed(bytes)?,
            width,
            height,
            stride: width as usize * BYTES_PER_PIXEL,
        })
    }

    /// Replace the allocation with a zeroed one of the new size.
    ///
    /// The old pixels are only released once the replacement exists, and
    /// pixels/width/height/stride change as one unit. On error nothing is
    /// modified.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), FrameError> {
        *self = Self::with_size(width, height)?;
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes per row
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            pixels: self.pixels.as_slice(),
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    pub fn view_mut(&mut self) -> FrameViewMut<'_> {
        FrameViewMut {
            pixels: self.pixels.as_mut_slice(),
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }
}
