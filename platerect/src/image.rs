use crate::error::RectifyError;

/// RGBA raster with 8 bits per channel and row-major pixel data.
///
/// `stride` is the distance between rows in bytes and may exceed `4 * width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRgba8 {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub buf: Vec<u8>,
}

impl ImageRgba8 {
    /// Number of interleaved channels per pixel (R, G, B, A).
    pub const CHANNELS: u32 = 4;

    /// Create a new image with every byte set to zero (transparent black).
    ///
    /// Panics if `4 * width` overflows `u32`; use [`Self::byte_len`] to check
    /// sizes that come from callers.
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width * Self::CHANNELS;
        let buf = vec![0u8; stride as usize * height as usize];
        Self { width, height, stride, buf }
    }

    /// Create an image filled with a single colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut img = Self::new(width, height);
        for px in img.buf.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        img
    }

    /// Wrap existing pixel data.
    ///
    /// `stride` must be >= `4 * width`, and `buf` must hold at least
    /// `stride * (height - 1) + 4 * width` bytes.
    pub fn from_buf(width: u32, height: u32, stride: u32, buf: Vec<u8>) -> Result<Self, RectifyError> {
        let row_len = width
            .checked_mul(Self::CHANNELS)
            .ok_or(RectifyError::TooLarge { width, height })?;
        if stride < row_len {
            return Err(RectifyError::InvalidStride { width, stride });
        }
        let expected =
            Self::required_len(row_len, height, stride).ok_or(RectifyError::TooLarge { width, height })?;
        if buf.len() < expected {
            return Err(RectifyError::BufferTooSmall {
                width,
                height,
                len: buf.len(),
                expected,
            });
        }
        Ok(Self { width, height, stride, buf })
    }

    /// Wrap tightly packed pixel data (`stride == 4 * width`).
    pub fn from_rgba(width: u32, height: u32, buf: Vec<u8>) -> Result<Self, RectifyError> {
        let stride = width
            .checked_mul(Self::CHANNELS)
            .ok_or(RectifyError::TooLarge { width, height })?;
        Self::from_buf(width, height, stride, buf)
    }

    /// Bytes in a tightly packed `width` × `height` image, or `None` when the
    /// row length overflows `u32` or the total overflows `usize`.
    pub fn byte_len(width: u32, height: u32) -> Option<usize> {
        let row_len = width.checked_mul(Self::CHANNELS)?;
        (row_len as usize).checked_mul(height as usize)
    }

    fn required_len(row_len: u32, height: u32, stride: u32) -> Option<usize> {
        if height == 0 {
            return Some(0);
        }
        (stride as usize)
            .checked_mul(height as usize - 1)?
            .checked_add(row_len as usize)
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride as usize + (x * Self::CHANNELS) as usize
    }

    /// Get the RGBA value at (x, y).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [self.buf[i], self.buf[i + 1], self.buf[i + 2], self.buf[i + 3]]
    }

    /// Set the RGBA value at (x, y).
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.buf[i..i + 4].copy_from_slice(&rgba);
    }

    /// One row of pixels, without stride padding.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = self.offset(0, y);
        &self.buf[start..start + (self.width * Self::CHANNELS) as usize]
    }

    /// Rec. 601 luma of every pixel, row-major with no padding.
    pub fn luma(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in 0..self.height {
            out.extend(self.row(y).chunks_exact(4).map(luma_of));
        }
        out
    }

    /// Copy the pixel data into a tightly packed buffer (`stride == 4 * width`).
    pub fn into_packed(self) -> Vec<u8> {
        let row_len = (self.width * Self::CHANNELS) as usize;
        if self.stride as usize == row_len {
            let mut buf = self.buf;
            buf.truncate(row_len * self.height as usize);
            return buf;
        }
        let mut out = Vec::with_capacity(row_len * self.height as usize);
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        out
    }

    /// Shrink by integer factor `f`, averaging each f×f block per channel.
    pub fn downscale(&self, f: u32) -> ImageRgba8 {
        if f <= 1 {
            return self.clone();
        }

        let out_w = self.width / f;
        let out_h = self.height / f;
        let mut out = ImageRgba8::new(out_w, out_h);
        let area = f * f;

        for oy in 0..out_h {
            for ox in 0..out_w {
                let mut sum = [0u32; 4];
                for dy in 0..f {
                    for dx in 0..f {
                        let px = self.get(ox * f + dx, oy * f + dy);
                        for c in 0..4 {
                            sum[c] += px[c] as u32;
                        }
                    }
                }
                out.set(
                    ox,
                    oy,
                    [
                        (sum[0] / area) as u8,
                        (sum[1] / area) as u8,
                        (sum[2] / area) as u8,
                        (sum[3] / area) as u8,
                    ],
                );
            }
        }
        out
    }
}

#[inline]
fn luma_of(px: &[u8]) -> f32 {
    0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32
}
