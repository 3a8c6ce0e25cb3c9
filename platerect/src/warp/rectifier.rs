#[cfg(feature = "parallel")]
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
#[cfg(feature = "parallel")]
use rayon::slice::ParallelSliceMut;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::homography::Homography;
use crate::image::ImageRgba8;

/// Slack for coordinates that land on the border through rounding error.
const EDGE_EPS: f64 = 1e-6;

/// How many output pixels were sampled from the source versus filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coverage {
    pub sampled: u64,
    pub filled: u64,
}

impl Coverage {
    pub fn total(&self) -> u64 {
        self.sampled + self.filled
    }

    /// Fraction of output pixels that landed inside the source image.
    pub fn fraction(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.sampled as f64 / self.total() as f64
    }
}

/// Output of a perspective warp.
#[derive(Debug, Clone)]
pub struct Warped {
    pub image: ImageRgba8,
    pub coverage: Coverage,
}

/// Bilinear RGBA sample at sub-pixel source coordinates.
///
/// Integer coordinates address pixel `(x, y)` exactly. Returns `None` when
/// `(sx, sy)` is outside `[0, width-1] × [0, height-1]` or not finite; the
/// right and bottom neighbours are clamped so the last row and column can
/// still be sampled.
#[inline]
pub fn sample_bilinear(src: &ImageRgba8, sx: f64, sy: f64) -> Option<[u8; 4]> {
    if src.width == 0 || src.height == 0 {
        return None;
    }
    let max_x = (src.width - 1) as f64;
    let max_y = (src.height - 1) as f64;
    if !(sx >= -EDGE_EPS && sx <= max_x + EDGE_EPS && sy >= -EDGE_EPS && sy <= max_y + EDGE_EPS) {
        return None;
    }
    let sx = sx.clamp(0.0, max_x);
    let sy = sy.clamp(0.0, max_y);

    let x0 = sx.floor() as u32;
    let y0 = sy.floor() as u32;
    let x1 = (x0 + 1).min(src.width - 1);
    let y1 = (y0 + 1).min(src.height - 1);
    let dx = sx - x0 as f64;
    let dy = sy - y0 as f64;

    let p00 = src.get(x0, y0);
    let p10 = src.get(x1, y0);
    let p01 = src.get(x0, y1);
    let p11 = src.get(x1, y1);

    let w00 = (1.0 - dx) * (1.0 - dy);
    let w10 = dx * (1.0 - dy);
    let w01 = (1.0 - dx) * dy;
    let w11 = dx * dy;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let v = p00[c] as f64 * w00 + p10[c] as f64 * w10 + p01[c] as f64 * w01 + p11[c] as f64 * w11;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    Some(out)
}

/// Fill one destination row `y` by inverse-mapping each pixel into `src`.
///
/// `row` must hold at least `4 * width` bytes. Returns the number of sampled
/// pixels; the rest receive `fill`.
pub(crate) fn warp_row(
    src: &ImageRgba8,
    hom: &Homography,
    width: u32,
    y: u32,
    row: &mut [u8],
    fill: [u8; 4],
) -> u64 {
    let mut sampled = 0;
    for (x, px) in row.chunks_exact_mut(4).take(width as usize).enumerate() {
        let [sx, sy, w] = hom.apply(x as f64, y as f64);
        let value = if w > f64::EPSILON {
            sample_bilinear(src, sx / w, sy / w)
        } else {
            None
        };
        match value {
            Some(v) => {
                px.copy_from_slice(&v);
                sampled += 1;
            }
            None => px.copy_from_slice(&fill),
        }
    }
    sampled
}

/// Warp `src` into a new `width` × `height` image.
///
/// `hom` maps destination pixel coordinates to source coordinates. Pixels that
/// fall outside the source get `fill`.
pub fn warp(src: &ImageRgba8, hom: &Homography, width: u32, height: u32, fill: [u8; 4]) -> Warped {
    let mut image = ImageRgba8::new(width, height);
    let stride = image.stride as usize;
    if stride == 0 || height == 0 {
        return Warped {
            image,
            coverage: Coverage::default(),
        };
    }

    #[cfg(feature = "parallel")]
    let sampled: u64 = image
        .buf
        .par_chunks_mut(stride)
        .enumerate()
        .map(|(y, row)| warp_row(src, hom, width, y as u32, row, fill))
        .sum();

    #[cfg(not(feature = "parallel"))]
    let sampled: u64 = image
        .buf
        .chunks_mut(stride)
        .enumerate()
        .map(|(y, row)| warp_row(src, hom, width, y as u32, row, fill))
        .sum();

    let total = width as u64 * height as u64;
    Warped {
        image,
        coverage: Coverage {
            sampled,
            filled: total - sampled,
        },
    }
}
