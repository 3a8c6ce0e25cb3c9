#[cfg(feature = "parallel")]
use rayon::iter::{IndexedParallelIterator, ParallelIterator};
#[cfg(feature = "parallel")]
use rayon::slice::ParallelSliceMut;

use crate::image::ImageRgba8;

/// Per-pixel Sobel gradient magnitude and direction (radians).
#[derive(Debug, Clone)]
pub struct EdgeMap {
    pub width: u32,
    pub height: u32,
    pub magnitude: Vec<f32>,
    pub direction: Vec<f32>,
}

impl EdgeMap {
    #[inline]
    pub fn magnitude_at(&self, x: u32, y: u32) -> f32 {
        self.magnitude[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn direction_at(&self, x: u32, y: u32) -> f32 {
        self.direction[y as usize * self.width as usize + x as usize]
    }

    /// Strongest gradient magnitude in the map (0 for an empty map).
    pub fn max_magnitude(&self) -> f32 {
        self.magnitude.iter().copied().fold(0.0f32, f32::max)
    }
}

/// Build the gradient map of an RGBA image.
///
/// Luma is `0.299R + 0.587G + 0.114B`. Every interior pixel gets the
/// Sobel response; the outermost ring is left at zero.
pub fn edge_map(img: &ImageRgba8) -> EdgeMap {
    let w = img.width as usize;
    let h = img.height as usize;
    let mut magnitude = vec![0.0f32; w * h];
    let mut direction = vec![0.0f32; w * h];

    if w < 3 || h < 3 {
        return EdgeMap {
            width: img.width,
            height: img.height,
            magnitude,
            direction,
        };
    }

    let luma = img.luma();

    #[cfg(feature = "parallel")]
    {
        magnitude
            .par_chunks_mut(w)
            .zip(direction.par_chunks_mut(w))
            .enumerate()
            .skip(1)
            .take(h - 2)
            .for_each(|(y, (mag_row, dir_row))| sobel_row(&luma, w, y, mag_row, dir_row));
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (y, (mag_row, dir_row)) in magnitude
            .chunks_mut(w)
            .zip(direction.chunks_mut(w))
            .enumerate()
            .skip(1)
            .take(h - 2)
        {
            sobel_row(&luma, w, y, mag_row, dir_row);
        }
    }

    EdgeMap {
        width: img.width,
        height: img.height,
        magnitude,
        direction,
    }
}

/// Convolve one interior row `y` with the 3×3 Sobel kernels.
///
/// Gx: [-1 0 1; -2 0 2; -1 0 1], Gy: [-1 -2 -1; 0 0 0; 1 2 1]
fn sobel_row(luma: &[f32], w: usize, y: usize, mag_row: &mut [f32], dir_row: &mut [f32]) {
    let above = &luma[(y - 1) * w..y * w];
    let row = &luma[y * w..(y + 1) * w];
    let below = &luma[(y + 1) * w..(y + 2) * w];

    for x in 1..w - 1 {
        let gx = (above[x + 1] + 2.0 * row[x + 1] + below[x + 1])
            - (above[x - 1] + 2.0 * row[x - 1] + below[x - 1]);
        let gy = (below[x - 1] + 2.0 * below[x] + below[x + 1])
            - (above[x - 1] + 2.0 * above[x] + above[x + 1]);

        mag_row[x] = (gx * gx + gy * gy).sqrt();
        dir_row[x] = gy.atan2(gx);
    }
}
