use super::homography::Homography;
use super::rectifier::{warp_row, Coverage, Warped};
use crate::image::ImageRgba8;

/// A resumable warp that fills a fixed number of destination rows per step.
///
/// Lets a cooperative scheduler interleave a large rectification with other
/// work. The finished image is identical to [`super::rectifier::warp`].
#[derive(Debug)]
pub struct ChunkedWarp<'a> {
    src: &'a ImageRgba8,
    hom: Homography,
    fill: [u8; 4],
    rows_per_step: u32,
    next_row: u32,
    image: ImageRgba8,
    sampled: u64,
}

impl<'a> ChunkedWarp<'a> {
    /// `rows_per_step` is raised to 1 if zero.
    pub fn new(
        src: &'a ImageRgba8,
        hom: Homography,
        width: u32,
        height: u32,
        fill: [u8; 4],
        rows_per_step: u32,
    ) -> Self {
        Self {
            src,
            hom,
            fill,
            rows_per_step: rows_per_step.max(1),
            next_row: 0,
            image: ImageRgba8::new(width, height),
            sampled: 0,
        }
    }

    /// Process the next batch of rows. Returns `false` once every row is done.
    pub fn step(&mut self) -> bool {
        let height = self.image.height;
        if self.next_row >= height {
            return false;
        }
        let end = (self.next_row + self.rows_per_step).min(height);
        let stride = self.image.stride as usize;
        let width = self.image.width;

        for y in self.next_row..end {
            let start = y as usize * stride;
            let row = &mut self.image.buf[start..start + stride];
            self.sampled += warp_row(self.src, &self.hom, width, y, row, self.fill);
        }
        self.next_row = end;
        self.next_row < height
    }

    /// Fraction of destination rows completed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.image.height == 0 {
            return 1.0;
        }
        self.next_row as f64 / self.image.height as f64
    }

    pub fn is_done(&self) -> bool {
        self.next_row >= self.image.height
    }

    /// Run any remaining rows and return the result.
    pub fn finish(mut self) -> Warped {
        while self.step() {}
        let total = self.image.width as u64 * self.image.height as u64;
        Warped {
            coverage: Coverage {
                sampled: self.sampled,
                filled: total - self.sampled,
            },
            image: self.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Corners;
    use crate::warp::rectifier::warp;

    fn checker(w: u32, h: u32) -> ImageRgba8 {
        let mut img = ImageRgba8::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let v = if (x / 4 + y / 4) % 2 == 0 { 20 } else { 230 };
                img.set(x, y, [v, 255 - v, v / 2, 255]);
            }
        }
        img
    }

    #[test]
    fn matches_one_shot_warp() {
        let src = checker(80, 60);
        let corners = Corners::from_array([[8.0, 6.0], [75.0, 2.0], [70.0, 58.0], [3.0, 50.0]]);
        let (w, h) = corners.target_size();
        let hom = Homography::from_rect_to_quad(&corners, w, h).unwrap();

        let expected = warp(&src, &hom, w, h, [9, 9, 9, 9]);

        let mut job = ChunkedWarp::new(&src, hom, w, h, [9, 9, 9, 9], 7);
        let mut steps = 1;
        while job.step() {
            steps += 1;
        }
        assert!(job.is_done());
        assert_eq!(steps, h.div_ceil(7));
        let got = job.finish();
        assert_eq!(got.image, expected.image);
        assert_eq!(got.coverage, expected.coverage);
    }

    #[test]
    fn progress_advances() {
        let src = checker(10, 10);
        let mut job = ChunkedWarp::new(&src, Homography::IDENTITY, 10, 10, [0; 4], 4);
        assert_eq!(job.progress(), 0.0);
        assert!(job.step());
        assert!((job.progress() - 0.4).abs() < 1e-12);
        assert!(job.step());
        assert!(!job.step());
        assert!(job.is_done());
        assert!(!job.step());
        assert_eq!(job.finish().image, src);
    }

    #[test]
    fn zero_rows_per_step_still_advances() {
        let src = checker(4, 4);
        let mut job = ChunkedWarp::new(&src, Homography::IDENTITY, 4, 4, [0; 4], 0);
        assert!(job.step());
        assert!((job.progress() - 0.25).abs() < 1e-12);
    }
}
