use log::{debug, warn};

use crate::config::RectifyConfig;
use crate::detect::corners::CornerEstimate;
use crate::detect::detector::CornerDetector;
use crate::error::RectifyError;
use crate::geometry::Corners;
use crate::image::ImageRgba8;
use crate::warp::chunked::ChunkedWarp;
use crate::warp::homography::Homography;
use crate::warp::rectifier::{warp, Coverage};

/// A rectified plate image.
#[derive(Debug, Clone)]
pub struct Rectified {
    pub image: ImageRgba8,
    /// Source corners the image was rectified from.
    pub corners: Corners,
    /// Destination-to-source mapping used for sampling.
    pub homography: Homography,
    pub coverage: Coverage,
}

impl Rectified {
    /// Whether too few output pixels were sampled from the source, which
    /// usually means the corners were badly placed.
    pub fn is_suspect(&self, min_coverage: f64) -> bool {
        self.coverage.fraction() < min_coverage
    }
}

/// Corner detection plus perspective rectification with a shared config.
#[derive(Debug, Clone, Default)]
pub struct PlateRectifier {
    detector: CornerDetector,
}

impl PlateRectifier {
    pub fn new(config: RectifyConfig) -> Self {
        Self {
            detector: CornerDetector::new(config),
        }
    }

    pub fn config(&self) -> &RectifyConfig {
        &self.detector.config
    }

    /// Estimate plate corners from image edges.
    pub fn detect_corners(&self, img: &ImageRgba8) -> CornerEstimate {
        self.detector.detect(img)
    }

    /// Solve the homography for `corners` and its derived output size.
    pub fn plan(&self, corners: &Corners) -> Result<(Homography, u32, u32), RectifyError> {
        let (w, h) = corners.target_size();
        if ImageRgba8::byte_len(w, h).is_none() {
            return Err(RectifyError::TooLarge { width: w, height: h });
        }
        let hom = Homography::from_rect_to_quad(corners, w, h)?;
        Ok((hom, w, h))
    }

    /// Rectify the quadrilateral `corners` of `img` onto an upright rectangle.
    pub fn rectify(&self, img: &ImageRgba8, corners: &Corners) -> Result<Rectified, RectifyError> {
        let (homography, w, h) = self.plan(corners)?;
        debug!("rectifying {}x{} source to {w}x{h}", img.width, img.height);

        let warped = warp(img, &homography, w, h, self.config().fill);
        let rectified = Rectified {
            image: warped.image,
            corners: *corners,
            homography,
            coverage: warped.coverage,
        };
        self.check_coverage(&rectified);
        Ok(rectified)
    }

    /// Detect corners, then rectify with them.
    pub fn rectify_auto(&self, img: &ImageRgba8) -> Result<(CornerEstimate, Rectified), RectifyError> {
        let est = self.detect_corners(img);
        let rectified = self.rectify(img, &est.corners)?;
        Ok((est, rectified))
    }

    /// Prepare a resumable rectification of `corners` that fills
    /// `rows_per_step` output rows per [`ChunkedWarp::step`].
    pub fn rectify_chunked<'a>(
        &self,
        img: &'a ImageRgba8,
        corners: &Corners,
        rows_per_step: u32,
    ) -> Result<ChunkedWarp<'a>, RectifyError> {
        let (homography, w, h) = self.plan(corners)?;
        Ok(ChunkedWarp::new(img, homography, w, h, self.config().fill, rows_per_step))
    }

    fn check_coverage(&self, rectified: &Rectified) {
        let min = self.config().min_coverage;
        if rectified.is_suspect(min) {
            warn!(
                "only {:.1}% of output pixels sampled from the source (minimum {:.1}%); corners may be misplaced",
                rectified.coverage.fraction() * 100.0,
                min * 100.0
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn rectify_rejects_collinear_corners() {
        let r = PlateRectifier::default();
        let img = ImageRgba8::new(100, 50);
        let corners = Corners {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(50.0, 25.0),
            bottom_right: Point::new(100.0, 50.0),
            bottom_left: Point::new(0.0, 50.0),
        };
        assert!(matches!(
            r.rectify(&img, &corners),
            Err(RectifyError::DegenerateQuad(_))
        ));
    }

    #[test]
    fn rectify_sub_pixel_quad_is_empty_target() {
        let r = PlateRectifier::default();
        let img = ImageRgba8::new(10, 10);
        let corners = Corners::rect(1.0, 1.0, 1.3, 1.2);
        assert!(matches!(
            r.rectify(&img, &corners),
            Err(RectifyError::EmptyTarget { .. })
        ));
    }

    #[test]
    fn oversized_target_is_rejected() {
        let r = PlateRectifier::default();
        let img = ImageRgba8::new(10, 10);
        let corners = Corners::rect(0.0, 0.0, 2.0e9, 10.0);
        assert!(matches!(
            r.rectify(&img, &corners),
            Err(RectifyError::TooLarge { width: 2_000_000_000, height: 10 })
        ));
        assert!(r.rectify_chunked(&img, &corners, 4).is_err());
    }

    #[test]
    fn corners_outside_image_are_suspect() {
        let r = PlateRectifier::default();
        let img = ImageRgba8::filled(50, 50, [255; 4]);
        let corners = Corners::rect(30.0, 30.0, 130.0, 80.0);
        let out = r.rectify(&img, &corners).unwrap();
        assert_eq!((out.image.width, out.image.height), (100, 50));
        assert!(out.coverage.fraction() < 0.5);
        assert!(out.is_suspect(r.config().min_coverage));
        // Filled pixels use the configured neutral colour.
        assert_eq!(out.image.get(99, 49), [0, 0, 0, 0]);
    }

    #[test]
    fn rectify_auto_on_blank_uses_inset() {
        let r = PlateRectifier::default();
        let img = ImageRgba8::filled(200, 100, [50, 60, 70, 255]);
        let (est, out) = r.rectify_auto(&img).unwrap();
        assert!(est.is_fallback());
        assert_eq!(out.corners, Corners::inset(200, 100, 0.05));
        assert_eq!((out.image.width, out.image.height), (180, 90));
        assert_eq!(out.coverage.filled, 0);
        assert_eq!(out.image.get(90, 45), [50, 60, 70, 255]);
    }

    #[test]
    fn chunked_matches_rectify() {
        let r = PlateRectifier::default();
        let mut img = ImageRgba8::new(60, 40);
        for y in 0..40 {
            for x in 0..60 {
                img.set(x, y, [(x * 4) as u8, (y * 6) as u8, 90, 255]);
            }
        }
        let corners = Corners::from_array([[5.0, 4.0], [55.0, 8.0], [52.0, 36.0], [8.0, 33.0]]);
        let one_shot = r.rectify(&img, &corners).unwrap();
        let chunked = r.rectify_chunked(&img, &corners, 3).unwrap().finish();
        assert_eq!(chunked.image, one_shot.image);
        assert_eq!(chunked.coverage, one_shot.coverage);
    }
}
