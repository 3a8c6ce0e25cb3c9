use log::debug;

use super::corners::{estimate_corners, CornerEstimate, FallbackReason};
use super::edge::edge_map;
use super::hull::convex_hull;
use super::points::edge_points;
use crate::config::RectifyConfig;
use crate::geometry::{Corners, Point};
use crate::image::ImageRgba8;

/// Automatic plate-corner detector.
#[derive(Debug, Clone, Default)]
pub struct CornerDetector {
    pub config: RectifyConfig,
}

impl CornerDetector {
    pub fn new(config: RectifyConfig) -> Self {
        Self { config }
    }

    /// Estimate the plate corners of `img`, in `img`'s coordinates.
    ///
    /// Never fails: too few edges or a degenerate hull yield the default inset
    /// rectangle, flagged in [`CornerEstimate::source`].
    pub fn detect(&self, img: &ImageRgba8) -> CornerEstimate {
        let f = self.downscale_factor(img);
        if f <= 1 {
            return self.detect_at_full_size(img);
        }

        // Stage 0: Detect on a smaller copy, then scale corners back up.
        let small = img.downscale(f);
        debug!(
            "detecting corners on {}x{} copy (factor {f})",
            small.width, small.height
        );
        let mut est = self.detect_at_full_size(&small);
        est.corners = if est.is_fallback() {
            Corners::inset(img.width, img.height, self.config.default_margin)
        } else {
            upscale_corners(&est.corners, f)
        };
        est
    }

    fn detect_at_full_size(&self, img: &ImageRgba8) -> CornerEstimate {
        let c = &self.config;

        // Stage 1: Gradient map
        let map = edge_map(img);

        // Stage 2: Strong-edge pixels
        let pts = edge_points(&map, c.edge_threshold);
        if pts.len() < c.min_edge_points {
            debug!(
                "only {} edge points (need {}), using default rectangle",
                pts.len(),
                c.min_edge_points
            );
            return CornerEstimate::fallback(
                img.width,
                img.height,
                c.default_margin,
                FallbackReason::InsufficientEdges {
                    found: pts.len(),
                    required: c.min_edge_points,
                },
            );
        }

        // Stage 3: Convex hull
        let pts: Vec<Point> = pts.into_iter().map(Point::from).collect();
        let hull = convex_hull(&pts, c.max_hull_points);

        // Stage 4: Corner roles
        let est = estimate_corners(&hull, img.width, img.height, c.default_margin);
        debug!(
            "{} edge points, {} hull vertices, corners {:?} ({:?})",
            pts.len(),
            hull.len(),
            est.corners.to_array(),
            est.source
        );
        est
    }

    /// Integer shrink factor that brings the longest side under `detect_max_dim`.
    fn downscale_factor(&self, img: &ImageRgba8) -> u32 {
        let max_dim = self.config.detect_max_dim;
        let longest = img.width.max(img.height);
        if max_dim == 0 || longest <= max_dim {
            return 1;
        }
        longest.div_ceil(max_dim)
    }
}

/// Map corners found on an `f`-times downscaled copy back to full resolution.
///
/// Downscaled pixel `p` covers full-resolution pixels `[p*f, p*f + f)`, so it
/// maps to the centre of that block.
fn upscale_corners(c: &Corners, f: u32) -> Corners {
    let f = f as f64;
    let mut pts = c.to_array();
    for p in pts.iter_mut() {
        for v in p.iter_mut() {
            *v = (*v + 0.5) * f - 0.5;
        }
    }
    Corners::from_array(pts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::corners::CornerSource;

    /// Light plate rectangle `[x0, x1) × [y0, y1)` on a dark background.
    fn plate_image(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> ImageRgba8 {
        let mut img = ImageRgba8::filled(w, h, [30, 30, 30, 255]);
        for y in y0..y1 {
            for x in x0..x1 {
                img.set(x, y, [240, 240, 240, 255]);
            }
        }
        img
    }

    fn near(p: Point, x: f64, y: f64, tol: f64) -> bool {
        (p.x - x).abs() <= tol && (p.y - y).abs() <= tol
    }

    #[test]
    fn blank_image_falls_back_to_inset() {
        let det = CornerDetector::default();
        let img = ImageRgba8::filled(200, 100, [128, 128, 128, 255]);
        let est = det.detect(&img);
        assert_eq!(
            est.source,
            CornerSource::Fallback(FallbackReason::InsufficientEdges { found: 0, required: 10 })
        );
        assert_eq!(est.corners, Corners::inset(200, 100, 0.05));
    }

    #[test]
    fn finds_plate_rectangle() {
        let det = CornerDetector::default();
        let img = plate_image(200, 100, 40, 20, 160, 80);
        let est = det.detect(&img);
        assert_eq!(est.source, CornerSource::Detected);
        let c = est.corners;
        assert!(near(c.top_left, 40.0, 20.0, 2.0), "{:?}", c.top_left);
        assert!(near(c.top_right, 159.0, 20.0, 2.0), "{:?}", c.top_right);
        assert!(near(c.bottom_left, 40.0, 79.0, 2.0), "{:?}", c.bottom_left);
        assert!(near(c.bottom_right, 159.0, 79.0, 2.0), "{:?}", c.bottom_right);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn downscaled_detection_maps_back() {
        let mut config = RectifyConfig::default();
        config.detect_max_dim = 100;
        let det = CornerDetector::new(config);
        let img = plate_image(400, 200, 80, 40, 320, 160);
        let est = det.detect(&img);
        assert_eq!(est.source, CornerSource::Detected);
        let c = est.corners;
        assert!(near(c.top_left, 80.0, 40.0, 8.0), "{:?}", c.top_left);
        assert!(near(c.bottom_right, 320.0, 160.0, 8.0), "{:?}", c.bottom_right);
    }

    #[test]
    fn upscale_maps_to_block_centres() {
        let small = Corners::rect(0.0, 0.0, 10.0, 5.0);
        let c = upscale_corners(&small, 4);
        // Pixel 0 covers full-size pixels 0..4, centred on 1.5.
        assert!(near(c.top_left, 1.5, 1.5, 1e-12), "{:?}", c.top_left);
        assert!(near(c.bottom_right, 41.5, 21.5, 1e-12), "{:?}", c.bottom_right);
        assert_eq!(upscale_corners(&small, 1), small);
    }

    #[test]
    fn downscaled_corners_are_not_biased_towards_origin() {
        let mut config = RectifyConfig::default();
        config.detect_max_dim = 100;
        let det = CornerDetector::new(config);
        let full = CornerDetector::default();
        let img = plate_image(400, 200, 80, 40, 320, 160);

        let small = det.detect(&img).corners.to_array();
        let exact = full.detect(&img).corners.to_array();
        // Mean offset over all corners stays well under the (f-1)/2 block bias.
        let (mut dx, mut dy) = (0.0, 0.0);
        for (s, e) in small.iter().zip(exact.iter()) {
            dx += s[0] - e[0];
            dy += s[1] - e[1];
        }
        assert!((dx / 4.0).abs() < 1.0, "mean dx {}", dx / 4.0);
        assert!((dy / 4.0).abs() < 1.0, "mean dy {}", dy / 4.0);
    }

    #[test]
    fn downscaled_fallback_uses_full_size_inset() {
        let mut config = RectifyConfig::default();
        config.detect_max_dim = 50;
        let det = CornerDetector::new(config);
        let img = ImageRgba8::filled(210, 90, [0, 0, 0, 255]);
        let est = det.detect(&img);
        assert!(est.is_fallback());
        assert_eq!(est.corners, Corners::inset(210, 90, 0.05));
    }

    #[test]
    fn downscale_factor_rounds_up() {
        let mut config = RectifyConfig::default();
        config.detect_max_dim = 100;
        let det = CornerDetector::new(config);
        assert_eq!(det.downscale_factor(&ImageRgba8::new(100, 40)), 1);
        assert_eq!(det.downscale_factor(&ImageRgba8::new(101, 40)), 2);
        assert_eq!(det.downscale_factor(&ImageRgba8::new(120, 301)), 4);
    }
}
