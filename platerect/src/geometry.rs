#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::RectifyError;

/// A point in pixel coordinates (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An integer pixel coordinate, as produced by edge thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: u32,
    pub y: u32,
}

impl From<PixelPoint> for Point {
    fn from(p: PixelPoint) -> Self {
        Point::new(p.x as f64, p.y as f64)
    }
}

/// Twice the signed area of triangle (o, a, b).
///
/// Positive when `b` lies counter-clockwise of `o → a` in a y-up frame,
/// i.e. clockwise as drawn on screen.
#[inline]
pub fn cross(o: &Point, a: &Point, b: &Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// The four corners of a plate quadrilateral in source-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Corners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl Corners {
    /// Axis-aligned rectangle spanning `[x0, x1] × [y0, y1]`.
    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            top_left: Point::new(x0, y0),
            top_right: Point::new(x1, y0),
            bottom_left: Point::new(x0, y1),
            bottom_right: Point::new(x1, y1),
        }
    }

    /// Rectangle inset from the image border by `margin` (a fraction of each dimension).
    pub fn inset(width: u32, height: u32, margin: f64) -> Self {
        let w = width as f64;
        let h = height as f64;
        Self::rect(w * margin, h * margin, w * (1.0 - margin), h * (1.0 - margin))
    }

    /// Build from corners in perimeter order: TL, TR, BR, BL.
    pub fn from_array(pts: [[f64; 2]; 4]) -> Self {
        Self {
            top_left: Point::new(pts[0][0], pts[0][1]),
            top_right: Point::new(pts[1][0], pts[1][1]),
            bottom_right: Point::new(pts[2][0], pts[2][1]),
            bottom_left: Point::new(pts[3][0], pts[3][1]),
        }
    }

    /// Corners in perimeter order: TL, TR, BR, BL.
    pub fn to_array(&self) -> [[f64; 2]; 4] {
        self.ring().map(|p| [p.x, p.y])
    }

    fn ring(&self) -> [Point; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    /// Multiply every coordinate by `s`.
    pub fn scale(&self, s: f64) -> Self {
        let f = |p: Point| Point::new(p.x * s, p.y * s);
        Self {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_left: f(self.bottom_left),
            bottom_right: f(self.bottom_right),
        }
    }

    /// Clamp every corner into `[0, width] × [0, height]`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let f = |p: Point| Point::new(p.x.clamp(0.0, w), p.y.clamp(0.0, h));
        Self {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_left: f(self.bottom_left),
            bottom_right: f(self.bottom_right),
        }
    }

    /// Signed shoelace area over TL → TR → BR → BL.
    ///
    /// Positive for the natural screen orientation (clockwise on screen).
    pub fn area(&self) -> f64 {
        let r = self.ring();
        let mut sum = 0.0;
        for i in 0..4 {
            let a = r[i];
            let b = r[(i + 1) % 4];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    /// Edge lengths `(top, bottom, left, right)`.
    pub fn edge_lengths(&self) -> (f64, f64, f64, f64) {
        (
            self.top_left.distance(&self.top_right),
            self.bottom_left.distance(&self.bottom_right),
            self.top_left.distance(&self.bottom_left),
            self.top_right.distance(&self.bottom_right),
        )
    }

    /// Output raster size preserving the quad's approximate physical scale.
    pub fn target_size(&self) -> (u32, u32) {
        let (top, bottom, left, right) = self.edge_lengths();
        target_size_from_edges(top, bottom, left, right)
    }

    /// Reject corners that cannot define a projective mapping.
    ///
    /// Fails on non-finite coordinates, three (near-)collinear corners, or a
    /// quadrilateral without positive area.
    pub fn validate(&self) -> Result<(), RectifyError> {
        let r = self.ring();
        if !r.iter().all(Point::is_finite) {
            return Err(RectifyError::DegenerateQuad("non-finite corner coordinate".into()));
        }

        let (top, bottom, left, right) = self.edge_lengths();
        let scale = top.max(bottom).max(left).max(right);
        if scale <= f64::EPSILON {
            return Err(RectifyError::DegenerateQuad("all corners coincide".into()));
        }

        // Triangle areas relative to the squared quad size.
        let tol = 1e-6 * scale * scale;
        for skip in 0..4 {
            let tri: Vec<&Point> = (0..4).filter(|&i| i != skip).map(|i| &r[i]).collect();
            if cross(tri[0], tri[1], tri[2]).abs() <= tol {
                return Err(RectifyError::DegenerateQuad(format!(
                    "three corners are collinear (excluding {})",
                    CORNER_NAMES[skip]
                )));
            }
        }

        if self.area() <= tol {
            return Err(RectifyError::DegenerateQuad(format!(
                "quadrilateral area {:.3} is not positive",
                self.area()
            )));
        }
        Ok(())
    }
}

const CORNER_NAMES: [&str; 4] = ["top-left", "top-right", "bottom-right", "bottom-left"];

/// `W = round(max(top, bottom))`, `H = round(max(left, right))`.
pub fn target_size_from_edges(top: f64, bottom: f64, left: f64, right: f64) -> (u32, u32) {
    let w = top.max(bottom).round();
    let h = left.max(right).round();
    (w.max(0.0) as u32, h.max(0.0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_size_takes_longest_edges() {
        assert_eq!(target_size_from_edges(100.0, 120.0, 50.0, 60.0), (120, 60));
        assert_eq!(target_size_from_edges(99.6, 10.0, 0.4, 0.2), (100, 0));
    }

    #[test]
    fn target_size_of_trapezoid() {
        let c = Corners {
            top_left: Point::new(20.0, 10.0),
            top_right: Point::new(180.0, 10.0),
            bottom_left: Point::new(0.0, 90.0),
            bottom_right: Point::new(200.0, 90.0),
        };
        // left/right edges: sqrt(20² + 80²) = 82.46
        assert_eq!(c.target_size(), (200, 82));
    }

    #[test]
    fn inset_uses_margin_fraction() {
        let c = Corners::inset(200, 100, 0.05);
        assert_eq!(c.top_left, Point::new(10.0, 5.0));
        assert_eq!(c.top_right, Point::new(190.0, 5.0));
        assert_eq!(c.bottom_left, Point::new(10.0, 95.0));
        assert_eq!(c.bottom_right, Point::new(190.0, 95.0));
    }

    #[test]
    fn array_order_is_perimeter() {
        let arr = [[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 5.0]];
        let c = Corners::from_array(arr);
        assert_eq!(c.bottom_right, Point::new(10.0, 5.0));
        assert_eq!(c.bottom_left, Point::new(0.0, 5.0));
        assert_eq!(c.to_array(), arr);
    }

    #[test]
    fn area_is_positive_for_screen_order() {
        let c = Corners::rect(0.0, 0.0, 10.0, 5.0);
        assert!((c.area() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn validate_accepts_convex_quad() {
        let c = Corners::from_array([[10.0, 20.0], [90.0, 15.0], [95.0, 85.0], [5.0, 90.0]]);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn validate_rejects_collinear_corners() {
        let c = Corners {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(50.0, 0.0),
            bottom_right: Point::new(100.0, 0.0),
            bottom_left: Point::new(0.0, 40.0),
        };
        assert!(matches!(c.validate(), Err(RectifyError::DegenerateQuad(_))));
    }

    #[test]
    fn validate_rejects_duplicate_corners() {
        let c = Corners {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(0.0, 0.0),
            bottom_right: Point::new(100.0, 40.0),
            bottom_left: Point::new(0.0, 40.0),
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_mirrored_quad() {
        // Left and right swapped: negative orientation.
        let c = Corners::rect(100.0, 0.0, 0.0, 50.0);
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_nan() {
        let mut c = Corners::rect(0.0, 0.0, 10.0, 10.0);
        c.top_left.x = f64::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn scale_and_clamp() {
        let c = Corners::rect(-5.0, 2.0, 50.0, 30.0).scale(2.0).clamp_to(80, 50);
        assert_eq!(c.top_left, Point::new(0.0, 4.0));
        assert_eq!(c.bottom_right, Point::new(80.0, 50.0));
    }
}
