use crate::error::RectifyError;
use crate::geometry::{Corners, Point};

/// Pivots below this fraction of the largest coefficient are treated as zero.
const PIVOT_EPS: f64 = 1e-12;

/// A 3x3 homography matrix, normalized so that `data[2][2] == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    pub data: [[f64; 3]; 3],
}

impl Homography {
    pub const IDENTITY: Homography = Homography {
        data: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Compute the mapping from a `width` × `height` destination rectangle onto
    /// the source quadrilateral.
    ///
    /// Destination corners (0,0), (W,0), (W,H), (0,H) map to the TL, TR, BR and
    /// BL source corners. Degenerate corners or a singular system are reported
    /// as [`RectifyError::DegenerateQuad`].
    pub fn from_rect_to_quad(corners: &Corners, width: u32, height: u32) -> Result<Self, RectifyError> {
        if width == 0 || height == 0 {
            return Err(RectifyError::EmptyTarget { width, height });
        }
        corners.validate()?;

        let (w, h) = (width as f64, height as f64);
        let rect_pts = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];
        let quad_pts = corners.to_array();

        // Build 8x9 system (last column is the right-hand side)
        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (u, v) = (rect_pts[i][0], rect_pts[i][1]);
            let (x, y) = (quad_pts[i][0], quad_pts[i][1]);

            let row0 = i * 2;
            a[row0][0] = u;
            a[row0][1] = v;
            a[row0][2] = 1.0;
            a[row0][6] = -u * x;
            a[row0][7] = -v * x;
            a[row0][8] = x;

            let row1 = i * 2 + 1;
            a[row1][3] = u;
            a[row1][4] = v;
            a[row1][5] = 1.0;
            a[row1][6] = -u * y;
            a[row1][7] = -v * y;
            a[row1][8] = y;
        }

        let h = solve_8x8(&mut a).ok_or_else(|| {
            RectifyError::DegenerateQuad("singular system: corners are collinear or coincide".into())
        })?;

        let hom = Homography {
            data: [
                [h[0], h[1], h[2]],
                [h[3], h[4], h[5]],
                [h[6], h[7], 1.0],
            ],
        };

        // Hadamard bound: |det| never exceeds the product of the column norms.
        let m = &hom.data;
        let bound: f64 = (0..3)
            .map(|c| (m[0][c] * m[0][c] + m[1][c] * m[1][c] + m[2][c] * m[2][c]).sqrt())
            .product();
        let det = hom.determinant();
        if !det.is_finite() || det.abs() <= PIVOT_EPS * bound {
            return Err(RectifyError::DegenerateQuad(format!(
                "solved homography is singular (det = {det:e})"
            )));
        }
        Ok(hom)
    }

    /// Apply the matrix to `(x, y, 1)` without the perspective divide.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> [f64; 3] {
        let h = &self.data;
        [
            h[0][0] * x + h[0][1] * y + h[0][2],
            h[1][0] * x + h[1][1] * y + h[1][2],
            h[2][0] * x + h[2][1] * y + h[2][2],
        ]
    }

    /// Project a point through the homography.
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        let [xx, yy, zz] = self.apply(x, y);
        (xx / zz, yy / zz)
    }

    pub fn project_point(&self, p: Point) -> Point {
        let (x, y) = self.project(p.x, p.y);
        Point::new(x, y)
    }

    /// Row-major entries.
    pub fn as_array(&self) -> [f64; 9] {
        let m = &self.data;
        [m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2]]
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.data;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Compute the inverse homography, normalized so its last entry is 1.
    pub fn inverse(&self) -> Option<Self> {
        let m = &self.data;
        let det = self.determinant();

        if det.abs() < 1e-10 {
            return None;
        }

        let inv_det = 1.0 / det;
        let mut inv = [[0.0f64; 3]; 3];

        inv[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det;
        inv[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det;
        inv[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
        inv[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det;
        inv[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
        inv[1][2] = (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det;
        inv[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det;
        inv[2][1] = (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det;
        inv[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det;

        let s = inv[2][2];
        if s.abs() < 1e-12 {
            return Some(Homography { data: inv });
        }
        for row in &mut inv {
            for v in row.iter_mut() {
                *v /= s;
            }
        }
        Some(Homography { data: inv })
    }
}

/// Solve an 8x8 system given as an augmented 8x9 matrix.
///
/// Gaussian elimination with partial pivoting, then back-substitution.
/// Returns `None` when a pivot is negligible relative to the largest
/// coefficient.
fn solve_8x8(a: &mut [[f64; 9]; 8]) -> Option<[f64; 8]> {
    let scale = a
        .iter()
        .flat_map(|row| row[..8].iter())
        .fold(0.0f64, |m, v| m.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let tol = PIVOT_EPS * scale;

    for col in 0..8 {
        // Find pivot
        let mut max_val = a[col][col].abs();
        let mut max_row = col;
        for row in (col + 1)..8 {
            let v = a[row][col].abs();
            if v > max_val {
                max_val = v;
                max_row = row;
            }
        }
        if max_val <= tol {
            return None;
        }

        // Swap
        if max_row != col {
            a.swap(col, max_row);
        }

        // Eliminate below
        let pivot = a[col][col];
        for row in (col + 1)..8 {
            let factor = a[row][col] / pivot;
            for c in col..9 {
                a[row][c] -= factor * a[col][c];
            }
        }
    }

    // Back-substitute
    let mut x = [0.0f64; 8];
    for row in (0..8).rev() {
        let mut sum = a[row][8];
        for c in (row + 1)..8 {
            sum -= a[row][c] * x[c];
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}
