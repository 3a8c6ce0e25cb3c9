use std::cmp::Ordering;

use crate::geometry::Point;

/// Keep at most `max_points` points by taking every N-th point in input order.
///
/// `N = ceil(len / max_points)`, so the result is deterministic.
pub fn subsample(points: &[Point], max_points: usize) -> Vec<Point> {
    if max_points == 0 || points.len() <= max_points {
        return points.to_vec();
    }
    let step = points.len().div_ceil(max_points);
    points.iter().step_by(step).copied().collect()
}

/// Convex hull of a point set (Graham scan).
///
/// Inputs above `max_points` are subsampled first. Fewer than three points are
/// returned unchanged. Collinear and duplicate points are dropped from the
/// hull. Vertices are ordered counter-clockwise as drawn on screen, starting
/// from the bottom-most (then left-most) point.
pub fn convex_hull(points: &[Point], max_points: usize) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut pts = subsample(points, max_points);

    // Anchor: largest y, ties broken by smallest x.
    let mut anchor_idx = 0;
    for i in 1..pts.len() {
        let (p, a) = (pts[i], pts[anchor_idx]);
        if p.y > a.y || (p.y == a.y && p.x < a.x) {
            anchor_idx = i;
        }
    }
    pts.swap(0, anchor_idx);
    let anchor = pts[0];

    // Polar angle with y flipped so angles run counter-clockwise in a y-up frame.
    pts[1..].sort_by(|a, b| {
        let ta = (anchor.y - a.y).atan2(a.x - anchor.x);
        let tb = (anchor.y - b.y).atan2(b.x - anchor.x);
        ta.partial_cmp(&tb)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                let da = (a.x - anchor.x).powi(2) + (a.y - anchor.y).powi(2);
                let db = (b.x - anchor.x).powi(2) + (b.y - anchor.y).powi(2);
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            })
    });

    let mut hull: Vec<Point> = Vec::with_capacity(pts.len());
    for p in pts {
        while hull.len() > 1 && left_turn(&hull[hull.len() - 2], &hull[hull.len() - 1], &p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull
}

/// Cross product in a y-up frame: positive for a left (counter-clockwise) turn.
#[inline]
fn left_turn(o: &Point, a: &Point, b: &Point) -> f64 {
    -crate::geometry::cross(o, a, b)
}
