#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{Corners, Point};

/// Why detection fell back to the default inset rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "reason", rename_all = "snake_case"))]
pub enum FallbackReason {
    /// Too few pixels passed the edge threshold.
    InsufficientEdges { found: usize, required: usize },
    /// The edge hull had fewer than four vertices.
    SmallHull { vertices: usize },
}

/// Where a set of corners came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CornerSource {
    /// Estimated from the convex hull of strong edges.
    Detected,
    /// Default rectangle inset by the configured margin.
    Fallback(FallbackReason),
}

/// Corner detection result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerEstimate {
    pub corners: Corners,
    pub source: CornerSource,
}

impl CornerEstimate {
    pub fn fallback(width: u32, height: u32, margin: f64, reason: FallbackReason) -> Self {
        Self {
            corners: Corners::inset(width, height, margin),
            source: CornerSource::Fallback(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, CornerSource::Fallback(_))
    }
}

/// Reduce hull vertices to four plate corners.
///
/// Each role independently takes the vertex with the lowest score (the first
/// one on ties):
///
/// - top-left: `x + y`
/// - top-right: `y - x`
/// - bottom-left: `x - y`
/// - bottom-right: `-(x + y)`
///
/// Near-triangular hulls can hand the same vertex to two roles; such corners
/// fail validation at rectification time. Hulls with fewer than four vertices
/// fall back to the inset rectangle.
pub fn estimate_corners(hull: &[Point], width: u32, height: u32, margin: f64) -> CornerEstimate {
    if hull.len() < 4 {
        return CornerEstimate::fallback(
            width,
            height,
            margin,
            FallbackReason::SmallHull { vertices: hull.len() },
        );
    }

    let pick = |score: fn(&Point) -> f64| -> Point {
        let mut best = hull[0];
        let mut best_score = score(&best);
        for p in &hull[1..] {
            let s = score(p);
            if s < best_score {
                best = *p;
                best_score = s;
            }
        }
        best
    };

    CornerEstimate {
        corners: Corners {
            top_left: pick(|p| p.x + p.y),
            top_right: pick(|p| p.y - p.x),
            bottom_left: pick(|p| p.x - p.y),
            bottom_right: pick(|p| -(p.x + p.y)),
        },
        source: CornerSource::Detected,
    }
}
