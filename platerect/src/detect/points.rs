use super::edge::EdgeMap;
use crate::geometry::PixelPoint;

/// Collect pixels whose magnitude exceeds `threshold * max(magnitude)`.
///
/// Points come back in row-major order. A map with no gradient at all
/// yields no points.
pub fn edge_points(map: &EdgeMap, threshold: f32) -> Vec<PixelPoint> {
    let max = map.max_magnitude();
    if max <= 0.0 {
        return Vec::new();
    }
    let cutoff = threshold * max;

    let w = map.width as usize;
    map.magnitude
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m > cutoff)
        .map(|(i, _)| PixelPoint {
            x: (i % w) as u32,
            y: (i / w) as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_from(width: u32, height: u32, magnitude: Vec<f32>) -> EdgeMap {
        let n = magnitude.len();
        EdgeMap {
            width,
            height,
            magnitude,
            direction: vec![0.0; n],
        }
    }

    #[test]
    fn threshold_is_relative_to_max() {
        let map = map_from(3, 2, vec![0.0, 10.0, 3.0, 2.9, 5.0, 0.0]);
        let pts = edge_points(&map, 0.3);
        assert_eq!(
            pts,
            vec![
                PixelPoint { x: 1, y: 0 },
                PixelPoint { x: 1, y: 1 },
            ]
        );
    }

    #[test]
    fn cutoff_is_strict() {
        // 3.0 == 0.3 * 10.0 is not above the cutoff.
        let map = map_from(2, 1, vec![10.0, 3.0]);
        assert_eq!(edge_points(&map, 0.3).len(), 1);
    }

    #[test]
    fn flat_map_yields_nothing() {
        let map = map_from(4, 4, vec![0.0; 16]);
        assert!(edge_points(&map, 0.3).is_empty());
        assert!(edge_points(&map, 0.0).is_empty());
    }

    #[test]
    fn row_major_coordinates() {
        let mut mag = vec![0.0; 20];
        mag[13] = 1.0; // x=3, y=2 in a 5-wide map
        let map = map_from(5, 4, mag);
        assert_eq!(edge_points(&map, 0.5), vec![PixelPoint { x: 3, y: 2 }]);
    }
}
