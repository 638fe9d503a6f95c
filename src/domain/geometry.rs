// ============================================================
// Layer 3 — Geometry Domain Types
// ============================================================
// A scanned page is never perfectly aligned with the reference
// questionnaire: the paper shifts and rotates slightly in the
// scanner. The aligner expresses that distortion as an affine
// map from template coordinates to scan coordinates:
//
//   p_scan = A · p_template + b
//
// where A is a 2×2 matrix and b a translation vector.
// Everything downstream (box extraction, annotation) works with
// template coordinates pushed through this map.

use serde::{Deserialize, Serialize};

/// A pixel coordinate on a 2D image.
///
/// x runs horizontally, y vertically, origin at the top-left
/// corner — image-crate convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

impl Pixel {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Pixel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

/// The affine map `p ↦ A·p + b` between template space and scan space.
///
/// Row-major: `a` = [a11, a12, a21, a22], `b` = [bx, by].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMap {
    pub a: [f64; 4],
    pub b: [f64; 2],
}

impl AffineMap {
    /// Apply the map in floating point.
    pub fn apply_f64(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a[0] * x + self.a[1] * y + self.b[0],
            self.a[2] * x + self.a[3] * y + self.b[1],
        )
    }

    /// Apply the map to a pixel, rounding to the nearest pixel —
    /// the original formulation rounds rather than truncates, so
    /// a 0.5-pixel drift cannot accumulate into an off-by-one.
    pub fn apply(&self, p: Pixel) -> Pixel {
        let (x, y) = self.apply_f64(p.x as f64, p.y as f64);
        Pixel::new(x.round() as i32, y.round() as i32)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_a_fixed_point() {
        let map = AffineMap { a: [1.0, 0.0, 0.0, 1.0], b: [0.0, 0.0] };
        let p = Pixel::new(37, 154);
        assert_eq!(map.apply(p), p);
    }

    #[test]
    fn test_pure_translation() {
        let map = AffineMap {
            a: [1.0, 0.0, 0.0, 1.0],
            b: [10.0, -4.0],
        };
        assert_eq!(map.apply(Pixel::new(5, 5)), Pixel::new(15, 1));
    }

    #[test]
    fn test_rotation_by_90_degrees() {
        // (x, y) → (-y, x)
        let map = AffineMap {
            a: [0.0, -1.0, 1.0, 0.0],
            b: [0.0, 0.0],
        };
        assert_eq!(map.apply(Pixel::new(3, 2)), Pixel::new(-2, 3));
    }

    #[test]
    fn test_apply_rounds_to_nearest() {
        let map = AffineMap {
            a: [1.0, 0.0, 0.0, 1.0],
            b: [0.6, 0.4],
        };
        assert_eq!(map.apply(Pixel::new(0, 0)), Pixel::new(1, 0));
    }
}
