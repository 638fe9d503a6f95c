// ============================================================
// Layer 4 — Geometric Aligner
// ============================================================
// Recovers the distortion between the reference questionnaire and
// one scanned page as an affine map p_scan = A·p_template + b.
//
// Per reference mark:
//   1. Cut a search window around the mark's template position
//      (the paper can only drift so far inside the scanner bed).
//   2. Binarize the window with the same edge filter the masks
//      were built with.
//   3. Slide the mask over the window (normalized cross
//      correlation) and take the best-scoring position.
//   4. Keep the match only if its score clears the acceptance
//      threshold.
//
// The affine map is then fitted by least squares over all accepted
// (template point, scan point) pairs, and rejected when too few
// marks matched or the mean reprojection residual is too large.
// A rejected page is skipped by the caller, not a batch failure.
//
// Reference: imageproc template_matching documentation

use anyhow::{bail, Result};
use image::GrayImage;
use imageproc::template_matching::{match_template, MatchTemplateMethod};

use crate::data::template::{binarize, crop_centered, ReferenceTemplate, EDGE_THRESHOLD, MARK_RADIUS};
use crate::domain::geometry::{AffineMap, Pixel};

/// How far (in pixels) a mark may drift from its template position.
const SEARCH_RADIUS: u32 = 60;

/// Minimum normalized cross-correlation score for a mark match.
/// 1.0 is a pixel-perfect match, 0.0 no overlap at all.
const MIN_MATCH_SCORE: f32 = 0.6;

/// Maximum mean reprojection residual (pixels) of the fitted map.
const MAX_MEAN_RESIDUAL: f64 = 4.0;

/// A successfully recovered page alignment.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Template coordinates → scan coordinates
    pub map: AffineMap,

    /// Where each matched reference mark was found on the scan
    pub marks: Vec<Pixel>,

    /// Mean distance between matched marks and their positions
    /// predicted by the fitted map
    pub mean_residual: f64,
}

pub struct Aligner<'a> {
    template: &'a ReferenceTemplate,
}

impl<'a> Aligner<'a> {
    pub fn new(template: &'a ReferenceTemplate) -> Self {
        Self { template }
    }

    /// Align one grayscale scan against the template.
    ///
    /// Errors mean "this page could not be aligned confidently" and
    /// are meant to be caught and turned into a skip by the caller.
    pub fn align(&self, scan: &GrayImage) -> Result<Alignment> {
        let mut template_points = Vec::new();
        let mut scan_points = Vec::new();

        for (index, mark) in self.template.marks().iter().enumerate() {
            match self.locate_mark(scan, index, *mark) {
                Some((found, score)) => {
                    tracing::debug!("Mark {} matched at {} (score {:.3})", mark, found, score);
                    template_points.push(*mark);
                    scan_points.push(found);
                }
                None => {
                    tracing::debug!("Mark {} not found", mark);
                }
            }
        }

        if template_points.len() < 3 {
            bail!(
                "Only {} of {} reference marks located (3 required)",
                template_points.len(),
                self.template.marks().len(),
            );
        }

        let map = match fit_affine(&template_points, &scan_points) {
            Some(map) => map,
            None => bail!("Reference marks are degenerate (collinear); cannot fit a transform"),
        };

        let mean_residual = mean_residual(&map, &template_points, &scan_points);
        if mean_residual > MAX_MEAN_RESIDUAL {
            bail!(
                "Alignment residual too large: {:.1} px mean over {} marks",
                mean_residual,
                template_points.len(),
            );
        }

        Ok(Alignment { map, marks: scan_points, mean_residual })
    }

    /// Search one mark in its window. Returns the matched center in
    /// scan coordinates and the match score, or None when nothing in
    /// the window resembles the mask well enough.
    fn locate_mark(&self, scan: &GrayImage, index: usize, mark: Pixel) -> Option<(Pixel, f32)> {
        let (window, x0, y0) = crop_centered(scan, mark, SEARCH_RADIUS + MARK_RADIUS).ok()?;
        let window = binarize(&window, EDGE_THRESHOLD);
        let mask = self.template.mask(index);

        let scores = match_template(&window, mask, MatchTemplateMethod::CrossCorrelationNormalized);

        let mut best_score = f32::NEG_INFINITY;
        let mut best_pos = (0u32, 0u32);
        for (x, y, pixel) in scores.enumerate_pixels() {
            let score = pixel.0[0];
            // An all-background window produces NaN scores; treat
            // those as no match.
            if score.is_finite() && score > best_score {
                best_score = score;
                best_pos = (x, y);
            }
        }

        if best_score < MIN_MATCH_SCORE {
            return None;
        }

        // The match position is the mask's top-left corner inside the
        // window; shift back to the mark center in scan coordinates.
        let center = Pixel::new(
            (x0 + best_pos.0 + MARK_RADIUS) as i32,
            (y0 + best_pos.1 + MARK_RADIUS) as i32,
        );
        Some((center, best_score))
    }
}

// ─── Least-squares affine fit ─────────────────────────────────────────────────

/// Fit p_dst ≈ A·p_src + b over point pairs by least squares.
///
/// Each output coordinate is an independent linear model in
/// (x, y, 1), so the fit solves two 3-unknown normal-equation
/// systems sharing one design matrix. Returns None when the
/// source points are collinear and the system is singular.
pub fn fit_affine(src: &[Pixel], dst: &[Pixel]) -> Option<AffineMap> {
    debug_assert_eq!(src.len(), dst.len());
    if src.len() < 3 {
        return None;
    }

    // Normal equations: M = Σ d·dᵀ with design row d = [x, y, 1].
    let mut m = [[0.0f64; 3]; 3];
    let mut rhs_x = [0.0f64; 3];
    let mut rhs_y = [0.0f64; 3];

    for (s, d) in src.iter().zip(dst) {
        let row = [s.x as f64, s.y as f64, 1.0];
        for i in 0..3 {
            for j in 0..3 {
                m[i][j] += row[i] * row[j];
            }
            rhs_x[i] += row[i] * d.x as f64;
            rhs_y[i] += row[i] * d.y as f64;
        }
    }

    let ux = solve3(m, rhs_x)?;
    let uy = solve3(m, rhs_y)?;

    Some(AffineMap {
        a: [ux[0], ux[1], uy[0], uy[1]],
        b: [ux[2], uy[2]],
    })
}

/// Solve a 3×3 linear system by Gaussian elimination with partial
/// pivoting. None when the matrix is (numerically) singular.
fn solve3(mut m: [[f64; 3]; 3], mut v: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        // Pivot: largest magnitude in this column, at or below the diagonal.
        let pivot_row = (col..3).max_by(|&a, &b| {
            m[a][col].abs().partial_cmp(&m[b][col].abs()).unwrap()
        })?;
        if m[pivot_row][col].abs() < 1e-9 {
            return None;
        }
        m.swap(col, pivot_row);
        v.swap(col, pivot_row);

        for row in (col + 1)..3 {
            let factor = m[row][col] / m[col][col];
            for k in col..3 {
                m[row][k] -= factor * m[col][k];
            }
            v[row] -= factor * v[col];
        }
    }

    // Back substitution.
    let mut x = [0.0f64; 3];
    for row in (0..3).rev() {
        let mut acc = v[row];
        for k in (row + 1)..3 {
            acc -= m[row][k] * x[k];
        }
        x[row] = acc / m[row][row];
    }
    Some(x)
}

fn mean_residual(map: &AffineMap, src: &[Pixel], dst: &[Pixel]) -> f64 {
    let total: f64 = src
        .iter()
        .zip(dst)
        .map(|(s, d)| {
            let (px, py) = map.apply_f64(s.x as f64, s.y as f64);
            ((px - d.x as f64).powi(2) + (py - d.y as f64).powi(2)).sqrt()
        })
        .sum();
    total / src.len() as f64
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::template::testkit;
    use image::Luma;

    #[test]
    fn test_fit_recovers_known_translation() {
        let src = vec![Pixel::new(0, 0), Pixel::new(100, 0), Pixel::new(0, 100), Pixel::new(100, 100)];
        let dst: Vec<Pixel> = src.iter().map(|p| Pixel::new(p.x + 7, p.y - 3)).collect();

        let map = fit_affine(&src, &dst).unwrap();
        assert!((map.a[0] - 1.0).abs() < 1e-6);
        assert!((map.a[3] - 1.0).abs() < 1e-6);
        assert!((map.b[0] - 7.0).abs() < 1e-6);
        assert!((map.b[1] + 3.0).abs() < 1e-6);
        assert!(mean_residual(&map, &src, &dst) < 1e-6);
    }

    #[test]
    fn test_fit_recovers_known_scale_and_shear() {
        let src = vec![Pixel::new(0, 0), Pixel::new(50, 0), Pixel::new(0, 50), Pixel::new(50, 50)];
        let truth = AffineMap { a: [1.1, 0.02, -0.03, 0.95], b: [12.0, 5.0] };
        let dst: Vec<Pixel> = src.iter().map(|p| truth.apply(*p)).collect();

        let map = fit_affine(&src, &dst).unwrap();
        // Rounding of dst to whole pixels bounds the recoverable precision.
        for i in 0..4 {
            assert!((map.a[i] - truth.a[i]).abs() < 0.05, "a[{i}]");
        }
        assert!(mean_residual(&map, &src, &dst) < 1.0);
    }

    #[test]
    fn test_fit_rejects_collinear_marks() {
        let src = vec![Pixel::new(0, 0), Pixel::new(10, 10), Pixel::new(20, 20)];
        let dst = src.clone();
        assert!(fit_affine(&src, &dst).is_none());
    }

    #[test]
    fn test_align_finds_pure_translation() {
        let dir = tempfile::tempdir().unwrap();
        testkit::small_template_dir(dir.path());
        let template = ReferenceTemplate::load(dir.path()).unwrap();

        // A scan identical to the reference but shifted by (9, 4).
        let shift = (9, 4);
        let shifted: Vec<Pixel> = template
            .marks()
            .iter()
            .map(|m| Pixel::new(m.x + shift.0, m.y + shift.1))
            .collect();
        let mut scan = GrayImage::from_pixel(300, 300, Luma([255u8]));
        testkit::paint_marks(&mut scan, &shifted);

        let alignment = Aligner::new(&template).align(&scan).unwrap();
        assert_eq!(alignment.marks.len(), 3);
        assert!(alignment.mean_residual < 1.0);

        let origin = alignment.map.apply(Pixel::new(100, 100));
        assert_eq!(origin, Pixel::new(100 + shift.0, 100 + shift.1));
    }

    #[test]
    fn test_align_rejects_blank_page() {
        let dir = tempfile::tempdir().unwrap();
        testkit::small_template_dir(dir.path());
        let template = ReferenceTemplate::load(dir.path()).unwrap();

        let blank = GrayImage::from_pixel(300, 300, Luma([255u8]));
        assert!(Aligner::new(&template).align(&blank).is_err());
    }
}
