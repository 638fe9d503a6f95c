// ============================================================
// Layer 4 — Box Extractor
// ============================================================
// Cuts one sample per template box out of an aligned scan.
// Deterministic once alignment has succeeded: every box center is
// pushed through the affine map, a square of CROP_RADIUS is cut
// around it, resized to SAMPLE_SIDE × SAMPLE_SIDE, and the
// grayscale values are scaled into [0, 1] — the exact form the
// network was trained on.

use anyhow::{Context, Result};
use image::{imageops, GrayImage};

use crate::data::template::{crop_centered, ReferenceTemplate, CROP_RADIUS, SAMPLE_SIDE};
use crate::domain::geometry::AffineMap;
use crate::domain::sample::BoxSample;

pub struct BoxExtractor<'a> {
    template: &'a ReferenceTemplate,
}

impl<'a> BoxExtractor<'a> {
    pub fn new(template: &'a ReferenceTemplate) -> Self {
        Self { template }
    }

    /// Extract every box sample from one aligned scan, in template
    /// order. The sample count always equals the template box count.
    pub fn extract(&self, scan: &GrayImage, map: &AffineMap) -> Result<Vec<BoxSample>> {
        let mut samples = Vec::with_capacity(self.template.box_count());

        for (id, template_center) in self.template.iter_boxes() {
            let center = map.apply(template_center);
            let (crop, _, _) = crop_centered(scan, center, CROP_RADIUS)
                .with_context(|| format!("Box {} maps outside the scan", id))?;
            let pixels = normalize(&imageops::resize(
                &crop,
                SAMPLE_SIDE,
                SAMPLE_SIDE,
                imageops::FilterType::Triangle,
            ));
            samples.push(BoxSample::new(id, center, pixels));
        }

        Ok(samples)
    }
}

/// Flatten a grayscale image row-major into [0, 1] floats.
/// 255 (white paper) maps to 1.0, 0 (ink) to 0.0.
pub fn normalize(image: &GrayImage) -> Vec<f32> {
    image.pixels().map(|p| p.0[0] as f32 / 255.0).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::template::testkit;
    use crate::domain::geometry::Pixel;
    use image::Luma;

    fn load_small_template(dir: &std::path::Path) -> ReferenceTemplate {
        testkit::small_template_dir(dir);
        ReferenceTemplate::load(dir).unwrap()
    }

    fn identity() -> AffineMap {
        AffineMap { a: [1.0, 0.0, 0.0, 1.0], b: [0.0, 0.0] }
    }

    #[test]
    fn test_one_sample_per_template_box() {
        let dir = tempfile::tempdir().unwrap();
        let template = load_small_template(dir.path());
        let scan = GrayImage::from_pixel(300, 300, Luma([255u8]));

        let samples = BoxExtractor::new(&template)
            .extract(&scan, &identity())
            .unwrap();

        assert_eq!(samples.len(), template.box_count());
        for sample in &samples {
            assert_eq!(sample.pixels.len(), (SAMPLE_SIDE * SAMPLE_SIDE) as usize);
        }
    }

    #[test]
    fn test_centers_follow_the_transform() {
        let dir = tempfile::tempdir().unwrap();
        let template = load_small_template(dir.path());
        let scan = GrayImage::from_pixel(400, 400, Luma([255u8]));
        let map = AffineMap { a: [1.0, 0.0, 0.0, 1.0], b: [15.0, -10.0] };

        let samples = BoxExtractor::new(&template).extract(&scan, &map).unwrap();
        let expected: Vec<Pixel> = template.iter_boxes().map(|(_, c)| map.apply(c)).collect();
        let actual: Vec<Pixel> = samples.iter().map(|s| s.center).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_normalization_is_unit_range() {
        let dir = tempfile::tempdir().unwrap();
        let template = load_small_template(dir.path());
        // Blacken one box region entirely; the rest stays white.
        let mut scan = GrayImage::from_pixel(300, 300, Luma([255u8]));
        let (id, center) = template.iter_boxes().next().unwrap();
        assert_eq!(id.to_string(), "q1o1");
        for dy in -20..=20 {
            for dx in -20..=20 {
                scan.put_pixel((center.x + dx) as u32, (center.y + dy) as u32, Luma([0u8]));
            }
        }

        let samples = BoxExtractor::new(&template)
            .extract(&scan, &identity())
            .unwrap();

        // The inked box averages dark, the others stay white.
        let mean = |s: &BoxSample| s.pixels.iter().sum::<f32>() / s.pixels.len() as f32;
        assert!(mean(&samples[0]) < 0.6);
        assert!(mean(&samples[1]) > 0.99);
        for sample in &samples {
            assert!(sample.pixels.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }
}
