// ============================================================
// Layer 4 — Reference Template
// ============================================================
// The fixed description of the reference questionnaire that every
// scan in a batch is matched against. A template directory holds:
//
//   template/
//     layout.json     ← versioned layout: marks + box-center grid
//     reference.png   ← the reference page the layout refers to
//
// From the reference image, one binarized mask is cut out around
// each reference point of significance. The aligner later searches
// each scan for these masks to recover the page distortion.
//
// The template is immutable and loaded once per run.

use anyhow::{bail, Context, Result};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::domain::geometry::Pixel;
use crate::domain::sample::BoxId;

/// Radius of the mask cut around a reference point, excluding the
/// point itself: the mask is a (2·20+1)² = 41×41 square.
pub const MARK_RADIUS: u32 = 20;

/// Radius of the crop cut around a box center: 61×61 before resizing.
pub const CROP_RADIUS: u32 = 30;

/// Side length of a box sample after resizing. The network input
/// layer has SAMPLE_SIDE² units.
pub const SAMPLE_SIDE: u32 = 40;

/// Grayscale threshold of the edge filter: values below it become
/// mark (foreground), values at or above it become background.
pub const EDGE_THRESHOLD: u8 = 200;

/// Layout file schema version this build reads.
pub const LAYOUT_VERSION: u32 = 1;

// ─── Layout file ──────────────────────────────────────────────────────────────
/// The on-disk schema of `layout.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateLayout {
    /// Schema version; bumped on incompatible changes
    pub version: u32,

    /// File name of the reference page image, relative to the
    /// template directory
    pub reference_image: String,

    /// Reference points of significance, in template coordinates
    pub marks: Vec<Pixel>,

    /// Box centers: one row per question, one entry per option
    pub boxes: Vec<Vec<Pixel>>,
}

impl TemplateLayout {
    fn validate(&self) -> Result<()> {
        if self.version != LAYOUT_VERSION {
            bail!(
                "Unsupported layout version {} (this build reads version {})",
                self.version,
                LAYOUT_VERSION,
            );
        }
        // Three point correspondences determine an affine map; fewer
        // marks could never align a page.
        if self.marks.len() < 3 {
            bail!("Layout defines {} reference mark(s); at least 3 are required", self.marks.len());
        }
        if self.boxes.is_empty() {
            bail!("Layout defines no answer boxes");
        }
        let options = self.boxes[0].len();
        if options == 0 {
            bail!("Layout defines a question with no options");
        }
        if let Some(row) = self.boxes.iter().find(|row| row.len() != options) {
            bail!(
                "Every question must have the same number of options ({} expected, {} found)",
                options,
                row.len(),
            );
        }
        Ok(())
    }
}

// ─── ReferenceTemplate ────────────────────────────────────────────────────────
/// The loaded template: layout plus the mark masks generated from
/// the reference image.
pub struct ReferenceTemplate {
    layout: TemplateLayout,
    masks: Vec<GrayImage>,
}

impl ReferenceTemplate {
    /// Load a template directory: parse and validate the layout,
    /// open the reference image, and cut one binarized mask per
    /// reference mark.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let layout_path = dir.join("layout.json");

        let json = fs::read_to_string(&layout_path)
            .with_context(|| format!("Cannot read template layout '{}'", layout_path.display()))?;
        let layout: TemplateLayout = serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse template layout '{}'", layout_path.display()))?;
        layout.validate()?;

        let image_path = dir.join(&layout.reference_image);
        let reference = image::open(&image_path)
            .with_context(|| format!("Cannot open reference image '{}'", image_path.display()))?
            .to_luma8();

        let mut masks = Vec::with_capacity(layout.marks.len());
        for mark in &layout.marks {
            let (patch, _, _) = crop_centered(&reference, *mark, MARK_RADIUS).with_context(|| {
                format!("Reference mark {} lies outside the reference image", mark)
            })?;
            masks.push(binarize(&patch, EDGE_THRESHOLD));
        }

        tracing::debug!(
            "Template loaded: {} marks, {} questions × {} options",
            layout.marks.len(),
            layout.boxes.len(),
            layout.boxes[0].len(),
        );

        Ok(Self { layout, masks })
    }

    pub fn question_count(&self) -> usize {
        self.layout.boxes.len()
    }

    pub fn option_count(&self) -> usize {
        self.layout.boxes[0].len()
    }

    pub fn box_count(&self) -> usize {
        self.question_count() * self.option_count()
    }

    /// Reference points of significance, in template coordinates.
    pub fn marks(&self) -> &[Pixel] {
        &self.layout.marks
    }

    /// The binarized mask belonging to `marks()[index]`.
    pub fn mask(&self, index: usize) -> &GrayImage {
        &self.masks[index]
    }

    /// Iterate over every box with its stable identifier, question
    /// by question, option by option.
    pub fn iter_boxes(&self) -> impl Iterator<Item = (BoxId, Pixel)> + '_ {
        self.layout.boxes.iter().enumerate().flat_map(|(q, row)| {
            row.iter()
                .enumerate()
                .map(move |(o, center)| (BoxId::new(q + 1, o + 1), *center))
        })
    }
}

// ─── Shared image helpers ─────────────────────────────────────────────────────
// Cropping and binarization are used by the template (mask
// generation), the aligner (search windows) and the extractor
// (box crops), always with the same semantics.

/// Cut a (2·radius+1)² square around `center`, clamped so the crop
/// stays inside the image. Returns the crop plus the top-left
/// corner it was cut at, which callers need to map positions found
/// inside the crop back into image coordinates.
pub(crate) fn crop_centered(
    image: &GrayImage,
    center: Pixel,
    radius: u32,
) -> Result<(GrayImage, u32, u32)> {
    let side = 2 * radius + 1;
    if image.width() < side || image.height() < side {
        bail!(
            "Image {}×{} is smaller than a {}×{} crop",
            image.width(),
            image.height(),
            side,
            side,
        );
    }
    let max_x = image.width() - side;
    let max_y = image.height() - side;
    let x0 = (center.x - radius as i32).clamp(0, max_x as i32) as u32;
    let y0 = (center.y - radius as i32).clamp(0, max_y as i32) as u32;
    let crop = image::imageops::crop_imm(image, x0, y0, side, side).to_image();
    Ok((crop, x0, y0))
}

/// The edge filter: pixels darker than the threshold become
/// foreground (255), everything else background (0). Both the mark
/// masks and the scan search windows pass through this filter, so
/// matching compares ink against ink rather than paper shades.
pub(crate) fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] < threshold { 255 } else { 0 };
    }
    out
}

// ─── Test fixtures ────────────────────────────────────────────────────────────
// Builds a small synthetic template directory on disk: a white
// reference page with solid dark squares at the mark positions.
// Shared by the aligner and extractor tests.
#[cfg(test)]
pub(crate) mod testkit {
    use super::*;
    use image::Luma;

    pub const TEST_MARK_HALF: i32 = 6;

    /// Paint a solid dark square of half-width TEST_MARK_HALF at each
    /// given position.
    pub fn paint_marks(page: &mut GrayImage, marks: &[Pixel]) {
        for mark in marks {
            for dy in -TEST_MARK_HALF..=TEST_MARK_HALF {
                for dx in -TEST_MARK_HALF..=TEST_MARK_HALF {
                    let x = mark.x + dx;
                    let y = mark.y + dy;
                    if x >= 0 && y >= 0 && (x as u32) < page.width() && (y as u32) < page.height() {
                        page.put_pixel(x as u32, y as u32, Luma([0u8]));
                    }
                }
            }
        }
    }

    /// Write `layout.json` and `reference.png` into `dir`.
    pub fn write_template_dir(
        dir: &Path,
        page_size: (u32, u32),
        marks: Vec<Pixel>,
        boxes: Vec<Vec<Pixel>>,
    ) {
        let mut page = GrayImage::from_pixel(page_size.0, page_size.1, Luma([255u8]));
        paint_marks(&mut page, &marks);
        page.save(dir.join("reference.png")).unwrap();

        let layout = TemplateLayout {
            version: LAYOUT_VERSION,
            reference_image: "reference.png".to_string(),
            marks,
            boxes,
        };
        std::fs::write(
            dir.join("layout.json"),
            serde_json::to_string_pretty(&layout).unwrap(),
        )
        .unwrap();
    }

    /// A 3-mark, 2-question × 2-option template on a 300×300 page.
    pub fn small_template_dir(dir: &Path) {
        write_template_dir(
            dir,
            (300, 300),
            vec![Pixel::new(40, 40), Pixel::new(260, 40), Pixel::new(40, 260)],
            vec![
                vec![Pixel::new(100, 120), Pixel::new(180, 120)],
                vec![Pixel::new(100, 200), Pixel::new(180, 200)],
            ],
        );
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_load_small_template() {
        let dir = tempfile::tempdir().unwrap();
        testkit::small_template_dir(dir.path());

        let template = ReferenceTemplate::load(dir.path()).unwrap();
        assert_eq!(template.question_count(), 2);
        assert_eq!(template.option_count(), 2);
        assert_eq!(template.box_count(), 4);
        assert_eq!(template.marks().len(), 3);

        let mask = template.mask(0);
        assert_eq!(mask.dimensions(), (2 * MARK_RADIUS + 1, 2 * MARK_RADIUS + 1));
        // The painted mark must survive binarization as foreground.
        assert!(mask.pixels().any(|p| p.0[0] == 255));
    }

    #[test]
    fn test_iter_boxes_yields_stable_one_based_ids() {
        let dir = tempfile::tempdir().unwrap();
        testkit::small_template_dir(dir.path());
        let template = ReferenceTemplate::load(dir.path()).unwrap();

        let ids: Vec<String> = template.iter_boxes().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["q1o1", "q1o2", "q2o1", "q2o2"]);
    }

    #[test]
    fn test_ragged_box_grid_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        testkit::write_template_dir(
            dir.path(),
            (300, 300),
            vec![Pixel::new(40, 40), Pixel::new(260, 40), Pixel::new(40, 260)],
            vec![vec![Pixel::new(100, 120)], vec![Pixel::new(100, 200), Pixel::new(180, 200)]],
        );
        assert!(ReferenceTemplate::load(dir.path()).is_err());
    }

    #[test]
    fn test_too_few_marks_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        testkit::write_template_dir(
            dir.path(),
            (300, 300),
            vec![Pixel::new(40, 40), Pixel::new(260, 40)],
            vec![vec![Pixel::new(100, 120)]],
        );
        assert!(ReferenceTemplate::load(dir.path()).is_err());
    }

    #[test]
    fn test_wrong_layout_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        testkit::small_template_dir(dir.path());
        // Rewrite the layout with a future version number.
        let json = fs::read_to_string(dir.path().join("layout.json")).unwrap();
        let mut layout: TemplateLayout = serde_json::from_str(&json).unwrap();
        layout.version = LAYOUT_VERSION + 1;
        fs::write(
            dir.path().join("layout.json"),
            serde_json::to_string(&layout).unwrap(),
        )
        .unwrap();
        assert!(ReferenceTemplate::load(dir.path()).is_err());
    }

    #[test]
    fn test_crop_centered_clamps_at_borders() {
        let image = GrayImage::from_pixel(100, 100, Luma([255u8]));
        let (crop, x0, y0) = crop_centered(&image, Pixel::new(0, 0), 10).unwrap();
        assert_eq!(crop.dimensions(), (21, 21));
        assert_eq!((x0, y0), (0, 0));

        let (crop, x0, y0) = crop_centered(&image, Pixel::new(99, 99), 10).unwrap();
        assert_eq!(crop.dimensions(), (21, 21));
        assert_eq!((x0, y0), (79, 79));
    }

    #[test]
    fn test_binarize_separates_ink_from_paper() {
        let mut image = GrayImage::from_pixel(4, 1, Luma([255u8]));
        image.put_pixel(0, 0, Luma([0u8]));
        image.put_pixel(1, 0, Luma([EDGE_THRESHOLD - 1]));
        image.put_pixel(2, 0, Luma([EDGE_THRESHOLD]));

        let out = binarize(&image, EDGE_THRESHOLD);
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
        assert_eq!(out.get_pixel(2, 0).0[0], 0);
        assert_eq!(out.get_pixel(3, 0).0[0], 0);
    }
}
