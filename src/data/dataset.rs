// ============================================================
// Layer 4 — Training Dataset
// ============================================================
// Labelled box crops for the training utility. The label comes
// from the folder a crop lives in: one folder of crossed boxes,
// one folder of empty boxes. Every crop goes through the same
// resize-and-normalize path the extractor applies at analysis
// time, so training and inference see identical inputs.

use anyhow::{bail, Context, Result};
use burn::data::dataset::Dataset;
use std::{fs, path::Path};

use crate::data::extractor::normalize;
use crate::data::template::SAMPLE_SIDE;
use crate::domain::label::BoxLabel;

/// Training crops are shipped as .png files.
const TRAINING_EXTENSION: &str = "png";

/// One labelled, normalized training sample.
#[derive(Debug, Clone)]
pub struct LabeledSample {
    /// SAMPLE_SIDE² grayscale values in [0, 1], row-major
    pub pixels: Vec<f32>,

    /// Class index: 0 = empty, 1 = crossed
    pub class: usize,
}

/// All labelled samples of a training run.
/// Implements Burn's Dataset trait so the DataLoader can call
/// .get(index) and .len() on it.
pub struct BoxDataset {
    samples: Vec<LabeledSample>,
}

impl BoxDataset {
    pub fn new(samples: Vec<LabeledSample>) -> Self {
        Self { samples }
    }
}

impl Dataset<LabeledSample> for BoxDataset {
    fn get(&self, index: usize) -> Option<LabeledSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Load both labelled folders. Unreadable files are skipped with a
/// warning; a folder contributing zero samples is an error because
/// a one-class training set cannot train a two-class network.
pub fn load_labeled_folders(crossed_dir: &str, empty_dir: &str) -> Result<Vec<LabeledSample>> {
    let mut samples = load_folder(crossed_dir, BoxLabel::Crossed)?;
    let crossed_count = samples.len();
    samples.extend(load_folder(empty_dir, BoxLabel::Empty)?);

    tracing::info!(
        "Loaded {} crossed and {} empty training crops",
        crossed_count,
        samples.len() - crossed_count,
    );
    Ok(samples)
}

fn load_folder(dir: &str, label: BoxLabel) -> Result<Vec<LabeledSample>> {
    let mut samples = Vec::new();

    for entry in fs::read_dir(Path::new(dir))
        .with_context(|| format!("Cannot read training folder '{dir}'"))?
    {
        let path = entry?.path();
        let is_crop = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(TRAINING_EXTENSION))
            .unwrap_or(false);
        if !is_crop {
            continue;
        }

        match image::open(&path) {
            Ok(img) => {
                // Crops are produced at SAMPLE_SIDE already; resizing
                // here keeps stray sizes from poisoning the tensor shape.
                let gray = image::imageops::resize(
                    &img.to_luma8(),
                    SAMPLE_SIDE,
                    SAMPLE_SIDE,
                    image::imageops::FilterType::Triangle,
                );
                samples.push(LabeledSample {
                    pixels: normalize(&gray),
                    class: label.class_index(),
                });
            }
            Err(e) => {
                tracing::warn!("Skipping '{}': {}", path.display(), e);
            }
        }
    }

    if samples.is_empty() {
        bail!("Training folder '{dir}' contains no readable .{TRAINING_EXTENSION} crops");
    }
    Ok(samples)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn write_crop(dir: &Path, name: &str, value: u8) {
        GrayImage::from_pixel(SAMPLE_SIDE, SAMPLE_SIDE, Luma([value]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_class_comes_from_the_folder() {
        let crossed = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        write_crop(crossed.path(), "a.png", 0);
        write_crop(crossed.path(), "b.png", 10);
        write_crop(empty.path(), "c.png", 250);

        let samples = load_labeled_folders(
            crossed.path().to_str().unwrap(),
            empty.path().to_str().unwrap(),
        )
        .unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples.iter().filter(|s| s.class == 1).count(), 2);
        assert_eq!(samples.iter().filter(|s| s.class == 0).count(), 1);
    }

    #[test]
    fn test_oddly_sized_crops_are_resized() {
        let crossed = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        GrayImage::from_pixel(61, 61, Luma([0]))
            .save(crossed.path().join("raw.png"))
            .unwrap();
        write_crop(empty.path(), "e.png", 255);

        let samples = load_labeled_folders(
            crossed.path().to_str().unwrap(),
            empty.path().to_str().unwrap(),
        )
        .unwrap();
        for sample in &samples {
            assert_eq!(sample.pixels.len(), (SAMPLE_SIDE * SAMPLE_SIDE) as usize);
        }
    }

    #[test]
    fn test_one_class_training_set_is_rejected() {
        let crossed = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        write_crop(crossed.path(), "a.png", 0);
        // empty_dir holds no crops at all

        assert!(load_labeled_folders(
            crossed.path().to_str().unwrap(),
            empty.path().to_str().unwrap(),
        )
        .is_err());
    }

    #[test]
    fn test_dataset_exposes_len_and_get() {
        let samples = vec![
            LabeledSample { pixels: vec![0.0; 4], class: 0 },
            LabeledSample { pixels: vec![1.0; 4], class: 1 },
        ];
        let dataset = BoxDataset::new(samples);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get(1).unwrap().class, 1);
        assert!(dataset.get(2).is_none());
    }
}
