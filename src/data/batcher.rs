// ============================================================
// Layer 4 — Box Batcher
// ============================================================
// Implements Burn's Batcher trait to stack individual labelled
// samples into one tensor batch:
//
//   Input:  Vec of N LabeledSamples, each with D pixel values
//   Output: BoxBatch with images [N, D] and targets [N]
//
// All samples are normalized to the same size upstream, so the
// flatten-then-reshape stacking never needs padding.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::LabeledSample;

/// A batch of labelled box crops ready for the forward pass.
/// B is the Burn backend — generic so the same batcher serves
/// training (autodiff) and validation (plain) passes.
#[derive(Debug, Clone)]
pub struct BoxBatch<B: Backend> {
    /// Normalized pixel values — shape: [batch_size, input_size]
    pub images: Tensor<B, 2>,

    /// Class indices (0 = empty, 1 = crossed) — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Holds the target device so tensors land where the model runs.
#[derive(Clone, Debug)]
pub struct BoxBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> BoxBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<LabeledSample, BoxBatch<B>> for BoxBatcher<B> {
    fn batch(&self, items: Vec<LabeledSample>) -> BoxBatch<B> {
        let batch_size = items.len();
        // All samples share one size (resized on load)
        let input_size = items[0].pixels.len();

        let image_flat: Vec<f32> = items.iter().flat_map(|s| s.pixels.iter().copied()).collect();

        let targets_flat: Vec<i32> = items.iter().map(|s| s.class as i32).collect();

        let images = Tensor::<B, 1>::from_floats(image_flat.as_slice(), &self.device)
            .reshape([batch_size, input_size]);

        let targets = Tensor::<B, 1, Int>::from_ints(targets_flat.as_slice(), &self.device);

        BoxBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_batch_shapes() {
        let device = Default::default();
        let batcher = BoxBatcher::<TestBackend>::new(device);

        let items = vec![
            LabeledSample { pixels: vec![0.0; 16], class: 0 },
            LabeledSample { pixels: vec![0.5; 16], class: 1 },
            LabeledSample { pixels: vec![1.0; 16], class: 1 },
        ];
        let batch = batcher.batch(items);

        assert_eq!(batch.images.dims(), [3, 16]);
        assert_eq!(batch.targets.dims(), [3]);
    }
}
