// ============================================================
// Layer 5 — Classifier (Inference)
// ============================================================
// Loads the trained artifact and labels box samples. The model
// is rebuilt from the saved training config before the weights
// are loaded into it, then run with dropout disabled on the
// plain CPU backend — the same inputs always produce the same
// labels.

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::application::train_use_case::TrainConfig;
use crate::data::template::SAMPLE_SIDE;
use crate::domain::label::{BoxLabel, Classification};
use crate::domain::sample::BoxSample;
use crate::domain::traits::BoxClassifier;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{BoxNet, BoxNetConfig};

type InferBackend = burn::backend::NdArray;

pub struct Classifier {
    model:      BoxNet<InferBackend>,
    input_size: usize,
    device:     burn::backend::ndarray::NdArrayDevice,
}

impl Classifier {
    /// Rebuild the network from the saved config and load the
    /// winning generation's weights into it.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device = burn::backend::ndarray::NdArrayDevice::default();
        let cfg: TrainConfig = ckpt_manager.load_config()?;
        let input_size = (SAMPLE_SIDE * SAMPLE_SIDE) as usize;

        // Dropout 0.0: inference never drops activations
        let model_cfg = BoxNetConfig::new(input_size, cfg.hidden_size, 2, 0.0);
        let model: BoxNet<InferBackend> = model_cfg.init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Classifier loaded from checkpoint");

        Ok(Self { model, input_size, device })
    }
}

impl BoxClassifier for Classifier {
    fn classify(&self, sample: &BoxSample) -> Result<Classification> {
        if sample.pixels.len() != self.input_size {
            bail!(
                "Box sample {} has {} pixels; the network expects {}",
                sample.id,
                sample.pixels.len(),
                self.input_size,
            );
        }

        let input = Tensor::<InferBackend, 1>::from_floats(
            sample.pixels.as_slice(), &self.device,
        ).reshape([1, self.input_size]);

        let logits = self.model.forward(input);
        let probs: Vec<f32> = burn::tensor::activation::softmax(logits, 1)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read class probabilities: {e:?}"))?;

        // probs = [p_empty, p_crossed]; the argmax is the label and
        // its probability the confidence
        let (class, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));

        let label = BoxLabel::from_class_index(class)
            .ok_or_else(|| anyhow::anyhow!("Network produced unknown class index {class}"))?;

        tracing::debug!("{} → {} ({:.4})", sample.id, label, confidence);
        Ok(Classification { label, confidence })
    }
}
