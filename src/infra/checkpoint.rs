// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists the classifier artifact with Burn's CompactRecorder.
//
// Artifact layout:
//   checkpoints/
//     box_net_gen_3.mpk.gz  ← weights of the winning candidate
//     best.json             ← which generation won, and the
//                             hyperparameters + validation
//                             accuracy it was trained with
//     train_config.json     ← full training configuration
//
// The config is saved separately because inference must rebuild
// the exact architecture (input size, hidden size) before the
// weights can be loaded into it. best.json records the training
// hyperparameters as explicit fields — a manifest, not a file
// naming convention.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::BoxNet;

/// The manifest of the winning candidate network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestManifest {
    /// Which candidate generation produced the saved weights
    pub generation:   usize,
    pub batch_size:   usize,
    pub lr:           f64,
    /// Epochs the winning candidate had completed when saved
    pub epochs_run:   usize,
    /// Validation accuracy of the saved weights, in [0, 1]
    pub val_accuracy: f64,
}

/// Manages saving and loading of the classifier artifact.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if
    /// it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Save the weights of one candidate generation together with
    /// the manifest declaring it the current best.
    pub fn save_model<B: AutodiffBackend>(
        &self,
        model:    &BoxNet<B>,
        manifest: &BestManifest,
    ) -> Result<()> {
        // File path without extension — the recorder adds it
        let path = self.dir.join(format!("box_net_gen_{}", manifest.generation));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let manifest_path = self.dir.join("best.json");
        fs::write(&manifest_path, serde_json::to_string_pretty(manifest)?)
            .with_context(|| "Failed to write best.json")?;

        tracing::debug!(
            "Saved checkpoint: generation {} (val_accuracy {:.4})",
            manifest.generation,
            manifest.val_accuracy,
        );
        Ok(())
    }

    /// Load the winning candidate's weights into a freshly built
    /// model of matching architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  BoxNet<B>,
        device: &B::Device,
    ) -> Result<BoxNet<B>> {
        let manifest = self.load_manifest()?;
        let path = self.dir.join(format!("box_net_gen_{}", manifest.generation));

        tracing::info!(
            "Loading classifier from generation {} (val_accuracy {:.4})",
            manifest.generation,
            manifest.val_accuracy,
        );

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the classifier first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Save the training configuration so inference can rebuild
    /// the exact architecture. Called before training starts.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' before 'analyze'.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read best.json. Errors if training hasn't produced a
    /// winning candidate yet.
    pub fn load_manifest(&self) -> Result<BestManifest> {
        let path = self.dir.join("best.json");
        let json = fs::read_to_string(&path)
            .with_context(|| "Cannot find 'best.json'. Have you run 'train' first?")?;
        Ok(serde_json::from_str(&json)?)
    }
}
