// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the classifier training pipeline in order:
//
//   Step 1: Load labelled crops       (Layer 4 - data)
//   Step 2: Shuffle + split 75/25     (Layer 4 - data)
//   Step 3: Build datasets            (Layer 4 - data)
//   Step 4: Save config               (Layer 6 - infra)
//   Step 5: Generational training     (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::load_labeled_folders,
    dataset::BoxDataset,
    splitter::split_train_val,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::MetricsLogger;
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters of a training run. Serialisable so it can be
// saved next to the artifact and reloaded for inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub crossed_dir:     String,
    pub empty_dir:       String,
    pub checkpoint_dir:  String,
    pub hidden_size:     usize,
    pub dropout:         f64,
    pub batch_size:      usize,
    pub epochs:          usize,
    /// How many independently initialized candidates to train
    pub generations:     usize,
    pub lr:              f64,
    /// Share of the crops used for training; the rest validates
    pub train_fraction:  f64,
    /// Validation accuracy at which candidate selection stops
    pub target_accuracy: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            crossed_dir:     "data/crossed".to_string(),
            empty_dir:       "data/empty".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            hidden_size:     32,
            dropout:         0.1,
            batch_size:      50,
            epochs:          40,
            generations:     5,
            lr:              1e-3,
            train_fraction:  0.75,
            target_accuracy: 0.999,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load labelled crops ───────────────────────────────────────
        tracing::info!(
            "Loading training crops from '{}' (crossed) and '{}' (empty)",
            cfg.crossed_dir,
            cfg.empty_dir,
        );
        let samples = load_labeled_folders(&cfg.crossed_dir, &cfg.empty_dir)?;

        // ── Step 2: Shuffle and split ─────────────────────────────────────────
        // The crops arrive grouped by class, so the split must shuffle
        let (train_samples, val_samples) = split_train_val(samples, cfg.train_fraction);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len(),
        );

        // ── Step 3: Build Burn datasets ───────────────────────────────────────
        let train_dataset = BoxDataset::new(train_samples);
        let val_dataset   = BoxDataset::new(val_samples);

        // ── Step 4: Save config for inference ─────────────────────────────────
        // The classifier rebuilds the architecture from this file
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        tracing::debug!("Epoch metrics go to '{}'", metrics.csv_path().display());

        // ── Step 5: Generational training (Layer 5) ───────────────────────────
        let best = run_training(cfg, train_dataset, val_dataset, ckpt_manager, metrics)?;

        println!(
            "Selection finished: generation {} after {} epoch(s), validation accuracy {:.2}%",
            best.generation,
            best.epochs_run,
            best.val_accuracy * 100.0,
        );
        Ok(())
    }
}
