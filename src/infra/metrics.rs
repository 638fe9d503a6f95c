// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per training epoch, covering every
// candidate generation of a run, so learning curves can be
// plotted and compared after the fact.
//
// Output file: checkpoints/metrics.csv
//
// Example:
//   generation,epoch,train_loss,val_loss,val_acc
//   1,1,0.652110,0.534902,0.812000
//   1,2,0.401238,0.322019,0.934000
//   ...

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

/// Metrics of one epoch of one candidate generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub generation: usize,
    pub epoch:      usize,

    /// Average cross-entropy loss over the training batches
    pub train_loss: f64,

    /// Average cross-entropy loss on the held-out validation crops
    pub val_loss:   f64,

    /// Fraction of validation crops labelled correctly, in [0, 1]
    pub val_acc:    f64,
}

impl EpochMetrics {
    pub fn new(
        generation: usize,
        epoch:      usize,
        train_loss: f64,
        val_loss:   f64,
        val_acc:    f64,
    ) -> Self {
        Self { generation, epoch, train_loss, val_loss, val_acc }
    }

    /// True if this epoch beats the given best validation accuracy.
    /// Candidate selection keeps the most accurate network, so the
    /// comparison is on accuracy, not loss.
    pub fn is_improvement(&self, best_val_acc: f64) -> bool {
        self.val_acc > best_val_acc
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the CSV header if the file does
    /// not exist yet (appending keeps earlier runs readable).
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "generation,epoch,train_loss,val_loss,val_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6}",
            m.generation, m.epoch, m.train_loss, m.val_loss, m.val_acc,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
