// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two seams of the pipeline, expressed as traits so the
// application layer depends on behaviour, not on concrete
// implementations.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use std::path::PathBuf;

use crate::domain::label::Classification;
use crate::domain::sample::BoxSample;

// ─── ScanSource ───────────────────────────────────────────────────────────────
/// Any component that can enumerate questionnaire scans to analyse.
///
/// Implementations:
///   - ScanDirectory → a folder of image files
pub trait ScanSource {
    /// All scan file paths this source provides, in a stable order.
    /// An empty source is an error — a batch with nothing to do
    /// points at a mistyped path, not a valid run.
    fn scan_paths(&self) -> Result<Vec<PathBuf>>;
}

// ─── BoxClassifier ────────────────────────────────────────────────────────────
/// Any component that can label a cropped answer-box sample.
///
/// Implementations:
///   - Classifier → the trained feed-forward network
pub trait BoxClassifier {
    /// Label one sample as crossed or empty, with a confidence score.
    fn classify(&self, sample: &BoxSample) -> Result<Classification>;
}
