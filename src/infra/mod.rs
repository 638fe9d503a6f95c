// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting filesystem concerns:
//
//   checkpoint.rs — Saving and loading the classifier artifact.
//                   Weights via Burn's CompactRecorder, the
//                   architecture config and the winning
//                   generation's manifest as JSON.
//
//   metrics.rs    — Appends per-epoch training metrics to a CSV
//                   file for later analysis.
//
//   report.rs     — The batch outputs: annotated questionnaire
//                   images and the aggregated results
//                   spreadsheet.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Classifier artifact saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Annotated images and the results spreadsheet
pub mod report;
