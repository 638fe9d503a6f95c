// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn framework specific code lives in this layer; no other
// layer imports from burn except the data pipeline's Dataset and
// Batcher glue.
//
// What's in this layer:
//
//   model.rs      — The box classifier network: a small
//                   feed-forward net over the flattened
//                   40×40 crop (1600 inputs, one hidden
//                   layer, 2 output classes)
//
//   trainer.rs    — Generational training: several candidate
//                   networks are trained independently and the
//                   one with the best validation accuracy is
//                   kept as the artifact
//
//   classifier.rs — Inference: loads the saved artifact and
//                   labels box samples as crossed or empty
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// The feed-forward box classifier architecture
pub mod model;

/// Generational training loop with validation and checkpointing
pub mod trainer;

/// Inference engine — loads the artifact and classifies samples
pub mod classifier;
