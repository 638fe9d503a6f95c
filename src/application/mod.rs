// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one of the two
// goals: analysing a batch of scans, or training the classifier.
//
// Rules for this layer:
//   - No image math or model code here
//   - No argument parsing or printing of prompts (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// The batch analysis workflow
pub mod analyze_use_case;

// The classifier training workflow
pub mod train_use_case;
