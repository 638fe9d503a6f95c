// ============================================================
// Layer 3 — Box Labels
// ============================================================
// The two classes the network distinguishes. The class indices
// follow the training-data convention: an empty box is encoded
// as class 0 and a crossed box as class 1, so the argmax over
// the two output logits is the label directly.

use serde::{Deserialize, Serialize};

/// The classification label of a single answer box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxLabel {
    Empty,
    Crossed,
}

impl BoxLabel {
    /// The class index used for training targets and logit argmax.
    pub fn class_index(self) -> usize {
        match self {
            BoxLabel::Empty => 0,
            BoxLabel::Crossed => 1,
        }
    }

    /// Inverse of `class_index`. Anything other than 0 or 1 is a
    /// programming error, so this is total over the two classes only.
    pub fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(BoxLabel::Empty),
            1 => Some(BoxLabel::Crossed),
            _ => None,
        }
    }

    pub fn is_crossed(self) -> bool {
        matches!(self, BoxLabel::Crossed)
    }
}

impl std::fmt::Display for BoxLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoxLabel::Empty => write!(f, "empty"),
            BoxLabel::Crossed => write!(f, "crossed"),
        }
    }
}

/// A label together with the softmax probability the classifier
/// assigned to it. Confidence is in [0.5, 1.0] for a two-class
/// argmax decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: BoxLabel,
    pub confidence: f32,
}
