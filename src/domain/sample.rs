// ============================================================
// Layer 3 — Box Sample Domain Type
// ============================================================
// One cropped answer box, cut out of an aligned scan and
// normalized into the exact form the network consumes.
// The box identifier ties the sample back to the template:
// every sample maps to exactly one template-defined box, and
// box identifiers are stable across all questionnaires in a
// batch because they all share the same template.

use serde::{Deserialize, Serialize};

use crate::domain::geometry::Pixel;

/// Stable identifier of one answer box on the template.
///
/// Question and option numbers are 1-based, matching how the
/// questionnaire itself is printed and how the spreadsheet
/// columns are headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoxId {
    pub question: usize,
    pub option: usize,
}

impl BoxId {
    pub fn new(question: usize, option: usize) -> Self {
        Self { question, option }
    }
}

impl std::fmt::Display for BoxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}o{}", self.question, self.option)
    }
}

/// A cropped, resized, normalized answer-box image.
///
/// `pixels` holds side × side grayscale values scaled into
/// [0.0, 1.0], row-major — ready to be flattened into the
/// network's input layer without further processing.
#[derive(Debug, Clone)]
pub struct BoxSample {
    /// Which template box this sample was cut from
    pub id: BoxId,

    /// The box center in scan coordinates (after alignment),
    /// kept so the report writer can annotate the original image
    pub center: Pixel,

    /// Normalized grayscale pixel values, row-major
    pub pixels: Vec<f32>,
}

impl BoxSample {
    pub fn new(id: BoxId, center: Pixel, pixels: Vec<f32>) -> Self {
        Self { id, center, pixels }
    }
}
