// ============================================================
// Layer 3 — Sheet Result Domain Type
// ============================================================
// The outcome of running one questionnaire scan through the
// pipeline: every template box classified, plus the matched
// reference points kept for the annotated image.

use crate::domain::geometry::Pixel;
use crate::domain::label::{BoxLabel, Classification};
use crate::domain::sample::BoxId;

/// One classified answer box on a sheet.
#[derive(Debug, Clone)]
pub struct ClassifiedBox {
    pub id: BoxId,
    /// Box center in scan coordinates
    pub center: Pixel,
    pub label: BoxLabel,
    pub confidence: f32,
}

/// The full classification result of one questionnaire scan.
#[derive(Debug, Clone)]
pub struct SheetResult {
    /// Image file name with extension, e.g. "sheet_07.png"
    pub file_name: String,

    /// Reference points of significance located on this scan,
    /// in scan coordinates
    pub marks: Vec<Pixel>,

    /// One entry per template box, in template order
    pub boxes: Vec<ClassifiedBox>,
}

impl SheetResult {
    pub fn new(file_name: impl Into<String>, marks: Vec<Pixel>) -> Self {
        Self {
            file_name: file_name.into(),
            marks,
            boxes: Vec::new(),
        }
    }

    pub fn push(&mut self, id: BoxId, center: Pixel, classification: Classification) {
        self.boxes.push(ClassifiedBox {
            id,
            center,
            label: classification.label,
            confidence: classification.confidence,
        });
    }

    pub fn crossed_count(&self) -> usize {
        self.boxes.iter().filter(|b| b.label.is_crossed()).count()
    }

    pub fn empty_count(&self) -> usize {
        self.boxes.len() - self.crossed_count()
    }

    /// The option numbers classified as crossed for one question,
    /// ascending. Questions are 1-based.
    pub fn crossed_options(&self, question: usize) -> Vec<usize> {
        let mut options: Vec<usize> = self
            .boxes
            .iter()
            .filter(|b| b.id.question == question && b.label.is_crossed())
            .map(|b| b.id.option)
            .collect();
        options.sort_unstable();
        options
    }

    /// Centers of all crossed boxes — what the report writer frames in red.
    pub fn crossed_centers(&self) -> Vec<Pixel> {
        self.boxes
            .iter()
            .filter(|b| b.label.is_crossed())
            .map(|b| b.center)
            .collect()
    }
}
