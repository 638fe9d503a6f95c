// ============================================================
// Layer 3 — Batch Aggregation
// ============================================================
// Pure accumulation over sheet results: a tally row per
// questionnaire and running totals for the batch. No ordering
// subtlety — one row per analysed input image, appended in
// processing order.

use crate::domain::sheet::SheetResult;

/// The spreadsheet row for one analysed questionnaire.
#[derive(Debug, Clone)]
pub struct SheetTally {
    pub file_name: String,
    pub crossed: usize,
    pub empty: usize,
    /// Crossed option numbers per question, index 0 = question 1
    pub selections: Vec<Vec<usize>>,
}

/// Batch-level counters emitted at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub analysed: usize,
    pub skipped: usize,
    pub crossed: usize,
    pub empty: usize,
}

/// Accumulates sheet results into per-sheet tallies and a batch
/// summary. Sheets whose alignment failed are recorded as skipped
/// and produce no tally row.
#[derive(Debug)]
pub struct Aggregator {
    question_count: usize,
    tallies: Vec<SheetTally>,
    skipped: Vec<String>,
}

impl Aggregator {
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            tallies: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Fold one sheet result into the aggregate.
    pub fn add(&mut self, sheet: &SheetResult) {
        let selections = (1..=self.question_count)
            .map(|q| sheet.crossed_options(q))
            .collect();
        self.tallies.push(SheetTally {
            file_name: sheet.file_name.clone(),
            crossed: sheet.crossed_count(),
            empty: sheet.empty_count(),
            selections,
        });
    }

    /// Record a sheet that could not be aligned.
    pub fn add_skipped(&mut self, file_name: impl Into<String>) {
        self.skipped.push(file_name.into());
    }

    pub fn tallies(&self) -> &[SheetTally] {
        &self.tallies
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            analysed: self.tallies.len(),
            skipped: self.skipped.len(),
            crossed: self.tallies.iter().map(|t| t.crossed).sum(),
            empty: self.tallies.iter().map(|t| t.empty).sum(),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Pixel;
    use crate::domain::label::{BoxLabel, Classification};
    use crate::domain::sample::BoxId;

    // A sheet with 10 defined boxes (2 questions × 5 options) where
    // `crossed` of them are classified as crossed.
    fn sheet_with_crossed(name: &str, crossed: usize) -> SheetResult {
        let mut sheet = SheetResult::new(name, vec![]);
        let mut remaining = crossed;
        for q in 1..=2 {
            for o in 1..=5 {
                let label = if remaining > 0 {
                    remaining -= 1;
                    BoxLabel::Crossed
                } else {
                    BoxLabel::Empty
                };
                sheet.push(
                    BoxId::new(q, o),
                    Pixel::new(0, 0),
                    Classification { label, confidence: 1.0 },
                );
            }
        }
        sheet
    }

    #[test]
    fn test_three_crossed_of_ten_reports_three_and_seven() {
        let mut agg = Aggregator::new(2);
        agg.add(&sheet_with_crossed("page.png", 3));

        let row = &agg.tallies()[0];
        assert_eq!(row.crossed, 3);
        assert_eq!(row.empty, 7);
    }

    #[test]
    fn test_labels_sum_to_template_box_count() {
        let mut agg = Aggregator::new(2);
        for (i, crossed) in [0, 4, 10].into_iter().enumerate() {
            agg.add(&sheet_with_crossed(&format!("s{i}.png"), crossed));
        }
        for tally in agg.tallies() {
            assert_eq!(tally.crossed + tally.empty, 10);
        }
    }

    #[test]
    fn test_summary_totals_and_skip_count() {
        let mut agg = Aggregator::new(2);
        agg.add(&sheet_with_crossed("a.png", 2));
        agg.add(&sheet_with_crossed("b.png", 5));
        agg.add_skipped("blurry.jpg");

        let summary = agg.summary();
        assert_eq!(summary.analysed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.crossed, 7);
        assert_eq!(summary.empty, 13);
    }

    #[test]
    fn test_selections_track_crossed_options() {
        let mut sheet = SheetResult::new("c.png", vec![]);
        sheet.push(
            BoxId::new(1, 3),
            Pixel::new(0, 0),
            Classification { label: BoxLabel::Crossed, confidence: 1.0 },
        );
        sheet.push(
            BoxId::new(2, 1),
            Pixel::new(0, 0),
            Classification { label: BoxLabel::Empty, confidence: 1.0 },
        );

        let mut agg = Aggregator::new(2);
        agg.add(&sheet);
        assert_eq!(agg.tallies()[0].selections, vec![vec![3], vec![]]);
    }
}
