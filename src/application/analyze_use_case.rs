// ============================================================
// Layer 2 — AnalyzeUseCase
// ============================================================
// Orchestrates the batch analysis pipeline. Setup happens once:
//
//   Step 1: Load reference template    (Layer 4 - data)
//   Step 2: Enumerate scans            (Layer 4 - data)
//   Step 3: Load classifier            (Layer 5 - ml)
//
// then every scan flows through the same linear chain:
//
//   decode → align → extract boxes → classify each box
//          → aggregate → annotated image
//
// and the run ends with the spreadsheet. A scan that cannot be
// decoded or aligned is skipped with a warning and counted; the
// batch never dies on one bad page. Every successfully analysed
// scan produces exactly one annotated image and one spreadsheet
// row.

use anyhow::Result;

use crate::data::{
    aligner::Aligner,
    extractor::BoxExtractor,
    loader::{load_gray, ScanDirectory},
    template::ReferenceTemplate,
};
use crate::domain::aggregate::{Aggregator, BatchSummary};
use crate::domain::sheet::SheetResult;
use crate::domain::traits::{BoxClassifier, ScanSource};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::report::ReportWriter;
use crate::ml::classifier::Classifier;

// ─── Analysis Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    pub input_dir:      String,
    pub output_dir:     String,
    pub template_dir:   String,
    pub checkpoint_dir: String,
}

// ─── AnalyzeUseCase ───────────────────────────────────────────────────────────
pub struct AnalyzeUseCase {
    config: AnalyzeConfig,
}

impl AnalyzeUseCase {
    pub fn new(config: AnalyzeConfig) -> Self {
        Self { config }
    }

    /// Execute the full analysis pipeline end to end.
    pub fn execute(&self) -> Result<BatchSummary> {
        let cfg = &self.config;

        // ── Step 1: Load the reference template ───────────────────────────────
        tracing::info!("Loading reference template from '{}'", cfg.template_dir);
        let template = ReferenceTemplate::load(&cfg.template_dir)?;
        tracing::info!(
            "Template: {} questions × {} options, {} reference marks",
            template.question_count(),
            template.option_count(),
            template.marks().len(),
        );

        // ── Step 2: Enumerate the scans ───────────────────────────────────────
        let source = ScanDirectory::new(&cfg.input_dir);
        let scan_paths = source.scan_paths()?;

        // ── Step 3: Load the classifier ───────────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        let classifier = Classifier::from_checkpoint(&ckpt_manager)?;

        let aligner = Aligner::new(&template);
        let extractor = BoxExtractor::new(&template);
        let report = ReportWriter::new(&cfg.output_dir)?;
        let mut aggregate = Aggregator::new(template.question_count());

        // ── Step 4: Process every scan in order ───────────────────────────────
        let total = scan_paths.len();
        for (index, path) in scan_paths.iter().enumerate() {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            println!("[{}/{}] {}", index + 1, total, file_name);

            let scan = match load_gray(path) {
                Ok(scan) => scan,
                Err(e) => {
                    tracing::warn!("Skipping '{}': {}", path.display(), e);
                    aggregate.add_skipped(file_name);
                    continue;
                }
            };

            // Alignment failure flags the sheet, never the batch
            let alignment = match aligner.align(&scan) {
                Ok(alignment) => alignment,
                Err(e) => {
                    tracing::warn!("Skipping '{}': {}", path.display(), e);
                    aggregate.add_skipped(file_name);
                    continue;
                }
            };
            tracing::debug!(
                "'{}' aligned: {} marks, {:.2} px mean residual",
                file_name,
                alignment.marks.len(),
                alignment.mean_residual,
            );

            let samples = extractor.extract(&scan, &alignment.map)?;

            let mut sheet = SheetResult::new(file_name, alignment.marks);
            for sample in &samples {
                let classification = classifier.classify(sample)?;
                sheet.push(sample.id, sample.center, classification);
            }
            tracing::info!(
                "'{}': {} crossed, {} empty",
                sheet.file_name,
                sheet.crossed_count(),
                sheet.empty_count(),
            );

            report.write_annotated_image(path, &sheet)?;
            aggregate.add(&sheet);
        }

        // ── Step 5: Write the spreadsheet ─────────────────────────────────────
        report.write_spreadsheet(&aggregate)?;

        let summary = aggregate.summary();
        tracing::info!(
            "Batch done: {} analysed, {} skipped, {} crossed / {} empty boxes",
            summary.analysed,
            summary.skipped,
            summary.crossed,
            summary.empty,
        );
        Ok(summary)
    }
}
