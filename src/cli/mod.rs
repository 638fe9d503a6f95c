// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Uses the `clap` crate to
// parse command line arguments; all business logic is delegated
// to Layer 2 (application).
//
// Two commands are supported:
//   1. `analyze` — runs the batch pipeline over a scan folder
//   2. `train`   — trains the box classifier on labelled crops
//
// The analyse folders may be given as flags or, when omitted,
// entered at an interactive prompt — the tool is also run by
// people who never pass flags.
//
// Reference: Rust Book §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};

use commands::{AnalyzeArgs, Commands, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "questionnaire-scan",
    version = "0.1.0",
    about = "Find crossed answer boxes on scanned questionnaires and aggregate the results."
)]
pub struct Cli {
    /// The subcommand to run (analyze or train)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Analyze(args) => self.run_analyze(args),
            Commands::Train(args) => self.run_train(args),
        }
    }

    /// Handles the `analyze` subcommand. Resolves the two folder
    /// prompts, then hands off to Layer 2.
    fn run_analyze(&self, args: AnalyzeArgs) -> Result<()> {
        use crate::application::analyze_use_case::{AnalyzeConfig, AnalyzeUseCase};

        let input_dir = resolve_dir(
            args.input_dir,
            "Please enter the directory path where the questionnaire images will be analysed",
        )?;
        let output_dir = resolve_dir(
            args.output_dir,
            "Please enter the directory path for the generated files",
        )?;

        println!("Analysing questionnaire images... (this might take a while)");
        let use_case = AnalyzeUseCase::new(AnalyzeConfig {
            input_dir,
            output_dir: output_dir.clone(),
            template_dir: args.template_dir,
            checkpoint_dir: args.checkpoint_dir,
        });
        let summary = use_case.execute()?;

        println!(
            "Analysed {} questionnaire(s) ({} skipped): {} crossed, {} empty boxes.",
            summary.analysed, summary.skipped, summary.crossed, summary.empty,
        );
        println!("Process ended. Output files can be found in {output_dir}");
        Ok(())
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(&self, args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting classifier training");
        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Training complete. Classifier artifact saved.");
        Ok(())
    }
}

/// Use the flag value when given, otherwise prompt on stdin.
fn resolve_dir(flag: Option<String>, prompt: &str) -> Result<String> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    print!("{prompt}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Cannot read directory path from stdin")?;
    let dir = line.trim().to_string();
    if dir.is_empty() {
        anyhow::bail!("No directory path entered");
    }
    Ok(dir)
}
