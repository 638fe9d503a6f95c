// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `analyze` and `train`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyse a folder of scanned questionnaires
    Analyze(AnalyzeArgs),

    /// Train the box classifier on labelled crops
    Train(TrainArgs),
}

/// All arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Directory containing the questionnaire scans.
    /// Prompted for interactively when omitted.
    #[arg(long)]
    pub input_dir: Option<String>,

    /// Directory for the annotated images and the spreadsheet.
    /// Prompted for interactively when omitted.
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Directory holding layout.json and the reference image
    #[arg(long, default_value = "template")]
    pub template_dir: String,

    /// Directory the trained classifier artifact was saved to
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Folder of crossed-box training crops (.png)
    #[arg(long, default_value = "data/crossed")]
    pub crossed_dir: String,

    /// Folder of empty-box training crops (.png)
    #[arg(long, default_value = "data/empty")]
    pub empty_dir: String,

    /// Directory to save the classifier artifact and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Hidden layer width of the network
    #[arg(long, default_value_t = 32)]
    pub hidden_size: usize,

    /// Dropout probability applied to the hidden layer during training
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Number of crops processed together in one forward pass
    #[arg(long, default_value_t = 50)]
    pub batch_size: usize,

    /// Number of full passes through the training crops per candidate
    #[arg(long, default_value_t = 40)]
    pub epochs: usize,

    /// How many independently initialized candidate networks to
    /// train; the one with the best validation accuracy survives
    #[arg(long, default_value_t = 5)]
    pub generations: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Share of the crops used for training; the rest validates
    #[arg(long, default_value_t = 0.75)]
    pub train_fraction: f64,

    /// Validation accuracy at which candidate selection stops early
    #[arg(long, default_value_t = 0.999)]
    pub target_accuracy: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            crossed_dir:     a.crossed_dir,
            empty_dir:       a.empty_dir,
            checkpoint_dir:  a.checkpoint_dir,
            hidden_size:     a.hidden_size,
            dropout:         a.dropout,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            generations:     a.generations,
            lr:              a.lr,
            train_fraction:  a.train_fraction,
            target_accuracy: a.target_accuracy,
        }
    }
}
