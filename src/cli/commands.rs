// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// The four subcommands and their flags. Flags that also exist in
// the config file are optional here and override it when given.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::domain::exercise::OperationKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the digit classifier on MNIST-format IDX files
    Train(TrainArgs),

    /// Recognize the digit in a saved drawing file
    Recognize(RecognizeArgs),

    /// Run an interactive arithmetic drill
    Drill(DrillArgs),

    /// Ask the teaching assistant a question
    Ask(AskArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory with train-images-idx3-ubyte and train-labels-idx1-ubyte
    #[arg(long, default_value = "data/mnist")]
    pub data_dir: String,

    /// Where weights, train_config.json and metrics.csv are written
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Bitmap width the model is trained on; must match the IDX files
    #[arg(long, default_value_t = 28)]
    pub input_width: usize,

    /// Bitmap height the model is trained on; must match the IDX files
    #[arg(long, default_value_t = 28)]
    pub input_height: usize,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Width of the hidden linear layer
    #[arg(long, default_value_t = 128)]
    pub hidden_size: usize,

    #[arg(long, default_value_t = 0.3)]
    pub dropout: f64,

    /// Share of samples kept for training; the rest validates
    #[arg(long, default_value_t = 0.9)]
    pub train_fraction: f64,

    /// Seed for the split and the loader shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 2)]
    pub num_workers: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:       a.data_dir,
            checkpoint_dir: a.checkpoint_dir,
            input_width:    a.input_width,
            input_height:   a.input_height,
            batch_size:     a.batch_size,
            epochs:         a.epochs,
            lr:             a.lr,
            hidden_size:    a.hidden_size,
            dropout:        a.dropout,
            train_fraction: a.train_fraction,
            seed:           a.seed,
            num_workers:    a.num_workers,
        }
    }
}

#[derive(Args, Debug)]
pub struct RecognizeArgs {
    /// Drawing JSON file
    #[arg(long)]
    pub drawing: PathBuf,

    /// Also write the normalized bitmap as PNG
    #[arg(long)]
    pub dump: Option<PathBuf>,

    /// Overrides model.checkpoint_dir from the config
    #[arg(long)]
    pub checkpoint_dir: Option<String>,
}

#[derive(Args, Debug)]
pub struct DrillArgs {
    /// add, subtract or multiply
    #[arg(long, default_value = "add")]
    pub operation: OperationKind,

    /// Overrides model.checkpoint_dir from the config
    #[arg(long)]
    pub checkpoint_dir: Option<String>,

    /// Overrides recognition.auto_recognize_secs from the config
    #[arg(long)]
    pub auto_recognize_secs: Option<f64>,

    /// Overrides chat.base_url from the config
    #[arg(long)]
    pub chat_url: Option<String>,

    /// Run without the assistant
    #[arg(long)]
    pub no_chat: bool,

    /// Fixed seed for a repeatable exercise sequence
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question for the assistant
    #[arg(long, required_unless_present = "health")]
    pub question: Option<String>,

    /// Overrides chat.base_url from the config
    #[arg(long)]
    pub chat_url: Option<String>,

    /// Only check that the assistant is up
    #[arg(long)]
    pub health: bool,
}
