//! Command line argument parsing for the PhishBlock CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// PhishBlock - character n-gram URL phishing classifier
#[derive(Parser, Debug, Clone)]
#[command(name = "phishblock")]
#[command(about = "Train, inspect and apply character n-gram URL phishing classifiers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct PhishBlockArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl PhishBlockArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model on a labeled URL dataset and export it
    Train(TrainArgs),

    /// Score URLs with an exported model
    Score(ScoreArgs),

    /// Validate a model file and show its strongest terms
    Inspect(InspectArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Labeled dataset (CSV with url,label columns, or JSONL)
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Where to write the model artifact
    #[arg(short, long, value_name = "FILE", default_value = "phishblock_model.json")]
    pub output: PathBuf,

    /// Training configuration file (JSON)
    #[arg(short, long, value_name = "FILE", env = "PHISHBLOCK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Vocabulary size cap
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Shortest n-gram length
    #[arg(long)]
    pub ngram_min: Option<usize>,

    /// Longest n-gram length
    #[arg(long)]
    pub ngram_max: Option<usize>,

    /// Fraction of each class held out for evaluation
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Shuffle seed for the train/test split
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for scoring
#[derive(Parser, Debug, Clone)]
pub struct ScoreArgs {
    /// Model artifact file
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// URLs to score
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// File with one URL per line ("-" for stdin)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Include per-term contributions
    #[arg(long)]
    pub explain: bool,

    /// Flag URLs whose phishing probability is above this value (0 to 1)
    #[arg(short, long, value_name = "P", value_parser = parse_probability)]
    pub threshold: Option<f64>,
}

fn parse_probability(value: &str) -> Result<f64, String> {
    let probability: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(format!("{probability} is not between 0 and 1"))
    }
}

/// Arguments for inspecting a model
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Model artifact file
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Number of strongest terms to show per class
    #[arg(short = 'n', long, default_value = "10")]
    pub top: usize,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
