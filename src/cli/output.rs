//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::analysis::tokenizer::NgramRange;
use crate::cli::args::{OutputFormat, PhishBlockArgs};
use crate::error::Result;
use crate::evaluation::ClassificationReport;
use crate::model::types::{Contribution, Label};
use crate::pipeline::TrainingSummary;

/// Result structure for training.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainResult {
    pub model_path: String,
    pub summary: TrainingSummary,
    pub report: ClassificationReport,
}

/// Score of a single URL.
#[derive(Debug, Serialize, Deserialize)]
pub struct UrlScore {
    pub url: String,
    pub score: f64,
    pub label: Label,
    pub probability: f64,
    /// Probability above the `--threshold` cut, when one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributions: Option<Vec<Contribution>>,
}

/// Result structure for scoring.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResults {
    pub model_path: String,
    pub results: Vec<UrlScore>,
}

/// A vocabulary term and its exported weight.
#[derive(Debug, Serialize, Deserialize)]
pub struct TermWeight {
    pub term: String,
    pub weight: f64,
}

/// Result structure for model inspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_path: String,
    pub vocabulary_size: usize,
    pub max_features: usize,
    pub ngram_range: NgramRange,
    pub intercept: f64,
    /// Largest positive weights first.
    pub top_phishing: Vec<TermWeight>,
    /// Most negative weights first.
    pub top_benign: Vec<TermWeight>,
}

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn print_human(&self, args: &PhishBlockArgs);
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &PhishBlockArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 1 {
                println!("{message}");
                println!();
            }
            result.print_human(args);
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &PhishBlockArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

impl HumanOutput for TrainResult {
    fn print_human(&self, args: &PhishBlockArgs) {
        let summary = &self.summary;
        if args.verbosity() > 0 {
            println!(
                "Loaded and cleaned {} URLs for training ({} phishing, {} benign, {} rows skipped).",
                summary.samples,
                summary.class_counts.phishing,
                summary.class_counts.benign,
                summary.skipped_rows
            );
            println!(
                "Trained {} on {} URLs, evaluated on {} ({} iterations{}).",
                summary.trainer,
                summary.train_samples,
                summary.test_samples,
                summary.stats.iterations,
                if summary.stats.converged {
                    ""
                } else {
                    ", not converged"
                }
            );
            println!();
        }

        println!("--- Model Performance ---");
        print!("{}", self.report);
        println!("-------------------------");
        println!();
        println!("Successfully exported model to '{}'", self.model_path);
        println!(
            "Model has {} feature weights and an intercept.",
            summary.vocabulary_size
        );
    }
}

impl HumanOutput for ScoreResults {
    fn print_human(&self, args: &PhishBlockArgs) {
        for result in &self.results {
            let marker = match result.flagged {
                Some(true) => "FLAGGED  ",
                Some(false) => "         ",
                None => "",
            };
            println!(
                "{marker}{:<8} {:>9.4}  {:.3}  {}",
                result.label.name(),
                result.score,
                result.probability,
                result.url
            );
            if let Some(contributions) = &result.contributions {
                let limit = if args.verbosity() > 1 {
                    contributions.len()
                } else {
                    10
                };
                for contribution in contributions.iter().take(limit) {
                    println!(
                        "    {:>+9.4}  {:?}",
                        contribution.contribution, contribution.term
                    );
                }
            }
        }
    }
}

impl HumanOutput for ModelInfo {
    fn print_human(&self, _args: &PhishBlockArgs) {
        println!("Model: {}", self.model_path);
        println!("Vocabulary size: {}", self.vocabulary_size);
        println!("Max features: {}", self.max_features);
        println!("N-gram range: {}", self.ngram_range);
        println!("Intercept: {:.6}", self.intercept);

        println!();
        println!("Strongest phishing terms:");
        print_terms(&self.top_phishing);
        println!();
        println!("Strongest benign terms:");
        print_terms(&self.top_benign);
    }
}

fn print_terms(terms: &[TermWeight]) {
    if terms.is_empty() {
        println!("  (none)");
    }
    for term in terms {
        println!("  {:>+10.4}  {:?}", term.weight, term.term);
    }
}
