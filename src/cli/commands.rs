//! Command implementations for the PhishBlock CLI.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::analysis::tokenizer::NgramRange;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::TrainingConfig;
use crate::corpus::Corpus;
use crate::error::{PhishBlockError, Result};
use crate::model::artifact::ModelArtifact;
use crate::model::scorer::LinearScorer;
use crate::model::types::{Contribution, Prediction};
use crate::pipeline::Pipeline;

/// Execute a CLI command.
pub fn execute_command(args: PhishBlockArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args, &args),
        Command::Score(score_args) => score_urls(score_args, &args),
        Command::Inspect(inspect_args) => inspect(inspect_args, &args),
    }
}

/// Build the training configuration from the config file and flag overrides.
pub fn training_config(args: &TrainArgs) -> Result<TrainingConfig> {
    let mut config = match &args.config {
        Some(path) => TrainingConfig::from_file(path)?,
        None => TrainingConfig::default(),
    };

    if let Some(max_features) = args.max_features {
        config.vectorizer.max_features = max_features;
    }
    if args.ngram_min.is_some() || args.ngram_max.is_some() {
        let current = config.vectorizer.ngram_range;
        config.vectorizer.ngram_range = NgramRange::new(
            args.ngram_min.unwrap_or(current.min_n()),
            args.ngram_max.unwrap_or(current.max_n()),
        )?;
    }
    if let Some(test_size) = args.test_size {
        config.split.test_size = test_size;
    }
    if let Some(seed) = args.seed {
        config.split.seed = seed;
    }

    config.validate()?;
    Ok(config)
}

/// Train, evaluate and export a model.
fn train(args: &TrainArgs, cli_args: &PhishBlockArgs) -> Result<()> {
    let config = training_config(args)?;
    let corpus = Corpus::load(&args.dataset)?;

    let pipeline = Pipeline::new(config)?;
    let outcome = pipeline.train_and_evaluate(&corpus)?;

    log::info!("exporting model to {}", args.output.display());
    outcome.artifact.save(&args.output)?;

    output_result(
        "Model trained successfully",
        &TrainResult {
            model_path: args.output.to_string_lossy().to_string(),
            summary: outcome.summary,
            report: outcome.report,
        },
        cli_args,
    )
}

/// Score URLs given on the command line and/or read from a file.
fn score_urls(args: &ScoreArgs, cli_args: &PhishBlockArgs) -> Result<()> {
    let scorer = LinearScorer::new(ModelArtifact::load(&args.model)?);

    let mut urls = args.urls.clone();
    match &args.input {
        Some(path) if path.as_os_str() == "-" => {
            urls.extend(read_urls(io::stdin().lock())?);
        }
        Some(path) => urls.extend(read_url_file(path)?),
        None if urls.is_empty() => urls.extend(read_urls(io::stdin().lock())?),
        None => {}
    }

    let results = if args.explain {
        urls.into_iter()
            .map(|url| {
                let explanation = scorer.explain(&url);
                url_score(
                    url,
                    explanation.prediction,
                    args.threshold,
                    Some(explanation.contributions),
                )
            })
            .collect()
    } else {
        let predictions = scorer.score_batch(&urls);
        urls.into_iter()
            .zip(predictions)
            .map(|(url, prediction)| url_score(url, prediction, args.threshold, None))
            .collect()
    };

    output_result(
        "URLs scored",
        &ScoreResults {
            model_path: args.model.to_string_lossy().to_string(),
            results,
        },
        cli_args,
    )
}

/// A URL is flagged only when its probability is strictly above `threshold`.
fn url_score(
    url: String,
    prediction: Prediction,
    threshold: Option<f64>,
    contributions: Option<Vec<Contribution>>,
) -> UrlScore {
    UrlScore {
        url,
        score: prediction.score,
        label: prediction.label,
        probability: prediction.probability,
        flagged: threshold.map(|threshold| prediction.probability > threshold),
        contributions,
    }
}

/// Validate a model and summarize it.
fn inspect(args: &InspectArgs, cli_args: &PhishBlockArgs) -> Result<()> {
    let artifact = ModelArtifact::load(&args.model)?;
    let ranked = artifact.ranked_terms();

    let to_term_weight = |&(term, weight): &(&str, f64)| TermWeight {
        term: term.to_string(),
        weight,
    };
    let top_phishing = ranked
        .iter()
        .filter(|(_, weight)| *weight > 0.0)
        .take(args.top)
        .map(to_term_weight)
        .collect();
    let top_benign = ranked
        .iter()
        .rev()
        .filter(|(_, weight)| *weight < 0.0)
        .take(args.top)
        .map(to_term_weight)
        .collect();

    output_result(
        "Model is valid",
        &ModelInfo {
            model_path: args.model.to_string_lossy().to_string(),
            vocabulary_size: artifact.len(),
            max_features: artifact.max_features(),
            ngram_range: artifact.ngram_range(),
            intercept: artifact.intercept(),
            top_phishing,
            top_benign,
        },
        cli_args,
    )
}

fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| {
        PhishBlockError::invalid_argument(format!("failed to open {}: {e}", path.display()))
    })?;
    read_urls(BufReader::new(file))
}

/// One URL per line; blank lines are ignored.
fn read_urls<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let url = line.trim();
        if !url.is_empty() {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}
