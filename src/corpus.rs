//! Labeled URL corpora for training.
//!
//! Two on-disk formats are read:
//!
//! CSV with a header naming at least `url` and `label` columns:
//! ```csv
//! url,label
//! http://www.google.com,0
//! http://login-secure-bank.com.xyz/verify,1
//! ```
//!
//! JSON Lines (`.jsonl` or `.ndjson`), one object per line:
//! ```jsonl
//! {"url": "http://www.google.com", "label": 0}
//! ```
//!
//! Malformed rows are skipped and counted rather than failing the load.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{PhishBlockError, Result};
use crate::model::types::Label;

/// One training example.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledUrl {
    pub url: String,
    pub label: Label,
}

impl LabeledUrl {
    pub fn new<S: Into<String>>(url: S, label: Label) -> Self {
        Self {
            url: url.into(),
            label,
        }
    }
}

/// Number of samples per class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub benign: usize,
    pub phishing: usize,
}

impl ClassCounts {
    pub fn get(&self, label: Label) -> usize {
        match label {
            Label::Benign => self.benign,
            Label::Phishing => self.phishing,
        }
    }

    pub fn total(&self) -> usize {
        self.benign + self.phishing
    }
}

/// Row indices of a train/test partition, each in ascending order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// An in-memory labeled corpus.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Corpus {
    samples: Vec<LabeledUrl>,
    /// Rows dropped while reading.
    skipped: usize,
}

#[derive(Deserialize)]
struct JsonlRow {
    url: Option<String>,
    label: Option<serde_json::Value>,
}

impl Corpus {
    pub fn new(samples: Vec<LabeledUrl>) -> Self {
        Self {
            samples,
            skipped: 0,
        }
    }

    /// Read a corpus file, choosing the format from its extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PhishBlockError::corpus(format!("failed to open {}: {e}", path.display()))
        })?;

        let is_jsonl = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson"));

        let corpus = if is_jsonl {
            Self::from_jsonl_reader(BufReader::new(file))?
        } else {
            Self::from_csv_reader(file)?
        };

        log::info!(
            "loaded {} labeled URLs from {} ({} phishing, {} benign)",
            corpus.len(),
            path.display(),
            corpus.class_counts().phishing,
            corpus.class_counts().benign
        );
        Ok(corpus)
    }

    /// Parse CSV with a `url`/`label` header.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| PhishBlockError::corpus(format!("failed to read CSV header: {e}")))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim_start_matches('\u{feff}') == name)
        };
        let (url_column, label_column) = match (column("url"), column("label")) {
            (Some(url), Some(label)) => (url, label),
            _ => {
                return Err(PhishBlockError::corpus(
                    "CSV header must contain 'url' and 'label' columns",
                ));
            }
        };

        let mut samples = Vec::new();
        let mut skipped = 0;
        for (line, record) in reader.records().enumerate() {
            let record = match record {
                // Short rows are kept when they still reach both columns
                Ok(record) if record.len() <= headers.len() => record,
                Ok(record) => {
                    log::debug!(
                        "skipping CSV row {}: expected {} fields, found {}",
                        line + 2,
                        headers.len(),
                        record.len()
                    );
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    log::debug!("skipping CSV row {}: {e}", line + 2);
                    skipped += 1;
                    continue;
                }
            };

            let url = record.get(url_column).unwrap_or_default();
            match (url.is_empty(), record.get(label_column).and_then(parse_label)) {
                (false, Some(label)) => samples.push(LabeledUrl::new(url, label)),
                _ => skipped += 1,
            }
        }

        Ok(Self::with_skipped(samples, skipped))
    }

    /// Parse JSON Lines, one `{"url": ..., "label": ...}` object per line.
    pub fn from_jsonl_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut samples = Vec::new();
        let mut skipped = 0;

        // Raw lines, so bad UTF-8 skips one row instead of failing the load
        for (line_number, line) in reader.split(b'\n').enumerate() {
            let line = match String::from_utf8(line?) {
                Ok(line) => line,
                Err(e) => {
                    log::debug!("skipping JSONL line {}: {e}", line_number + 1);
                    skipped += 1;
                    continue;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let row: JsonlRow = match serde_json::from_str(line) {
                Ok(row) => row,
                Err(e) => {
                    log::debug!("skipping JSONL line {}: {e}", line_number + 1);
                    skipped += 1;
                    continue;
                }
            };
            let url = row.url.as_deref().map(str::trim).unwrap_or_default();
            let label = row.label.as_ref().and_then(label_from_json);
            match (url.is_empty(), label) {
                (false, Some(label)) => samples.push(LabeledUrl::new(url, label)),
                _ => skipped += 1,
            }
        }

        Ok(Self::with_skipped(samples, skipped))
    }

    fn with_skipped(samples: Vec<LabeledUrl>, skipped: usize) -> Self {
        if skipped > 0 {
            log::warn!("skipped {skipped} malformed or unlabeled rows");
        }
        Self { samples, skipped }
    }

    pub fn samples(&self) -> &[LabeledUrl] {
        &self.samples
    }

    pub fn urls(&self) -> Vec<&str> {
        self.samples.iter().map(|sample| sample.url.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.samples.iter().map(|sample| sample.label).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Rows dropped while reading.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn class_counts(&self) -> ClassCounts {
        let phishing = self
            .samples
            .iter()
            .filter(|sample| sample.label.is_phishing())
            .count();
        ClassCounts {
            benign: self.samples.len() - phishing,
            phishing,
        }
    }

    /// Partition row indices into train and test sets, keeping the class
    /// ratio on both sides.
    ///
    /// Each class moves `round(test_size * n_class)` rows to the test side,
    /// clamped so both sides keep at least one row of the class. The same
    /// seed always yields the same split.
    ///
    /// # Errors
    ///
    /// - [`PhishBlockError::InvalidArgument`] if `test_size` is not in `(0, 1)`
    /// - [`PhishBlockError::Corpus`] if a class has fewer than two samples
    pub fn stratified_split(&self, test_size: f64, seed: u64) -> Result<Split> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PhishBlockError::invalid_argument(format!(
                "test_size must be between 0 and 1, got {test_size}"
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut train = Vec::new();
        let mut test = Vec::new();

        for label in Label::ALL {
            let mut indices: Vec<usize> = self
                .samples
                .iter()
                .enumerate()
                .filter(|(_, sample)| sample.label == label)
                .map(|(index, _)| index)
                .collect();
            let n = indices.len();
            if n < 2 {
                return Err(PhishBlockError::corpus(format!(
                    "class {} has {n} samples, at least 2 are needed to split",
                    label.name()
                )));
            }

            indices.shuffle(&mut rng);
            let n_test = ((test_size * n as f64).round() as usize).clamp(1, n - 1);
            test.extend_from_slice(&indices[..n_test]);
            train.extend_from_slice(&indices[n_test..]);
        }

        train.sort_unstable();
        test.sort_unstable();
        Ok(Split { train, test })
    }
}

/// Accepts integer labels 0 and 1, also written as floats (`1.0`).
fn parse_label(value: &str) -> Option<Label> {
    let value = value.trim();
    let number = match value.parse::<i64>() {
        Ok(number) => number,
        Err(_) => {
            let float = value.parse::<f64>().ok()?;
            if float.fract() != 0.0 {
                return None;
            }
            float as i64
        }
    };
    u8::try_from(number).ok().and_then(|n| Label::try_from(n).ok())
}

fn label_from_json(value: &serde_json::Value) -> Option<Label> {
    match value {
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(|n| n.to_string())
            .or_else(|| number.as_f64().map(|f| f.to_string()))
            .and_then(|s| parse_label(&s)),
        serde_json::Value::String(s) => parse_label(s),
        serde_json::Value::Bool(b) => Some(if *b { Label::Phishing } else { Label::Benign }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced_corpus(per_class: usize) -> Corpus {
        let mut samples = Vec::new();
        for i in 0..per_class {
            samples.push(LabeledUrl::new(format!("https://site{i}.example"), Label::Benign));
            samples.push(LabeledUrl::new(
                format!("http://login-verify{i}.example.xyz"),
                Label::Phishing,
            ));
        }
        Corpus::new(samples)
    }

    #[test]
    fn test_csv_basic() {
        let data = "url,label\nhttp://www.google.com,0\nhttp://login-secure-bank.com.xyz/verify,1\n";
        let corpus = Corpus::from_csv_reader(data.as_bytes()).unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.samples()[0].url, "http://www.google.com");
        assert_eq!(corpus.samples()[0].label, Label::Benign);
        assert_eq!(corpus.samples()[1].label, Label::Phishing);
        assert_eq!(corpus.skipped(), 0);
    }

    #[test]
    fn test_csv_column_order_and_extra_columns() {
        let data = "id,label,url,source\n1,1,http://a.example,feed\n2,0,http://b.example,crawl\n";
        let corpus = Corpus::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(corpus.urls(), vec!["http://a.example", "http://b.example"]);
        assert_eq!(corpus.labels(), vec![Label::Phishing, Label::Benign]);
    }

    #[test]
    fn test_csv_quoted_fields() {
        let data = "url,label\n\"http://a.example/?q=1,2\",1\n\"http://b.example/\"\"x\"\"\",0\n";
        let corpus = Corpus::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(corpus.samples()[0].url, "http://a.example/?q=1,2");
        assert_eq!(corpus.samples()[1].url, "http://b.example/\"x\"");
    }

    #[test]
    fn test_csv_skips_bad_rows() {
        let data = "url,label\n\
                    http://ok.example,1\n\
                    http://too,many,fields,0\n\
                    ,1\n\
                    http://blank-label.example,\n\
                    http://bad-label.example,2\n\
                    http://text-label.example,yes\n\
                    http://float-label.example,1.0\n";
        let corpus = Corpus::from_csv_reader(data.as_bytes()).unwrap();

        assert_eq!(corpus.urls(), vec!["http://ok.example", "http://float-label.example"]);
        assert_eq!(corpus.skipped(), 5);
    }

    #[test]
    fn test_csv_short_rows() {
        let data = "url,label,source,note\n\
                    http://full.example,0,feed,ok\n\
                    http://short.example,1\n\
                    http://no-label.example\n\
                    http://padded.example,1,,\n";
        let corpus = Corpus::from_csv_reader(data.as_bytes()).unwrap();

        assert_eq!(
            corpus.urls(),
            vec!["http://full.example", "http://short.example", "http://padded.example"]
        );
        assert_eq!(corpus.skipped(), 1);

        // A short row that ends before the label column is dropped
        let data = "label,source,url\n1,feed\n0,crawl,http://b.example\n";
        let corpus = Corpus::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(corpus.urls(), vec!["http://b.example"]);
        assert_eq!(corpus.skipped(), 1);
    }

    #[test]
    fn test_csv_missing_columns() {
        let data = "address,class\nhttp://a.example,1\n";
        let result = Corpus::from_csv_reader(data.as_bytes());
        assert!(matches!(result, Err(PhishBlockError::Corpus(_))));

        let result = Corpus::from_csv_reader("".as_bytes());
        assert!(matches!(result, Err(PhishBlockError::Corpus(_))));
    }

    #[test]
    fn test_jsonl() {
        let data = r#"{"url": "http://www.google.com", "label": 0}
{"url": "http://paypal-verify.example", "label": 1.0}

not json
{"url": "http://no-label.example"}
{"url": "http://string-label.example", "label": "1"}
"#;
        let corpus = Corpus::from_jsonl_reader(data.as_bytes()).unwrap();
        assert_eq!(
            corpus.labels(),
            vec![Label::Benign, Label::Phishing, Label::Phishing]
        );
        assert_eq!(corpus.skipped(), 2);
    }

    #[test]
    fn test_jsonl_skips_invalid_utf8() {
        let mut data = Vec::new();
        data.extend_from_slice(b"{\"url\": \"http://www.google.com\", \"label\": 0}\n");
        data.extend_from_slice(b"{\"url\": \"http://\xff\xfe.example\", \"label\": 1}\n");
        data.extend_from_slice(b"{\"url\": \"http://paypal-verify.example\", \"label\": 1}\r\n");

        let corpus = Corpus::from_jsonl_reader(data.as_slice()).unwrap();
        assert_eq!(
            corpus.urls(),
            vec!["http://www.google.com", "http://paypal-verify.example"]
        );
        assert_eq!(corpus.skipped(), 1);
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label("0"), Some(Label::Benign));
        assert_eq!(parse_label(" 1 "), Some(Label::Phishing));
        assert_eq!(parse_label("1.0"), Some(Label::Phishing));
        assert_eq!(parse_label("0.5"), None);
        assert_eq!(parse_label("-1"), None);
        assert_eq!(parse_label(""), None);
    }

    #[test]
    fn test_class_counts() {
        let corpus = balanced_corpus(3);
        let counts = corpus.class_counts();
        assert_eq!(counts.benign, 3);
        assert_eq!(counts.phishing, 3);
        assert_eq!(counts.total(), 6);
        assert_eq!(counts.get(Label::Phishing), 3);
    }

    #[test]
    fn test_stratified_split() {
        let corpus = balanced_corpus(10);
        let split = corpus.stratified_split(0.2, 42).unwrap();

        assert_eq!(split.test.len(), 4);
        assert_eq!(split.train.len(), 16);

        let test_phishing = split
            .test
            .iter()
            .filter(|&&i| corpus.samples()[i].label.is_phishing())
            .count();
        assert_eq!(test_phishing, 2);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_stratified_split_is_seeded() {
        let corpus = balanced_corpus(25);
        let first = corpus.stratified_split(0.3, 7).unwrap();
        let second = corpus.stratified_split(0.3, 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stratified_split_keeps_both_sides() {
        // round(0.2 * 2) = 0, clamped to 1
        let corpus = balanced_corpus(2);
        let split = corpus.stratified_split(0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 2);
    }

    #[test]
    fn test_stratified_split_errors() {
        let corpus = balanced_corpus(5);
        assert!(matches!(
            corpus.stratified_split(0.0, 42),
            Err(PhishBlockError::InvalidArgument(_))
        ));
        assert!(matches!(
            corpus.stratified_split(1.0, 42),
            Err(PhishBlockError::InvalidArgument(_))
        ));

        let corpus = Corpus::new(vec![
            LabeledUrl::new("http://a.example", Label::Benign),
            LabeledUrl::new("http://b.example", Label::Benign),
            LabeledUrl::new("http://c.example", Label::Phishing),
        ]);
        assert!(matches!(
            corpus.stratified_split(0.2, 42),
            Err(PhishBlockError::Corpus(_))
        ));
    }
}
