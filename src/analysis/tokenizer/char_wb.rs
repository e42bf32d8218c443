//! Word-boundary character n-gram tokenizer.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::{PhishBlockError, Result};

/// Inclusive range of n-gram lengths, serialized as a two-element array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[usize; 2]", into = "[usize; 2]")]
pub struct NgramRange {
    min_n: usize,
    max_n: usize,
}

impl NgramRange {
    /// Create a new range.
    ///
    /// # Errors
    ///
    /// Returns an error if `min_n` is 0 or `max_n` is less than `min_n`.
    pub fn new(min_n: usize, max_n: usize) -> Result<Self> {
        if min_n == 0 {
            return Err(PhishBlockError::analysis("min_n must be at least 1"));
        }
        if max_n < min_n {
            return Err(PhishBlockError::analysis(format!(
                "max_n ({max_n}) must be >= min_n ({min_n})"
            )));
        }
        Ok(Self { min_n, max_n })
    }

    /// Smallest n-gram length.
    pub const fn min_n(&self) -> usize {
        self.min_n
    }

    /// Largest n-gram length.
    pub const fn max_n(&self) -> usize {
        self.max_n
    }
}

impl Default for NgramRange {
    fn default() -> Self {
        Self { min_n: 3, max_n: 5 }
    }
}

impl TryFrom<[usize; 2]> for NgramRange {
    type Error = PhishBlockError;

    fn try_from(value: [usize; 2]) -> Result<Self> {
        Self::new(value[0], value[1])
    }
}

impl From<NgramRange> for [usize; 2] {
    fn from(range: NgramRange) -> Self {
        [range.min_n, range.max_n]
    }
}

impl fmt::Display for NgramRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min_n, self.max_n)
    }
}

/// Word separators: Unicode whitespace plus the ASCII information separators
/// U+001C..U+001F, which the training runtime's `str.split()` also splits on.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// A tokenizer that generates character n-grams inside word boundaries.
///
/// The text is lowercased (unless disabled), split into words on whitespace,
/// and each word is padded with one space on both sides before n-grams are
/// cut, so n-grams at the edges of a word differ from interior ones. A padded
/// word no longer than `n` is emitted once, whole, and larger `n` are skipped
/// for that word.
///
/// # Examples
///
/// ```
/// use phishblock::analysis::tokenizer::Tokenizer;
/// use phishblock::analysis::tokenizer::char_wb::CharWbTokenizer;
///
/// let tokenizer = CharWbTokenizer::new(3, 4).unwrap();
/// let tokens: Vec<_> = tokenizer.tokenize("a.io").map(|t| t.text).collect();
/// assert_eq!(tokens, vec![" a.", "a.i", ".io", "io ", " a.i", "a.io", ".io "]);
///
/// // A word shorter than the window is kept once, padded.
/// let tokens: Vec<_> = tokenizer.tokenize("x").map(|t| t.text).collect();
/// assert_eq!(tokens, vec![" x "]);
/// ```
#[derive(Clone, Debug)]
pub struct CharWbTokenizer {
    range: NgramRange,
    lowercase: bool,
}

impl CharWbTokenizer {
    /// Create a new tokenizer for n-grams of length `min_n..=max_n`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `min_n` is 0
    /// - `max_n` is less than `min_n`
    pub fn new(min_n: usize, max_n: usize) -> Result<Self> {
        Ok(Self::from_range(NgramRange::new(min_n, max_n)?))
    }

    /// Create a tokenizer from an already validated range. Lowercasing is on.
    pub fn from_range(range: NgramRange) -> Self {
        Self {
            range,
            lowercase: true,
        }
    }

    /// Enable or disable lowercasing before n-gram extraction.
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// The n-gram length range.
    pub fn range(&self) -> NgramRange {
        self.range
    }

    /// Whether input is lowercased first.
    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    /// Extract all n-grams of `text` in emission order.
    pub fn ngrams(&self, text: &str) -> Vec<Token> {
        let text: Cow<'_, str> = if self.lowercase {
            Cow::Owned(text.to_lowercase())
        } else {
            Cow::Borrowed(text)
        };

        let mut tokens = Vec::new();
        let mut padded: Vec<char> = Vec::new();

        for (word_index, word) in text
            .split(is_separator)
            .filter(|word| !word.is_empty())
            .enumerate()
        {
            padded.clear();
            padded.push(' ');
            padded.extend(word.chars());
            padded.push(' ');

            for n in self.range.min_n..=self.range.max_n {
                if padded.len() <= n {
                    let position = tokens.len();
                    tokens.push(Token::new(
                        padded.iter().collect::<String>(),
                        position,
                        word_index,
                    ));
                    break;
                }

                for window in padded.windows(n) {
                    let position = tokens.len();
                    tokens.push(Token::new(
                        window.iter().collect::<String>(),
                        position,
                        word_index,
                    ));
                }
            }
        }

        tokens
    }
}

impl Default for CharWbTokenizer {
    fn default() -> Self {
        Self::from_range(NgramRange::default())
    }
}

impl Tokenizer for CharWbTokenizer {
    fn tokenize(&self, text: &str) -> TokenStream {
        Box::new(self.ngrams(text).into_iter())
    }

    fn name(&self) -> &'static str {
        "char_wb"
    }
}
