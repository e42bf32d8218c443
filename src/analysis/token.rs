//! Token types for URL analysis.
//!
//! A [`Token`] is one character n-gram produced by a tokenizer. Tokens flow
//! from the tokenizer into [`TermCounts`](crate::analysis::term_counts::TermCounts),
//! which is the multiset the vectorizer consumes.
//!
//! # Examples
//!
//! ```
//! use phishblock::analysis::token::Token;
//!
//! let token = Token::new(" go", 0, 0);
//! assert_eq!(token.text, " go");
//! assert_eq!(token.position, 0);
//! assert!(token.touches_boundary());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single character n-gram emitted by a tokenizer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The n-gram text, possibly including the boundary padding.
    pub text: String,

    /// Position in the token stream (0-based).
    pub position: usize,

    /// Index of the whitespace-separated word this n-gram was cut from.
    pub word: usize,
}

impl Token {
    /// Create a new token.
    pub fn new<S: Into<String>>(text: S, position: usize, word: usize) -> Self {
        Token {
            text: text.into(),
            position,
            word,
        }
    }

    /// Number of characters in the n-gram.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the n-gram includes a word-boundary pad.
    pub fn touches_boundary(&self) -> bool {
        self.text.starts_with(' ') || self.text.ends_with(' ')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.text, self.position)
    }
}

/// A stream of tokens.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_boundary() {
        assert!(Token::new(" go", 0, 0).touches_boundary());
        assert!(Token::new("le ", 5, 0).touches_boundary());
        assert!(!Token::new("oog", 2, 0).touches_boundary());
    }

    #[test]
    fn test_token_char_len() {
        assert_eq!(Token::new("日本語", 0, 0).char_len(), 3);
        assert_eq!(Token::new(" ab", 0, 0).char_len(), 3);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(Token::new("goo", 1, 0).to_string(), "\"goo\"@1");
    }
}
