//! Tokenizer implementations for URL analysis.
//!
//! Tokenizers turn a raw URL string into a stream of character n-grams. They
//! are total: every input string, including the empty string, produces a
//! (possibly empty) stream without error.
//!
//! # Available Tokenizers
//!
//! - [`char_wb::CharWbTokenizer`] - Character n-grams inside word boundaries,
//!   with each word padded by a single space
//!
//! # Examples
//!
//! ```
//! use phishblock::analysis::tokenizer::Tokenizer;
//! use phishblock::analysis::tokenizer::char_wb::CharWbTokenizer;
//!
//! let tokenizer = CharWbTokenizer::new(3, 3).unwrap();
//! let tokens: Vec<_> = tokenizer.tokenize("google").map(|t| t.text).collect();
//! assert_eq!(tokens, vec![" go", "goo", "oog", "ogl", "gle", "le "]);
//! ```

use crate::analysis::token::TokenStream;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so a single tokenizer can back a scorer
/// shared across threads.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> TokenStream;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod char_wb;

pub use char_wb::{CharWbTokenizer, NgramRange};
