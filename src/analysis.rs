//! URL analysis: character n-gram tokenization and term counting.

pub mod term_counts;
pub mod token;
pub mod tokenizer;

pub use term_counts::TermCounts;
pub use token::{Token, TokenStream};
pub use tokenizer::{CharWbTokenizer, NgramRange, Tokenizer};
