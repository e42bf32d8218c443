//! Feature extraction: vocabulary selection and TF-IDF encoding.

pub mod tfidf;
pub mod vector;
pub mod vocabulary;

pub use tfidf::{IdfWeights, NormOrder, TfIdfVectorizer, encode};
pub use vector::FeatureVector;
pub use vocabulary::{FrequencyMeasure, IndexOrder, Vocabulary, VocabularyBuilder};
