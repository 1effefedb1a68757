//! Shared utilities.
//!
//! Includes:
//! - Tokenization and name normalization (shared by ingestion and query time)
//! - Cosine and Jaccard similarity

pub mod similarity;
pub mod text;

pub use similarity::{cosine_similarity, jaccard, normalize_l2};
pub use text::{
    canonical_name, capitalize_first, normalize_whitespace, strip_interchange_chars, title_case,
    tokenize,
};
