//! Text analysis applied to source values and raw query text.

pub mod tokenizer;

pub use tokenizer::{Substitution, Tokenizer, TokenizerConfig};
