//! Index generators.
//!
//! Everything a [`Bundle`](crate::bundle::Bundle) holds beyond the exact
//! inverted index is derived here:
//!
//! - `weights`: relevance weight per token from its occurrence count
//! - `partial`: substring keys mapping to the identifiers of the full token
//! - `phonetic`: phonetic encoders used to bucket similar-sounding tokens
//! - `similarity`: phonetic code to ordered candidate tokens
//!
//! Each generator kind is a closed enum of strategies chosen per category at
//! configuration time.

pub mod partial;
pub mod phonetic;
pub mod similarity;
pub mod weights;

pub use partial::PartialStrategy;
pub use phonetic::PhoneticEncoder;
pub use similarity::SimilarityStrategy;
pub use weights::WeightStrategy;
