//! Query-time processing: tokens, qualifiers, parsing and the
//! combination/allocation resolution.

pub mod allocation;
pub mod combination;
pub mod parser;
pub mod qualifiers;
pub mod token;

pub use allocation::Allocation;
pub use combination::Combination;
pub use parser::{Query, QueryParser, TokenGroup};
pub use qualifiers::QualifierRegistry;
pub use token::Token;
