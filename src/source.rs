//! Data sources feeding the indexer.
//!
//! A source yields `(id, field -> text)` records. It must be restartable:
//! every category worker walks the records independently.

pub mod csv;
pub mod memory;

use std::fmt::Debug;

use crate::data::{KeyFormat, Record};
use crate::error::Result;

pub use self::csv::CsvSource;
pub use memory::MemorySource;

/// Iterator over source records.
pub type Records<'a> = Box<dyn Iterator<Item = Result<Record>> + 'a>;

/// A finite, restartable sequence of records.
pub trait Source: Send + Sync + Debug {
    /// Start a fresh pass over all records.
    fn records(&self) -> Result<Records<'_>>;

    /// Whether the source is known to be empty, if it can tell cheaply.
    fn is_empty(&self) -> Option<bool> {
        None
    }

    /// Format the source parses record keys with, if it parses them at all.
    fn key_format(&self) -> Option<KeyFormat> {
        None
    }

    /// Number of records, if known in advance.
    fn len(&self) -> Option<usize> {
        None
    }

    /// Called once before an index walks the source.
    fn begin_snapshot(&self) -> Result<()> {
        Ok(())
    }

    /// Called once after an index finished walking the source, also on failure.
    fn end_snapshot(&self) -> Result<()> {
        Ok(())
    }
}
