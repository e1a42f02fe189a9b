use crate::data::Record;
use crate::error::Result;
use crate::source::{Records, Source};

/// A source over records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Vec<Record>,
}

impl MemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }
}

impl FromIterator<Record> for MemorySource {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Source for MemorySource {
    fn records(&self) -> Result<Records<'_>> {
        Ok(Box::new(self.records.iter().cloned().map(Ok)))
    }

    fn is_empty(&self) -> Option<bool> {
        Some(self.records.is_empty())
    }

    fn len(&self) -> Option<usize> {
        Some(self.records.len())
    }
}
