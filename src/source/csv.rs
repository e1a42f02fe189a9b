//! CSV file source.
//!
//! The first column holds the record id; the remaining columns are fields,
//! named either explicitly or by the header row.

use std::path::{Path, PathBuf};

use ::csv::{ReaderBuilder, StringRecord};

use crate::data::{KeyFormat, Record};
use crate::error::{BurrowError, Result};
use crate::source::{Records, Source};

#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    fields: Vec<String>,
    key_format: KeyFormat,
    delimiter: u8,
    has_headers: bool,
}

impl CsvSource {
    /// A source reading `path`, with field names taken from the header row.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            fields: Vec::new(),
            key_format: KeyFormat::default(),
            delimiter: b',',
            has_headers: true,
        }
    }

    /// Name the columns after the id column explicitly. The file is then
    /// read without a header row.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self.has_headers = false;
        self
    }

    pub fn key_format(mut self, key_format: KeyFormat) -> Self {
        self.key_format = key_format;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_record(&self, fields: &[String], row: &StringRecord) -> Result<Record> {
        let raw_id = row
            .get(0)
            .ok_or_else(|| BurrowError::index(format!("empty row in {}", self.path.display())))?;
        let mut record = Record::new(self.key_format.parse(raw_id)?);
        for (name, value) in fields.iter().zip(row.iter().skip(1)) {
            record.fields.insert(name.clone(), value.to_string());
        }
        Ok(record)
    }
}

impl Source for CsvSource {
    fn key_format(&self) -> Option<KeyFormat> {
        Some(self.key_format)
    }

    fn records(&self) -> Result<Records<'_>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(self.has_headers)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_path(&self.path)?;

        let fields = if self.fields.is_empty() {
            reader
                .headers()?
                .iter()
                .skip(1)
                .map(str::to_string)
                .collect()
        } else {
            self.fields.clone()
        };

        Ok(Box::new(reader.into_records().map(move |row| {
            let row = row?;
            self.to_record(&fields, &row)
        })))
    }
}
