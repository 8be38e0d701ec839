use super::record::Record;
use crate::error::Result;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Reads records from delimited text with a header row
///
/// Each row becomes a [`Record`] whose fields follow the header order. Every
/// value is kept as a string; short rows get `null` for the missing columns
/// and extra cells past the header are ignored.
pub struct CsvRecordSource<R: Read> {
    headers: StringRecord,
    rows: StringRecordsIntoIter<R>,
}

impl CsvRecordSource<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening record source");
        let file = File::open(path).map_err(csv::Error::from)?;
        Self::from_reader(file)
    }
}

impl<R: Read> CsvRecordSource<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        Ok(Self {
            headers,
            rows: reader.into_records(),
        })
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    fn to_record(&self, row: &StringRecord) -> Record {
        let fields: Map<String, Value> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = row
                    .get(i)
                    .map_or(Value::Null, |cell| Value::String(cell.to_string()));
                (header.to_string(), value)
            })
            .collect();
        Record::from(fields)
    }
}

impl<R: Read> Iterator for CsvRecordSource<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(row.map(|row| self.to_record(&row)).map_err(Into::into))
    }
}
