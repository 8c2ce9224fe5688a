//! Tabular data source.
//!
//! Reads a UTF-8 CSV file whose first record names the fields. Every later
//! record becomes a [`Row`]. A leading byte-order mark is stripped.

use crate::error::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// One data record, exposed as an ordered field → value mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based position among the data records (the header is not counted).
    index: usize,
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl Row {
    /// Build a row. Missing trailing values read as empty strings and
    /// surplus values are dropped.
    pub fn new(index: usize, headers: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.resize(headers.len(), String::new());
        Row {
            index,
            headers,
            values,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == field)
            .map(|i| self.values[i].as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.headers.iter().any(|h| h == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    /// A human-readable identifier for reports, e.g. `row 3 (Ann, Lee)`.
    pub fn label(&self) -> String {
        let values: Vec<&str> = self
            .values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            format!("row {}", self.index)
        } else {
            format!("row {} ({})", self.index, values.join(", "))
        }
    }
}

/// Sequential CSV reader yielding [`Row`]s in file order.
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
    headers: Arc<[String]>,
    next_index: usize,
}

impl CsvSource<BufReader<File>> {
    /// Open a CSV file and read its header record.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let field = if i == 0 { field.strip_prefix(BOM).unwrap_or(field) } else { field };
                String::from_utf8_lossy(field).into_owned()
            })
            .collect();

        Ok(CsvSource {
            reader,
            headers: headers.into(),
            next_index: 1,
        })
    }

    /// The field names from the header record.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl<R: Read> Iterator for CsvSource<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = csv::StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => {
                let row = Row::new(
                    self.next_index,
                    Arc::clone(&self.headers),
                    record.iter().map(str::to_string).collect(),
                );
                self.next_index += 1;
                Some(Ok(row))
            }
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// Read just the header record of a CSV file.
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    Ok(CsvSource::open(path)?.headers().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(input: &str) -> (Vec<String>, Vec<Row>) {
        let source = CsvSource::from_reader(input.as_bytes()).unwrap();
        let headers = source.headers().to_vec();
        let rows = source.collect::<Result<Vec<_>>>().unwrap();
        (headers, rows)
    }

    #[test]
    fn test_header_and_rows() {
        let (headers, rows) = rows("name,surname\nAnn,Lee\nBob,Ray\n");
        assert_eq!(headers, vec!["name", "surname"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some("Ann"));
        assert_eq!(rows[1].get("surname"), Some("Ray"));
        assert_eq!(rows[1].index(), 2);
    }

    #[test]
    fn test_bom_is_stripped() {
        let (headers, rows) = rows("\u{feff}name,city\nAnn,Oslo\n");
        assert_eq!(headers[0], "name");
        assert_eq!(rows[0].get("name"), Some("Ann"));
    }

    #[test]
    fn test_quoted_fields() {
        let (_, rows) = rows("name,address\n\"Lee, Ann\",\"1 Main St\nApt 2\"\n");
        assert_eq!(rows[0].get("name"), Some("Lee, Ann"));
        assert_eq!(rows[0].get("address"), Some("1 Main St\nApt 2"));
    }

    #[test]
    fn test_short_record_reads_empty() {
        let (_, rows) = rows("a,b,c\n1,2\n");
        assert_eq!(rows[0].get("c"), Some(""));
        assert_eq!(rows[0].get("zzz"), None);
    }

    #[test]
    fn test_row_label() {
        let (_, rows) = rows("name,surname\nAnn,Lee\n,\n");
        assert_eq!(rows[0].label(), "row 1 (Ann, Lee)");
        assert_eq!(rows[1].label(), "row 2");
    }

    #[test]
    fn test_iter_keeps_header_order() {
        let (_, rows) = rows("z,a\n1,2\n");
        let pairs: Vec<_> = rows[0].iter().collect();
        assert_eq!(pairs, vec![("z", "1"), ("a", "2")]);
    }
}
