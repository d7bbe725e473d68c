//! Lazy CSV record reader with offset-based resume
//!
//! The first line of the file is the header. Data lines are numbered from 0
//! and a resume offset of `n` skips exactly the first `n` data lines. Skipped
//! lines are read into a reused buffer and never turned into records.

use csv::{ByteRecord, Reader, ReaderBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::error::{IngestError, IngestResult};
use crate::models::RawRecord;

const BOM: char = '\u{feff}';

#[derive(Debug, Clone)]
pub struct RecordReader {
    path: PathBuf,
}

impl RecordReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the file and position the stream after `skip` data lines
    ///
    /// Skipping past the end of the file yields an empty stream.
    pub fn open(&self, skip: u64) -> IngestResult<Records> {
        if !self.path.is_file() {
            return Err(IngestError::SourceNotFound(self.path.clone()));
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let header = String::from_utf8_lossy(h);
                if i == 0 {
                    header.trim_start_matches(BOM).to_string()
                } else {
                    header.into_owned()
                }
            })
            .collect();

        debug!(
            path = %self.path.display(),
            columns = headers.len(),
            skip = skip,
            "Opened CSV source"
        );

        let mut records = Records {
            reader,
            headers,
            buffer: ByteRecord::new(),
            position: 0,
            exhausted: false,
        };
        records.skip_lines(skip)?;
        Ok(records)
    }
}

/// Stream of [`RawRecord`]s in file order
pub struct Records {
    reader: Reader<File>,
    headers: Vec<String>,
    buffer: ByteRecord,
    position: u64,
    exhausted: bool,
}

impl Records {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data lines consumed so far, skipped ones included
    pub fn position(&self) -> u64 {
        self.position
    }

    fn skip_lines(&mut self, count: u64) -> IngestResult<()> {
        while self.position < count {
            if !self.reader.read_byte_record(&mut self.buffer)? {
                self.exhausted = true;
                debug!(
                    requested = count,
                    available = self.position,
                    "Resume offset is past the end of the file"
                );
                break;
            }
            self.position += 1;
        }
        Ok(())
    }

    fn to_record(&self) -> RawRecord {
        if self.buffer.len() > self.headers.len() {
            trace!(
                line = self.position,
                extra = self.buffer.len() - self.headers.len(),
                "Ignoring fields beyond the header"
            );
        }

        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = self
                    .buffer
                    .get(i)
                    .map(|v| String::from_utf8_lossy(v).into_owned())
                    .unwrap_or_default();
                (header.clone(), value)
            })
            .collect()
    }
}

impl Iterator for Records {
    type Item = IngestResult<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        match self.reader.read_byte_record(&mut self.buffer) {
            Ok(true) => {
                let record = self.to_record();
                self.position += 1;
                Some(Ok(record))
            }
            Ok(false) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e.into()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn numbered_csv(lines: u64) -> NamedTempFile {
        let mut contents = String::from("Order ID,Sales\n");
        for i in 0..lines {
            contents.push_str(&format!("ORD-{},{}\n", i, i));
        }
        csv_file(&contents)
    }

    #[test]
    fn test_reads_records_keyed_by_header() {
        let file = csv_file("Order ID,Category\nCA-1,Furniture\nCA-2,Technology\n");
        let records: Vec<_> = RecordReader::new(file.path())
            .open(0)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Order ID"], "CA-1");
        assert_eq!(records[1]["Category"], "Technology");
    }

    #[test]
    fn test_missing_file_is_source_not_found() {
        let result = RecordReader::new("/nonexistent/orders.csv").open(0);
        assert!(matches!(result, Err(IngestError::SourceNotFound(_))));
    }

    #[test]
    fn test_open_resumes_after_offset() {
        let file = numbered_csv(5);
        let mut records = RecordReader::new(file.path()).open(2).unwrap();
        assert_eq!(records.position(), 2);

        let first = records.next().unwrap().unwrap();
        assert_eq!(first["Order ID"], "ORD-2");
        assert_eq!(records.position(), 3);
        assert_eq!(records.count(), 2);
    }

    #[test]
    fn test_skip_past_end_yields_nothing() {
        let file = numbered_csv(3);
        let mut records = RecordReader::new(file.path()).open(10).unwrap();
        assert!(records.next().is_none());
        assert_eq!(records.position(), 3);
    }

    #[test]
    fn test_short_rows_are_padded_and_long_rows_truncated() {
        let file = csv_file("A,B,C\n1\n1,2,3,4\n");
        let records: Vec<_> = RecordReader::new(file.path())
            .open(0)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records[0]["A"], "1");
        assert_eq!(records[0]["B"], "");
        assert_eq!(records[0]["C"], "");
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1]["C"], "3");
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let file = csv_file("\u{feff}Order ID,Sales\nCA-1,10\n");
        let records = RecordReader::new(file.path()).open(0).unwrap();
        assert_eq!(records.headers()[0], "Order ID");
    }

    #[test]
    fn test_quoted_fields_keep_commas() {
        let file = csv_file("Order ID,Product Name\nCA-1,\"Chair, Black\"\n");
        let record = RecordReader::new(file.path())
            .open(0)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(record["Product Name"], "Chair, Black");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Order ID,Customer Name\nCA-1,Jos\xe9\n").unwrap();
        file.flush().unwrap();

        let record = RecordReader::new(file.path())
            .open(0)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(record["Customer Name"], "Jos\u{fffd}");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_skip_yields_remaining_lines(lines in 0u64..40, skip in 0u64..60) {
            let file = numbered_csv(lines);
            let records: Vec<_> = RecordReader::new(file.path())
                .open(skip)
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();

            let expected = lines.saturating_sub(skip);
            prop_assert_eq!(records.len() as u64, expected);
            if let Some(first) = records.first() {
                prop_assert_eq!(&first["Order ID"], &format!("ORD-{}", skip));
            }
        }
    }
}
