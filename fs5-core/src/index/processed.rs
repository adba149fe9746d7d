//! The processed-time-series index.
//!
//! Record 1 carries the global counters; every later record is one
//! `{8-char tsid, 4-char data type, 4-byte record number}` entry addressing
//! the series' header record inside its logical unit's data file.

use super::error::Result;
use crate::collections::HashMap;
use crate::diagnostics::Diagnostics;
use crate::stream::{ByteWindow, RecordStream, StreamError};
use fs5_common::{DataType, Ident, TypeTag};
use std::io::{Read, Seek};

const RECORD_LEN: u32 = 16;

/// One index entry for a processed time series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedTsPointer {
    pub tsid: Ident,
    pub data_type: DataType,
    pub record: u32,
}

/// `{tsid, data type}` → header-record lookup over the processed index.
#[derive(Debug)]
pub struct ProcessedTsIndex {
    pub n_series: i32,
    pub max_records: i32,
    entries: Vec<ProcessedTsPointer>,
    by_key: HashMap<(Ident, DataType), usize>,
}

impl ProcessedTsIndex {
    pub fn build<R: Read + Seek>(
        stream: &mut RecordStream<R>,
        diag: &mut Diagnostics,
    ) -> Result<Self> {
        let mut header_window = stream.record_window(1, RECORD_LEN)?;
        let n_series = header_window.read_i32()?;
        let max_records = header_window.read_i32()?;

        let mut entries = Vec::new();
        let mut by_key = HashMap::default();

        loop {
            let bytes = match stream.read_bytes(RECORD_LEN as usize) {
                Ok(bytes) => bytes,
                Err(StreamError::EndOfFile { .. }) => break,
                Err(e) => return Err(e.into()),
            };
            let mut window = ByteWindow::new_owned(bytes, stream.order());

            let id_bytes = window.read_raw(8)?;
            let type_bytes = window.read_raw(4)?;
            let record = window.read_i32()?;

            let Some(tsid) = Ident::from_field(&id_bytes) else {
                diag.malformed_index_entries += 1;
                continue;
            };
            // The index is authoritative for its own data-type codes, so
            // unknown codes are stored rather than rejected.
            let Some(type_str) = TypeTag::from_field(&type_bytes) else {
                diag.malformed_index_entries += 1;
                continue;
            };
            let data_type = DataType::new_unchecked(type_str.as_str());
            if record <= 0 {
                diag.malformed_index_entries += 1;
                continue;
            }

            by_key.insert((tsid.clone(), data_type.clone()), entries.len());
            entries.push(ProcessedTsPointer {
                tsid,
                data_type,
                record: record as u32,
            });
        }

        Ok(ProcessedTsIndex {
            n_series,
            max_records,
            entries,
            by_key,
        })
    }

    /// The header record number for a `{tsid, data type}` pair.
    pub fn get(&self, tsid: &Ident, data_type: &DataType) -> Option<u32> {
        self.by_key
            .get(&(tsid.clone(), data_type.clone()))
            .map(|&i| self.entries[i].record)
    }

    pub fn entries(&self) -> &[ProcessedTsPointer] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ByteOrder;
    use std::io::Cursor;

    fn entry(id: &[u8; 8], dtype: &[u8; 4], record: i32) -> Vec<u8> {
        let mut bytes = id.to_vec();
        bytes.extend_from_slice(dtype);
        bytes.extend_from_slice(&record.to_be_bytes());
        bytes
    }

    #[test]
    fn test_enumerates_to_end_of_file() {
        let mut bytes = Vec::new();
        for v in [2i32, 300, 0, 0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend(entry(b"FTPK    ", b"QIN ", 5));
        bytes.extend(entry(b"FTPK    ", b"QME ", 9));

        let mut stream = RecordStream::new(Cursor::new(bytes), ByteOrder::Big);
        let mut diag = Diagnostics::default();
        let index = ProcessedTsIndex::build(&mut stream, &mut diag).unwrap();

        assert_eq!(index.n_series, 2);
        assert_eq!(index.len(), 2);
        let ftpk = Ident::new("FTPK").unwrap();
        assert_eq!(index.get(&ftpk, &DataType::new("QIN").unwrap()), Some(5));
        assert_eq!(index.get(&ftpk, &DataType::new("QME").unwrap()), Some(9));
        assert!(diag.is_clean());
    }

    #[test]
    fn test_unknown_data_type_codes_are_kept() {
        let mut bytes = vec![0u8; 16];
        bytes.extend(entry(b"XYZ     ", b"ZZQ ", 2));

        let mut stream = RecordStream::new(Cursor::new(bytes), ByteOrder::Big);
        let mut diag = Diagnostics::default();
        let index = ProcessedTsIndex::build(&mut stream, &mut diag).unwrap();

        assert_eq!(
            index.get(&Ident::new("XYZ").unwrap(), &DataType::new_unchecked("ZZQ")),
            Some(2)
        );
    }
}
