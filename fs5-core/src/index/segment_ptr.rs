//! The segment pointer index.
//!
//! Two header records carry the segment/record/word counters; every later
//! record is one `{8-char id, 4-byte record number}` pair addressing the
//! segment's status record.

use super::error::Result;
use crate::collections::HashMap;
use crate::diagnostics::Diagnostics;
use crate::stream::{ByteWindow, RecordStream, StreamError};
use fs5_common::Ident;
use std::io::{Read, Seek};
use tracing::warn;

/// The counters spread over the two header records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPointerHeader {
    pub n_segments: i32,
    pub n_records: i32,
    pub n_words: i32,
    pub max_records: i32,
    pub next_free_record: i32,
}

/// id → status-record lookup over the segment pointer file.
#[derive(Debug)]
pub struct SegmentPointerIndex {
    pub header: SegmentPointerHeader,
    entries: Vec<(Ident, u32)>,
    by_id: HashMap<Ident, u32>,
}

impl SegmentPointerIndex {
    pub fn build<R: Read + Seek>(
        stream: &mut RecordStream<R>,
        diag: &mut Diagnostics,
    ) -> Result<Self> {
        let mut first = stream.record_window(1, 12)?;
        let n_segments = first.read_i32()?;
        let n_records = first.read_i32()?;
        let n_words = first.read_i32()?;

        let mut second = stream.record_window(2, 12)?;
        let max_records = second.read_i32()?;
        let next_free_record = second.read_i32()?;

        let header = SegmentPointerHeader {
            n_segments,
            n_records,
            n_words,
            max_records,
            next_free_record,
        };

        // Entries follow the second header record.
        stream.seek_record(3, 12)?;

        let mut entries = Vec::new();
        let mut by_id = HashMap::default();

        loop {
            let bytes = match stream.read_bytes(12) {
                Ok(bytes) => bytes,
                Err(StreamError::EndOfFile { .. }) => break,
                Err(e) => return Err(e.into()),
            };
            let mut window = ByteWindow::new_owned(bytes, stream.order());

            let id_bytes = window.read_raw(8)?;
            let record = window.read_i32()?;

            let Some(id) = Ident::from_field(&id_bytes) else {
                diag.malformed_index_entries += 1;
                continue;
            };
            if record <= 0 {
                warn!(id = %id, record, "segment pointer with bad record number");
                diag.malformed_index_entries += 1;
                continue;
            }

            by_id.insert(id.clone(), record as u32);
            entries.push((id, record as u32));
        }

        Ok(SegmentPointerIndex {
            header,
            entries,
            by_id,
        })
    }

    /// The status record number for a segment id.
    pub fn get(&self, id: &Ident) -> Option<u32> {
        self.by_id.get(id).copied()
    }

    /// Segment ids in file order.
    pub fn ids(&self) -> impl Iterator<Item = &Ident> {
        self.entries.iter().map(|(id, _)| id)
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

    fn build_from(bytes: Vec<u8>) -> (SegmentPointerIndex, Diagnostics) {
        let mut stream = RecordStream::new(Cursor::new(bytes), ByteOrder::Big);
        let mut diag = Diagnostics::default();
        let index = SegmentPointerIndex::build(&mut stream, &mut diag).unwrap();
        (index, diag)
    }

    #[test]
    fn test_two_header_records_then_entries() {
        let mut bytes = Vec::new();
        for counter in [3i32, 3, 195, 1000, 5, 0] {
            bytes.extend_from_slice(&counter.to_be_bytes());
        }
        bytes.extend_from_slice(b"BIGHORN ");
        bytes.extend_from_slice(&1i32.to_be_bytes());
        bytes.extend_from_slice(b"SHOSHONE");
        bytes.extend_from_slice(&2i32.to_be_bytes());

        let (index, diag) = build_from(bytes);
        assert_eq!(index.header.n_segments, 3);
        assert_eq!(index.header.max_records, 1000);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&Ident::new("BIGHORN").unwrap()), Some(1));
        assert_eq!(index.get(&Ident::new("SHOSHONE").unwrap()), Some(2));
        assert!(diag.is_clean());
    }

    #[test]
    fn test_ids_keep_file_order() {
        let mut bytes = vec![0u8; 24];
        bytes.extend_from_slice(b"ZULU    ");
        bytes.extend_from_slice(&7i32.to_be_bytes());
        bytes.extend_from_slice(b"ALPHA   ");
        bytes.extend_from_slice(&8i32.to_be_bytes());

        let (index, _) = build_from(bytes);
        let ids: Vec<&str> = index.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, ["ZULU", "ALPHA"]);
    }
}
