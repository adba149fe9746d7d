//! The rating-curve pointer index.
//!
//! Record 1 of the pointer file carries three global counters; every later
//! record is one `{8-char id, 4-byte record number}` pair addressing the
//! curve's definition record in the rating-curve file. Blank or malformed
//! ids are skipped, not stored.

use super::error::Result;
use crate::collections::HashMap;
use crate::diagnostics::Diagnostics;
use crate::stream::{ByteWindow, RecordStream, StreamError};
use fs5_common::Ident;
use std::io::{Read, Seek};
use tracing::warn;

/// The three global counters in record 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingPointerHeader {
    pub n_curves: i32,
    pub max_records: i32,
    pub next_free_record: i32,
}

/// id → definition-record lookup over the rating-curve pointer file.
#[derive(Debug)]
pub struct RatingCurveIndex {
    pub header: RatingPointerHeader,
    entries: Vec<(Ident, u32)>,
    by_id: HashMap<Ident, u32>,
}

impl RatingCurveIndex {
    /// Reads the pointer file start-to-end. End-of-file, including a
    /// truncated trailing record, completes the enumeration.
    pub fn build<R: Read + Seek>(
        stream: &mut RecordStream<R>,
        diag: &mut Diagnostics,
    ) -> Result<Self> {
        let mut header_window = stream.record_window(1, 12)?;
        let header = RatingPointerHeader {
            n_curves: header_window.read_i32()?,
            max_records: header_window.read_i32()?,
            next_free_record: header_window.read_i32()?,
        };

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
                warn!(id = %id, record, "rating-curve pointer with bad record number");
                diag.malformed_index_entries += 1;
                continue;
            }

            by_id.insert(id.clone(), record as u32);
            entries.push((id, record as u32));
        }

        Ok(RatingCurveIndex {
            header,
            entries,
            by_id,
        })
    }

    /// The definition record number for a curve id.
    pub fn get(&self, id: &Ident) -> Option<u32> {
        self.by_id.get(id).copied()
    }

    /// Curve ids in file order.
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
