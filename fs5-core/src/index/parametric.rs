//! The parametric index.
//!
//! Three regions share one file: a header record with the max/type/file
//! counters, a per-type directory sizing each type's record range, and the
//! id entries themselves. The entry region is bounded by file-length
//! arithmetic rather than end-of-file alone, because the format allows
//! trailing short records.

use super::error::{IndexError, Result};
use crate::collections::HashMap;
use crate::diagnostics::Diagnostics;
use crate::registry::FileRole;
use crate::stream::{ByteWindow, RecordStream, StreamError};
use fs5_common::{Ident, TypeTag};
use std::io::{Read, Seek};
use tracing::warn;

const RECORD_LEN: u32 = 16;

/// Byte width of one per-type directory entry (unaligned to the fixed
/// record length; the directory region is read as one virtual record).
const TYPE_DIR_BYTES: usize = 24;

/// Byte width of one id entry.
const ENTRY_BYTES: usize = 16;

/// The counters in record 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParametricIndexHeader {
    pub max_types: i32,
    pub n_types: i32,
    pub n_files: i32,
    pub first_entry_record: i32,
}

/// One per-type directory entry: where a parameter type's records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParametricTypeDir {
    pub type_tag: TypeTag,
    pub logical_unit: i32,
    pub first_record: i32,
    pub last_record: i32,
    pub param_count: i32,
    /// True when the type keeps all its parameters in a single record
    pub single_record: bool,
}

/// One id entry: `{id, type tag}` → parameter record number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParametricIndexEntry {
    pub id: Ident,
    pub type_tag: TypeTag,
    pub record: u32,
}

/// Lookup over the parametric index file.
#[derive(Debug)]
pub struct ParametricIndex {
    pub header: ParametricIndexHeader,
    type_dirs: Vec<ParametricTypeDir>,
    by_tag: HashMap<TypeTag, usize>,
    entries: Vec<ParametricIndexEntry>,
    by_key: HashMap<(Ident, TypeTag), usize>,
}

impl ParametricIndex {
    pub fn build<R: Read + Seek>(
        stream: &mut RecordStream<R>,
        diag: &mut Diagnostics,
    ) -> Result<Self> {
        let mut header_window = stream.record_window(1, RECORD_LEN)?;
        let header = ParametricIndexHeader {
            max_types: header_window.read_i32()?,
            n_types: header_window.read_i32()?,
            n_files: header_window.read_i32()?,
            first_entry_record: header_window.read_i32()?,
        };

        if header.n_types < 0 || header.n_types > header.max_types.max(1000) {
            return Err(IndexError::Header {
                role: FileRole::PreprocessorParametricIndex,
                reason: format!("type count {} out of range", header.n_types),
            });
        }
        if header.first_entry_record < 2 {
            return Err(IndexError::Header {
                role: FileRole::PreprocessorParametricIndex,
                reason: format!("first entry record {}", header.first_entry_record),
            });
        }

        // The type directory is packed after the header without record
        // alignment; read it as one virtual run.
        let mut type_dirs = Vec::with_capacity(header.n_types as usize);
        let mut by_tag = HashMap::default();
        if header.n_types > 0 {
            let mut dir_window =
                stream.virtual_window(2, RECORD_LEN, header.n_types as usize * TYPE_DIR_BYTES)?;
            for _ in 0..header.n_types {
                let tag_bytes = dir_window.read_raw(4)?;
                let logical_unit = dir_window.read_i32()?;
                let first_record = dir_window.read_i32()?;
                let last_record = dir_window.read_i32()?;
                let param_count = dir_window.read_i32()?;
                let single_record = dir_window.read_i32()? != 0;

                let Some(type_tag) = TypeTag::from_field(&tag_bytes) else {
                    diag.malformed_index_entries += 1;
                    continue;
                };
                by_tag.insert(type_tag.clone(), type_dirs.len());
                type_dirs.push(ParametricTypeDir {
                    type_tag,
                    logical_unit,
                    first_record,
                    last_record,
                    param_count,
                    single_record,
                });
            }
        }

        // Bound the entry region by file length, not end-of-file: the file
        // may end with a short record that would otherwise look like damage.
        let file_len = stream.byte_len()?;
        let entry_start = u64::from(header.first_entry_record as u32 - 1) * u64::from(RECORD_LEN);
        let n_entries = file_len.saturating_sub(entry_start) / ENTRY_BYTES as u64;

        let mut entries = Vec::new();
        let mut by_key = HashMap::default();
        stream.seek_record(header.first_entry_record as u32, RECORD_LEN)?;

        for _ in 0..n_entries {
            let bytes = match stream.read_bytes(ENTRY_BYTES) {
                Ok(bytes) => bytes,
                Err(StreamError::EndOfFile { .. }) => break,
                Err(e) => return Err(e.into()),
            };
            let mut window = ByteWindow::new_owned(bytes, stream.order());

            let id_bytes = window.read_raw(8)?;
            let tag_bytes = window.read_raw(4)?;
            let record = window.read_i32()?;

            let (Some(id), Some(type_tag)) = (
                Ident::from_field(&id_bytes),
                TypeTag::from_field(&tag_bytes),
            ) else {
                diag.malformed_index_entries += 1;
                continue;
            };
            if record <= 0 {
                warn!(id = %id, tag = %type_tag, record, "parametric entry with bad record number");
                diag.malformed_index_entries += 1;
                continue;
            }

            by_key.insert((id.clone(), type_tag.clone()), entries.len());
            entries.push(ParametricIndexEntry {
                id,
                type_tag,
                record: record as u32,
            });
        }

        Ok(ParametricIndex {
            header,
            type_dirs,
            by_tag,
            entries,
            by_key,
        })
    }

    /// The entry for an `{id, type tag}` pair.
    pub fn get(&self, id: &Ident, type_tag: &TypeTag) -> Option<&ParametricIndexEntry> {
        self.by_key
            .get(&(id.clone(), type_tag.clone()))
            .map(|&i| &self.entries[i])
    }

    /// The directory entry for a parameter type.
    pub fn type_dir(&self, type_tag: &TypeTag) -> Option<&ParametricTypeDir> {
        self.by_tag.get(type_tag).map(|&i| &self.type_dirs[i])
    }

    pub fn type_dirs(&self) -> &[ParametricTypeDir] {
        &self.type_dirs
    }

    pub fn entries(&self) -> &[ParametricIndexEntry] {
        &self.entries
    }

    /// Ids carrying a given type tag, in file order.
    pub fn ids_of_type<'a>(&'a self, type_tag: &'a TypeTag) -> impl Iterator<Item = &'a Ident> {
        self.entries
            .iter()
            .filter(move |e| &e.type_tag == type_tag)
            .map(|e| &e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
