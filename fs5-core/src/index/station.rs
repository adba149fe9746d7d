//! The preprocessor station index.
//!
//! The file opens with a header record and one directory record per data
//! class, then packs station entries back to back without record alignment.
//! Each station entry self-declares its length in its leading word: the
//! station id follows, then one record pointer per data class, then any
//! additional-type pointers. An implausible declared length marks a
//! desynchronized entry; the reader re-aligns to the next fixed record
//! boundary and keeps going rather than aborting.

use super::error::{IndexError, Result};
use crate::collections::HashMap;
use crate::diagnostics::Diagnostics;
use crate::registry::FileRole;
use crate::stream::{ByteWindow, RecordStream};
use fs5_common::{Ident, TypeTag};
use std::io::{Read, Seek};
use std::ops::RangeInclusive;
use tracing::warn;

const RECORD_LEN: u32 = 64;

/// Word counts a station entry can plausibly declare: the leading word,
/// the two id words, and up to four records' worth of pointers.
const PLAUSIBLE_ENTRY_WORDS: RangeInclusive<i32> = 3..=64;

/// The counters in record 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationIndexHeader {
    pub n_stations: i32,
    pub n_dataclasses: i32,
    pub first_station_record: i32,
}

/// One per-data-class directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataclassDir {
    pub dataclass: TypeTag,
    pub logical_unit: i32,
    pub first_record: i32,
    pub last_record: i32,
    pub station_count: i32,
}

/// One station entry: a record pointer per data class, plus any
/// additional-type pointers the entry declared beyond them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationIndexEntry {
    pub station_id: Ident,
    pub dataclass_pointers: Vec<i32>,
    pub additional_pointers: Vec<i32>,
}

/// Lookup over the preprocessor station index.
#[derive(Debug)]
pub struct PreprocessorStationIndex {
    pub header: StationIndexHeader,
    dataclasses: Vec<DataclassDir>,
    entries: Vec<StationIndexEntry>,
    by_id: HashMap<Ident, usize>,
}

impl PreprocessorStationIndex {
    pub fn build<R: Read + Seek>(
        stream: &mut RecordStream<R>,
        diag: &mut Diagnostics,
    ) -> Result<Self> {
        let mut header_window = stream.record_window(1, RECORD_LEN)?;
        let header = StationIndexHeader {
            n_stations: header_window.read_i32()?,
            n_dataclasses: header_window.read_i32()?,
            first_station_record: header_window.read_i32()?,
        };

        if !(0..=100).contains(&header.n_dataclasses) {
            return Err(IndexError::Header {
                role: FileRole::PreprocessorIndex,
                reason: format!("data class count {}", header.n_dataclasses),
            });
        }
        if header.first_station_record < 2 {
            return Err(IndexError::Header {
                role: FileRole::PreprocessorIndex,
                reason: format!("first station record {}", header.first_station_record),
            });
        }

        // One directory record per data class, each in its own fixed record.
        let mut dataclasses = Vec::with_capacity(header.n_dataclasses as usize);
        for i in 0..header.n_dataclasses {
            let mut window = stream.record_window(2 + i as u32, RECORD_LEN)?;
            let class_bytes = window.read_raw(4)?;
            let logical_unit = window.read_i32()?;
            let first_record = window.read_i32()?;
            let last_record = window.read_i32()?;
            let station_count = window.read_i32()?;

            let Some(dataclass) = TypeTag::from_field(&class_bytes) else {
                diag.malformed_index_entries += 1;
                continue;
            };
            dataclasses.push(DataclassDir {
                dataclass,
                logical_unit,
                first_record,
                last_record,
                station_count,
            });
        }

        // The station region is packed; pull it into one window and walk it
        // with explicit re-alignment on damage.
        let file_len = stream.byte_len()?;
        let region_start = u64::from(header.first_station_record as u32 - 1) * u64::from(RECORD_LEN);
        let region_len = file_len.saturating_sub(region_start) as usize;

        let mut entries = Vec::new();
        let mut by_id = HashMap::default();

        if region_len >= 4 {
            let window = stream.virtual_window(
                header.first_station_record as u32,
                RECORD_LEN,
                region_len,
            )?;
            Self::scan_station_region(
                window,
                header.n_dataclasses as usize,
                &mut entries,
                &mut by_id,
                diag,
            );
        }

        Ok(PreprocessorStationIndex {
            header,
            dataclasses,
            entries,
            by_id,
        })
    }

    fn scan_station_region(
        mut window: ByteWindow,
        n_dataclasses: usize,
        entries: &mut Vec<StationIndexEntry>,
        by_id: &mut HashMap<Ident, usize>,
        diag: &mut Diagnostics,
    ) {
        while window.remaining() >= 4 {
            let entry_start = window.position();
            let nwords = match window.read_i32() {
                Ok(v) => v,
                Err(_) => break,
            };

            // A zero word count marks the end of the populated region.
            if nwords == 0 {
                break;
            }

            if !PLAUSIBLE_ENTRY_WORDS.contains(&nwords) {
                warn!(
                    nwords,
                    offset = entry_start,
                    "implausible station entry length, re-aligning to next record"
                );
                diag.desynchronized_stations += 1;
                let next_boundary = (entry_start / RECORD_LEN as usize + 1) * RECORD_LEN as usize;
                if next_boundary >= window.len() {
                    break;
                }
                window.set_position(next_boundary);
                continue;
            }

            let entry_bytes = nwords as usize * 4;
            if window.remaining() + 4 < entry_bytes {
                // Truncated trailing entry; keep what we have.
                break;
            }

            let id_bytes = match window.read_raw(8) {
                Ok(b) => b,
                Err(_) => break,
            };
            let pointer_words = nwords as usize - 3;
            let mut pointers = Vec::with_capacity(pointer_words);
            let mut truncated = false;
            for _ in 0..pointer_words {
                match window.read_i32() {
                    Ok(v) => pointers.push(v),
                    Err(_) => {
                        truncated = true;
                        break;
                    }
                }
            }
            if truncated {
                break;
            }

            let Some(station_id) = Ident::from_field(&id_bytes) else {
                diag.malformed_index_entries += 1;
                continue;
            };

            let split = pointer_words.min(n_dataclasses);
            let additional_pointers = pointers.split_off(split);
            by_id.insert(station_id.clone(), entries.len());
            entries.push(StationIndexEntry {
                station_id,
                dataclass_pointers: pointers,
                additional_pointers,
            });
        }
    }

    /// The entry for a station id.
    pub fn get(&self, station_id: &Ident) -> Option<&StationIndexEntry> {
        self.by_id.get(station_id).map(|&i| &self.entries[i])
    }

    pub fn dataclasses(&self) -> &[DataclassDir] {
        &self.dataclasses
    }

    pub fn entries(&self) -> &[StationIndexEntry] {
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

    fn station_entry(id: &[u8; 8], pointers: &[i32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&((3 + pointers.len()) as i32).to_be_bytes());
        bytes.extend_from_slice(id);
        for p in pointers {
            bytes.extend_from_slice(&p.to_be_bytes());
        }
        bytes
    }

    fn fixture_with(entries: &[Vec<u8>]) -> Vec<u8> {
        let mut bytes = Vec::new();
        // Header: 2 stations, 2 data classes, stations at record 4.
        for v in [2i32, 2, 4] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.resize(64, 0);
        // Data class directories, one record each.
        for (class, unit) in [(b"PCPN", 1i32), (b"TEMP", 2)] {
            let mut rec = Vec::new();
            rec.extend_from_slice(class);
            for v in [unit, 1, 50, 25] {
                rec.extend_from_slice(&v.to_be_bytes());
            }
            rec.resize(64, 0);
            bytes.extend(rec);
        }
        for e in entries {
            bytes.extend(e.clone());
        }
        bytes
    }

    fn build_from(bytes: Vec<u8>) -> (PreprocessorStationIndex, Diagnostics) {
        let mut stream = RecordStream::new(Cursor::new(bytes), ByteOrder::Big);
        let mut diag = Diagnostics::default();
        let index = PreprocessorStationIndex::build(&mut stream, &mut diag).unwrap();
        (index, diag)
    }

    #[test]
    fn test_self_declared_entry_lengths() {
        let bytes = fixture_with(&[
            station_entry(b"BILLINGS", &[10, 20]),
            station_entry(b"CODY    ", &[11, 21, 7, 8]),
        ]);
        let (index, diag) = build_from(bytes);

        assert_eq!(index.len(), 2);
        let billings = index.get(&Ident::new("BILLINGS").unwrap()).unwrap();
        assert_eq!(billings.dataclass_pointers, [10, 20]);
        assert!(billings.additional_pointers.is_empty());

        let cody = index.get(&Ident::new("CODY").unwrap()).unwrap();
        assert_eq!(cody.dataclass_pointers, [11, 21]);
        assert_eq!(cody.additional_pointers, [7, 8]);
        assert!(diag.is_clean());
    }

    #[test]
    fn test_desynchronized_entry_realigns_to_next_record() {
        let mut garbage = Vec::new();
        garbage.extend_from_slice(&900_000i32.to_be_bytes());
        garbage.resize(64, 0xAA); // fill the rest of the damaged record

        let bytes = fixture_with(&[garbage, station_entry(b"CODY    ", &[11, 21])]);
        let (index, diag) = build_from(bytes);

        assert_eq!(diag.desynchronized_stations, 1);
        assert_eq!(index.len(), 1);
        assert!(index.get(&Ident::new("CODY").unwrap()).is_some());
    }

    #[test]
    fn test_dataclass_directories() {
        let (index, _) = build_from(fixture_with(&[]));
        assert_eq!(index.dataclasses().len(), 2);
        assert_eq!(index.dataclasses()[0].dataclass.as_str(), "PCPN");
        assert_eq!(index.dataclasses()[1].logical_unit, 2);
    }
}
