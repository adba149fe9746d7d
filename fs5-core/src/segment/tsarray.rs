//! The time-series descriptor zone of a segment's parameter array.
//!
//! Each entry opens with an indicator word. Indicator 4 marks an internal
//! series that exists only inside the segment's computation: the entry ends
//! after the interval word. Any other non-zero indicator marks an external
//! series carried in a database file: a 4-character file code, a write
//! indicator, and a self-sized location-info sub-array follow. A zero
//! indicator ends the zone.

use crate::diagnostics::Diagnostics;
use crate::error::DecodeError;
use crate::stream::ByteWindow;
use fs5_common::{DataType, Ident, TypeTag};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Indicator value for an internal series.
pub const INTERNAL_INDICATOR: i32 = 4;

/// Per-segment guard against runaway descriptor loops.
pub const MAX_TS_ENTRIES: usize = 10_000;

/// Widest location-info sub-array a sane entry declares.
const MAX_LOCATION_WORDS: i32 = 100;

/// External storage details for a time-series descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTs {
    pub file_code: TypeTag,
    pub write_indicator: i32,
    pub location_info: Vec<i32>,
}

/// One entry of the time-series descriptor zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsEntry {
    pub indicator: i32,
    pub tsid: Ident,
    pub data_type: DataType,
    pub interval_hours: i32,
    /// `None` for internal series
    pub external: Option<ExternalTs>,
}

impl TsEntry {
    pub fn is_internal(&self) -> bool {
        self.indicator == INTERNAL_INDICATOR
    }
}

/// Decodes the descriptor zone. A malformed entry ends the zone with every
/// prior entry retained; the zone can not be re-synchronized past it.
pub fn decode_ts_zone(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<Vec<TsEntry>, DecodeError> {
    let mut entries = Vec::new();

    while window.remaining() >= 20 {
        if entries.len() >= MAX_TS_ENTRIES {
            warn!(limit = MAX_TS_ENTRIES, "time-series zone guard tripped");
            diag.skipped_time_series += 1;
            break;
        }

        let indicator = window.read_i32()?;
        if indicator == 0 {
            break;
        }

        let id_bytes = window.read_raw(8)?;
        let type_bytes = window.read_raw(4)?;
        let interval_hours = window.read_i32()?;

        let external = if indicator == INTERNAL_INDICATOR {
            None
        } else {
            if window.remaining() < 12 {
                diag.skipped_time_series += 1;
                break;
            }
            let code_bytes = window.read_raw(4)?;
            let write_indicator = window.read_i32()?;
            let n_loc = window.read_i32()?;
            if !(0..=MAX_LOCATION_WORDS).contains(&n_loc)
                || window.remaining() < n_loc as usize * 4
            {
                warn!(n_loc, "implausible location-info length ends the zone");
                diag.skipped_time_series += 1;
                break;
            }
            let mut location_info = Vec::with_capacity(n_loc as usize);
            for _ in 0..n_loc {
                location_info.push(window.read_i32()?);
            }
            let Some(file_code) = TypeTag::from_field(&code_bytes) else {
                diag.skipped_time_series += 1;
                continue;
            };
            Some(ExternalTs {
                file_code,
                write_indicator,
                location_info,
            })
        };

        let (Some(tsid), Some(type_str)) = (
            Ident::from_field(&id_bytes),
            TypeTag::from_field(&type_bytes),
        ) else {
            diag.skipped_time_series += 1;
            continue;
        };

        entries.push(TsEntry {
            indicator,
            tsid,
            data_type: DataType::new_unchecked(type_str.as_str()),
            interval_hours,
            external,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ByteOrder;

    fn internal_entry(id: &[u8; 8], dtype: &[u8; 4], interval: i32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&INTERNAL_INDICATOR.to_be_bytes());
        bytes.extend_from_slice(id);
        bytes.extend_from_slice(dtype);
        bytes.extend_from_slice(&interval.to_be_bytes());
        bytes
    }

    fn external_entry(
        id: &[u8; 8],
        dtype: &[u8; 4],
        interval: i32,
        file_code: &[u8; 4],
        location: &[i32],
    ) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_be_bytes());
        bytes.extend_from_slice(id);
        bytes.extend_from_slice(dtype);
        bytes.extend_from_slice(&interval.to_be_bytes());
        bytes.extend_from_slice(file_code);
        bytes.extend_from_slice(&1i32.to_be_bytes()); // write indicator
        bytes.extend_from_slice(&(location.len() as i32).to_be_bytes());
        for w in location {
            bytes.extend_from_slice(&w.to_be_bytes());
        }
        bytes
    }

    fn decode(bytes: Vec<u8>) -> (Vec<TsEntry>, Diagnostics) {
        let mut window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let mut diag = Diagnostics::default();
        let entries = decode_ts_zone(&mut window, &mut diag).unwrap();
        (entries, diag)
    }

    #[test]
    fn test_internal_and_external_entries() {
        let mut bytes = internal_entry(b"LOCAL   ", b"SQIN", 6);
        bytes.extend(external_entry(b"FTPK    ", b"QIN ", 6, b"FPDB", &[3, 7]));
        let (entries, diag) = decode(bytes);

        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_internal());
        assert!(entries[0].external.is_none());

        let external = entries[1].external.as_ref().unwrap();
        assert_eq!(external.file_code.as_str(), "FPDB");
        assert_eq!(external.location_info, [3, 7]);
        assert!(diag.is_clean());
    }

    #[test]
    fn test_zero_indicator_ends_the_zone() {
        let mut bytes = internal_entry(b"LOCAL   ", b"SQIN", 6);
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend(internal_entry(b"AFTER   ", b"SQIN", 6));
        let (entries, _) = decode(bytes);

        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_implausible_location_length_ends_the_zone() {
        let mut bytes = internal_entry(b"LOCAL   ", b"SQIN", 6);
        bytes.extend(external_entry(b"FTPK    ", b"QIN ", 6, b"FPDB", &[]));
        // Corrupt the location count of the second entry.
        let n_loc_offset = bytes.len() - 4;
        bytes[n_loc_offset..].copy_from_slice(&5_000i32.to_be_bytes());
        let (entries, diag) = decode(bytes);

        assert_eq!(entries.len(), 1);
        assert_eq!(diag.skipped_time_series, 1);
    }
}
