//! Segment decoding: status records and the parameter word array.
//!
//! A segment's status record locates its parameter array and declares the
//! word counts of the array's three zones: the P zone (operation blocks and
//! their parameter sub-arrays), the legacy T zone (skipped in full), and
//! the TS zone (time-series descriptors). The decode is resilient per
//! entity: one bad operation or descriptor is skipped and counted, while a
//! zone-structure violation — an operation block overrunning its zone, or
//! an array shorter than the declared counts — aborts only that segment.

mod operation;
mod optable;
mod tsarray;

pub use operation::{Operation, PoScan, TsBinding, scan_po};
pub use optable::{OPERATION_NAMES, PoLayout, operation_name, po_layout};
pub use tsarray::{ExternalTs, INTERNAL_INDICATOR, TsEntry, decode_ts_zone};

use crate::carryover::CarryoverSlot;
use crate::diagnostics::Diagnostics;
use crate::error::DecodeError;
use crate::stream::{ByteOrder, ByteWindow};
use fs5_common::{Ident, JulianDay};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Per-segment guard against runaway operation chains.
pub const MAX_OPERATIONS: usize = 1_000;

/// Words in one operation block header: the number, the next-block link,
/// and the two 8-character names.
const OP_HEADER_WORDS: usize = 6;

/// The decoded status record of one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStatus {
    pub id: Ident,
    /// Owning forecast group (non-owning back-reference)
    pub forecast_group: Option<Ident>,
    /// Record number of the parameter array
    pub param_record: u32,
    /// P-zone word count
    pub np: i32,
    /// T-zone word count
    pub nt: i32,
    /// TS-zone word count
    pub nts: i32,
    /// Carryover word count
    pub nc: i32,
    /// Word offset of this segment inside a carryover slot
    pub carryover_word_offset: i32,
    /// Position within the owning forecast group
    pub group_position: i32,
    pub description: String,
    pub created_day: JulianDay,
    pub created_hour: i32,
}

impl SegmentStatus {
    /// Decodes a status record window.
    ///
    /// Returns `Ok(None)` for blank records and when the embedded id does
    /// not match `requested` — both mean "not the segment asked for".
    pub fn decode(
        window: &mut ByteWindow,
        requested: Option<&Ident>,
    ) -> Result<Option<SegmentStatus>, DecodeError> {
        let id_bytes = window.read_raw(8)?;
        let Some(id) = Ident::from_field(&id_bytes) else {
            return Ok(None);
        };
        if let Some(requested) = requested {
            if &id != requested {
                return Ok(None);
            }
        }

        let group_bytes = window.read_raw(8)?;
        let forecast_group = Ident::from_field(&group_bytes);
        let param_record = window.read_i32()?;
        let np = window.read_i32()?;
        let nt = window.read_i32()?;
        let nts = window.read_i32()?;
        let nc = window.read_i32()?;
        let carryover_word_offset = window.read_i32()?;
        let group_position = window.read_i32()?;
        let description = window.read_string(20)?;
        let created_day = JulianDay(window.read_i32()?);
        let created_hour = window.read_i32()?;

        // Counts also bound the parameter-array read; implausibly large
        // ones mean a damaged record, not a huge segment.
        const MAX_ZONE_WORDS: i32 = 100_000;
        let count_ok = |v: i32| (0..=MAX_ZONE_WORDS).contains(&v);
        if param_record < 1 || !count_ok(np) || !count_ok(nt) || !count_ok(nts) || !count_ok(nc) {
            return Err(DecodeError::Truncated {
                what: "segment status record",
            });
        }

        Ok(Some(SegmentStatus {
            id,
            forecast_group,
            param_record: param_record as u32,
            np,
            nt,
            nts,
            nc,
            carryover_word_offset,
            group_position,
            description,
            created_day,
            created_hour,
        }))
    }

    /// Total words of the parameter array across all three zones.
    pub fn param_words(&self) -> usize {
        (self.np + self.nt + self.nts) as usize
    }
}

/// A forecast computation unit: ordered operations plus carryover state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: Ident,
    pub forecast_group: Option<Ident>,
    pub description: String,
    pub np: i32,
    pub nt: i32,
    pub nts: i32,
    pub nc: i32,
    pub operations: Vec<Operation>,
    /// Raw descriptors from the TS zone
    pub ts_entries: Vec<TsEntry>,
    /// Carryover slots, filled on demand
    pub carryover: Vec<CarryoverSlot>,
}

impl Segment {
    pub(crate) fn from_status(status: &SegmentStatus, arrays: ParamArrays) -> Self {
        Segment {
            id: status.id.clone(),
            forecast_group: status.forecast_group.clone(),
            description: status.description.clone(),
            np: status.np,
            nt: status.nt,
            nts: status.nts,
            nc: status.nc,
            operations: arrays.operations,
            ts_entries: arrays.ts_entries,
            carryover: Vec::new(),
        }
    }
}

/// The decoded zones of one parameter array.
#[derive(Debug, Default)]
pub struct ParamArrays {
    pub operations: Vec<Operation>,
    pub ts_entries: Vec<TsEntry>,
}

/// Decodes a segment's flat parameter word array.
///
/// The window must hold exactly `np + nt + nts` words; anything else is the
/// word-consumption mismatch that aborts this segment's decode.
pub fn decode_param_array(
    window: &ByteWindow,
    status: &SegmentStatus,
    diag: &mut Diagnostics,
) -> Result<ParamArrays, DecodeError> {
    let declared = status.param_words();
    if window.len() != declared * 4 {
        return Err(DecodeError::WordCountMismatch {
            declared,
            consumed: window.len() / 4,
        });
    }

    let np = status.np as usize;
    let nt = status.nt as usize;
    let nts = status.nts as usize;
    let raw = window.raw();

    let operations = decode_p_zone(&raw[..np * 4], np, window.order(), diag)?;

    // The T zone is legacy and skipped in full; the TS zone follows it.
    let ts_start = (np + nt) * 4;
    let mut ts_window =
        ByteWindow::new_owned(raw[ts_start..ts_start + nts * 4].to_vec(), window.order());
    let ts_entries = decode_ts_zone(&mut ts_window, diag)?;

    Ok(ParamArrays {
        operations,
        ts_entries,
    })
}

/// Walks the chain of operation blocks through the P zone.
fn decode_p_zone(
    p_zone: &[u8],
    np: usize,
    order: ByteOrder,
    diag: &mut Diagnostics,
) -> Result<Vec<Operation>, DecodeError> {
    let word_i32 = |idx: usize| -> Option<i32> {
        let bytes = p_zone.get(idx * 4..idx * 4 + 4)?;
        Some(order.i32_from([bytes[0], bytes[1], bytes[2], bytes[3]]))
    };

    let mut operations = Vec::new();
    let mut block = 0usize;

    loop {
        if operations.len() >= MAX_OPERATIONS {
            warn!(limit = MAX_OPERATIONS, "operation chain guard tripped");
            diag.skipped_operations += 1;
            break;
        }
        if block + OP_HEADER_WORDS > np {
            break;
        }

        let Some(op_number) = word_i32(block) else {
            break;
        };
        if op_number <= 0 {
            break;
        }
        let Some(next_block) = word_i32(block + 1) else {
            break;
        };

        // Resolve this block's parameter sub-array bounds.
        let po_start = block + OP_HEADER_WORDS;
        let po_end = if next_block == 0 {
            np
        } else {
            let next = if next_block > 0 {
                (next_block - 1) as usize
            } else {
                usize::MAX
            };
            if next < po_start || next > np {
                return Err(DecodeError::WordCountMismatch {
                    declared: np,
                    consumed: block,
                });
            }
            next
        };

        let user_name = Ident::from_field(&p_zone[(block + 2) * 4..(block + 4) * 4]);
        let redefinition_name = Ident::from_field(&p_zone[(block + 4) * 4..(block + 6) * 4]);

        match Operation::new(op_number, user_name, redefinition_name) {
            Some(mut op) => {
                let scan = scan_po(&p_zone[po_start * 4..po_end * 4], op_number);
                op.ts_bindings = scan.ts_bindings;
                op.rating_curve_ids = scan.rating_curve_ids;
                operations.push(op);
            }
            None => {
                warn!(op_number, "operation number outside the table, skipping block");
                diag.skipped_operations += 1;
            }
        }

        if next_block == 0 {
            break;
        }
        block = (next_block - 1) as usize;
    }

    Ok(operations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ByteOrder;

    fn put_i32(bytes: &mut [u8], word: usize, value: i32) {
        bytes[word * 4..word * 4 + 4].copy_from_slice(&value.to_be_bytes());
    }

    fn put_text(bytes: &mut [u8], word: usize, text: &[u8]) {
        bytes[word * 4..word * 4 + text.len()].copy_from_slice(text);
    }

    fn status(np: i32, nt: i32, nts: i32) -> SegmentStatus {
        SegmentStatus {
            id: Ident::new("BIGHORN").unwrap(),
            forecast_group: Ident::new("MISSOURI"),
            param_record: 10,
            np,
            nt,
            nts,
            nc: 20,
            carryover_word_offset: 100,
            group_position: 1,
            description: "TEST SEGMENT".to_string(),
            created_day: JulianDay(36500),
            created_hour: 12,
        }
    }

    /// Two chained operations (SAC-SMA then UNIT-HG), a skipped T zone,
    /// and one internal descriptor.
    fn param_array() -> (SegmentStatus, Vec<u8>) {
        let np = 22usize;
        let nt = 3usize;
        let nts = 5usize;
        let mut bytes = vec![b' '; (np + nt + nts) * 4];

        // Block 1 at word 0: SAC-SMA, next block at 1-based word 13.
        put_i32(&mut bytes, 0, 1);
        put_i32(&mut bytes, 1, 13);
        put_text(&mut bytes, 2, b"UPPER   ");
        put_text(&mut bytes, 4, b"        ");
        // PO words 6..12: one reference.
        put_text(&mut bytes, 6, b"FTPK");
        put_text(&mut bytes, 7, b"    ");
        put_text(&mut bytes, 8, b"MAP ");
        put_i32(&mut bytes, 9, 17);
        put_i32(&mut bytes, 10, 0);
        put_i32(&mut bytes, 11, 0);

        // Block 2 at word 12: UNIT-HG, last block.
        put_i32(&mut bytes, 12, 2);
        put_i32(&mut bytes, 13, 0);
        put_text(&mut bytes, 14, b"UPPER   ");
        put_text(&mut bytes, 16, b"        ");
        // PO words 18..22.
        put_text(&mut bytes, 18, b"FTPK");
        put_text(&mut bytes, 19, b"    ");
        put_text(&mut bytes, 20, b"SQIN");
        put_i32(&mut bytes, 21, 0);

        // T zone words 22..25 stay blank (skipped).

        // TS zone at word 25: one internal descriptor.
        put_i32(&mut bytes, 25, INTERNAL_INDICATOR);
        put_text(&mut bytes, 26, b"FTPK    ");
        put_text(&mut bytes, 28, b"SQIN");
        put_i32(&mut bytes, 29, 6);

        (status(np as i32, nt as i32, nts as i32), bytes)
    }

    #[test]
    fn test_chained_operations_decode() {
        let (status, bytes) = param_array();
        let window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let mut diag = Diagnostics::default();

        let arrays = decode_param_array(&window, &status, &mut diag).unwrap();
        assert_eq!(arrays.operations.len(), 2);
        assert_eq!(arrays.operations[0].type_name, "SAC-SMA");
        assert_eq!(arrays.operations[0].user_name.as_ref().unwrap().as_str(), "UPPER");
        assert_eq!(arrays.operations[0].ts_bindings.len(), 1);
        assert_eq!(arrays.operations[0].ts_bindings[0].data_type.as_str(), "MAP");
        assert_eq!(arrays.operations[1].type_name, "UNIT-HG");
        assert_eq!(arrays.operations[1].ts_bindings[0].data_type.as_str(), "SQIN");

        assert_eq!(arrays.ts_entries.len(), 1);
        assert!(arrays.ts_entries[0].is_internal());
        assert!(diag.is_clean());
    }

    #[test]
    fn test_word_count_mismatch_aborts_the_segment() {
        let (status, mut bytes) = param_array();
        bytes.truncate(bytes.len() - 4);
        let window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let mut diag = Diagnostics::default();

        assert!(matches!(
            decode_param_array(&window, &status, &mut diag),
            Err(DecodeError::WordCountMismatch { .. })
        ));
    }

    #[test]
    fn test_block_overrunning_the_zone_aborts() {
        let (status, mut bytes) = param_array();
        // Point block 1's next-block link past the P zone.
        put_i32(&mut bytes, 1, 40);
        let window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let mut diag = Diagnostics::default();

        assert!(matches!(
            decode_param_array(&window, &status, &mut diag),
            Err(DecodeError::WordCountMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_operation_number_skips_one_block() {
        let (status, mut bytes) = param_array();
        // Corrupt block 1's operation number; block 2 must still decode.
        put_i32(&mut bytes, 0, 77);
        let window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let mut diag = Diagnostics::default();

        let arrays = decode_param_array(&window, &status, &mut diag).unwrap();
        assert_eq!(arrays.operations.len(), 1);
        assert_eq!(arrays.operations[0].type_name, "UNIT-HG");
        assert_eq!(diag.skipped_operations, 1);
    }

    #[test]
    fn test_status_decode_and_readback_verification() {
        let mut bytes = vec![0u8; 260];
        bytes[..8].copy_from_slice(b"BIGHORN ");
        bytes[8..16].copy_from_slice(b"MISSOURI");
        let mut word = |idx: usize, v: i32| {
            bytes[idx * 4..idx * 4 + 4].copy_from_slice(&v.to_be_bytes());
        };
        word(4, 10); // param record
        word(5, 22); // np
        word(6, 3); // nt
        word(7, 5); // nts
        word(8, 20); // nc
        word(9, 100); // carryover offset
        word(10, 1); // group position
        bytes[44..64].copy_from_slice(b"BIGHORN RIVER ABV   ");
        let mut word = |idx: usize, v: i32| {
            bytes[idx * 4..idx * 4 + 4].copy_from_slice(&v.to_be_bytes());
        };
        word(16, 36500);
        word(17, 12);

        let mut window = ByteWindow::new_owned(bytes.clone(), ByteOrder::Big);
        let status = SegmentStatus::decode(&mut window, Some(&Ident::new("BIGHORN").unwrap()))
            .unwrap()
            .unwrap();
        assert_eq!(status.np, 22);
        assert_eq!(status.forecast_group.as_ref().unwrap().as_str(), "MISSOURI");
        assert_eq!(status.description, "BIGHORN RIVER ABV");
        assert_eq!(status.param_words(), 30);

        // A different requested id is "not found", not an error.
        let mut window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let miss = SegmentStatus::decode(&mut window, Some(&Ident::new("OTHER").unwrap())).unwrap();
        assert!(miss.is_none());
    }
}
