//! Carryover state decoding.
//!
//! The carryover file stores model state in fixed slots, each slot holding
//! every segment's carryover words at that segment's declared word offset.
//! A segment's slice opens with the segment id (verified before anything
//! else is trusted), the slot's creation date, and then a flat run of
//! per-operation entries terminated by an operation-number sentinel of -1
//! or by running out of bytes.

use crate::diagnostics::Diagnostics;
use crate::error::DecodeError;
use crate::segment::operation_name;
use crate::stream::ByteWindow;
use fs5_common::{Ident, JulianDay};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The operation-number sentinel ending a slot's entry run.
pub const END_OF_ENTRIES: i32 = -1;

/// The fewest bytes one entry occupies: number, name, pointer, count, and
/// at least one value word. Empirical; the format does not declare it.
pub const MIN_ENTRY_BYTES: usize = 36;

/// Widest per-entry value count a sane record declares.
const MAX_ENTRY_VALUES: i32 = 2_000;

/// The counters in record 1 of the carryover file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarryoverHeader {
    /// Slots the file was allocated with
    pub n_slots: i32,
    /// Fixed records spanned by one slot
    pub slot_records: i32,
}

impl CarryoverHeader {
    pub fn decode(window: &mut ByteWindow) -> Result<CarryoverHeader, DecodeError> {
        let n_slots = window.read_i32()?;
        let slot_records = window.read_i32()?;
        if !(0..=100).contains(&n_slots) || slot_records < 1 {
            return Err(DecodeError::Truncated {
                what: "carryover header",
            });
        }
        Ok(CarryoverHeader {
            n_slots,
            slot_records,
        })
    }

    /// Byte stride from one slot to the next.
    pub fn slot_stride(&self, record_len: u32) -> u64 {
        u64::from(self.slot_records as u32) * u64::from(record_len)
    }
}

/// One operation's carryover values within a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryoverEntry {
    pub op_number: i32,
    /// Type name from the operation table when the number is in range
    pub op_type: Option<String>,
    /// User name stored alongside the values
    pub op_name: Option<Ident>,
    /// Pointer into the operation's carryover area
    pub co_pointer: i32,
    pub values: Vec<f32>,
}

/// One slot's decoded carryover for a single segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryoverSlot {
    pub slot: i32,
    pub created_day: JulianDay,
    pub created_hour: i32,
    pub entries: Vec<CarryoverEntry>,
}

/// Decodes one segment's slice of one slot.
///
/// The slice window must start at the segment's word offset within the
/// slot. Returns `Ok(None)` when the id read back does not match — the
/// slot holds stale state for a different segment layout.
pub fn decode_slot(
    window: &mut ByteWindow,
    segment_id: &Ident,
    slot: i32,
    diag: &mut Diagnostics,
) -> Result<Option<CarryoverSlot>, DecodeError> {
    let id_bytes = window.read_raw(8)?;
    if Ident::from_field(&id_bytes).as_ref() != Some(segment_id) {
        diag.skipped_carryover_slots += 1;
        return Ok(None);
    }

    let created_day = JulianDay(window.read_i32()?);
    let created_hour = window.read_i32()?;

    let mut entries = Vec::new();
    while window.remaining() >= MIN_ENTRY_BYTES {
        let op_number = window.read_i32()?;
        if op_number == END_OF_ENTRIES {
            break;
        }

        let name_bytes = window.read_raw(8)?;
        let co_pointer = window.read_i32()?;
        let n_values = window.read_i32()?;

        if !(0..=MAX_ENTRY_VALUES).contains(&n_values)
            || window.remaining() < n_values as usize * 4
        {
            warn!(slot, op_number, n_values, "implausible carryover entry ends the slot");
            diag.skipped_carryover_slots += 1;
            break;
        }

        let mut values = Vec::with_capacity(n_values as usize);
        for _ in 0..n_values {
            values.push(window.read_f32()?);
        }

        entries.push(CarryoverEntry {
            op_number,
            op_type: operation_name(op_number).map(str::to_string),
            op_name: Ident::from_field(&name_bytes),
            co_pointer,
            values,
        });
    }

    Ok(Some(CarryoverSlot {
        slot,
        created_day,
        created_hour,
        entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ByteOrder;

    fn entry(op_number: i32, name: &[u8; 8], values: &[f32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&op_number.to_be_bytes());
        bytes.extend_from_slice(name);
        bytes.extend_from_slice(&3i32.to_be_bytes());
        bytes.extend_from_slice(&(values.len() as i32).to_be_bytes());
        for v in values {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes
    }

    fn slot_slice(id: &[u8; 8], entries: &[Vec<u8>]) -> Vec<u8> {
        let mut bytes = id.to_vec();
        bytes.extend_from_slice(&36500i32.to_be_bytes());
        bytes.extend_from_slice(&12i32.to_be_bytes());
        for e in entries {
            bytes.extend(e.clone());
        }
        bytes
    }

    fn decode(bytes: Vec<u8>, id: &str) -> (Option<CarryoverSlot>, Diagnostics) {
        let mut window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let mut diag = Diagnostics::default();
        let slot = decode_slot(&mut window, &Ident::new(id).unwrap(), 0, &mut diag).unwrap();
        (slot, diag)
    }

    #[test]
    fn test_decodes_entries_until_sentinel() {
        let bytes = slot_slice(
            b"BIGHORN ",
            &[
                entry(1, b"UPPER   ", &[0.5, 1.5, 2.5, 3.5]),
                entry(19, b"SNOWBAND", &[10.0]),
                entry(END_OF_ENTRIES, b"        ", &[0.0, 0.0, 0.0, 0.0]),
            ],
        );
        let (slot, diag) = decode(bytes, "BIGHORN");
        let slot = slot.unwrap();

        assert_eq!(slot.created_day, JulianDay(36500));
        assert_eq!(slot.entries.len(), 2);
        assert_eq!(slot.entries[0].op_type.as_deref(), Some("SAC-SMA"));
        assert_eq!(slot.entries[0].values, [0.5, 1.5, 2.5, 3.5]);
        assert_eq!(slot.entries[1].op_type.as_deref(), Some("SNOW-17"));
        assert_eq!(slot.entries[1].op_name.as_ref().unwrap().as_str(), "SNOWBAND");
        assert!(diag.is_clean());
    }

    #[test]
    fn test_short_tail_ends_the_run() {
        // No sentinel: fewer bytes than one entry needs ends the run.
        let mut bytes = slot_slice(b"BIGHORN ", &[entry(1, b"UPPER   ", &[1.0, 2.0, 3.0, 4.0])]);
        bytes.extend_from_slice(&[0u8; 20]); // 20 < MIN_ENTRY_BYTES
        let (slot, _) = decode(bytes, "BIGHORN");

        assert_eq!(slot.unwrap().entries.len(), 1);
    }

    #[test]
    fn test_id_mismatch_skips_the_slot() {
        let bytes = slot_slice(b"OTHERSEG", &[entry(1, b"UPPER   ", &[1.0, 2.0, 3.0, 4.0])]);
        let (slot, diag) = decode(bytes, "BIGHORN");

        assert!(slot.is_none());
        assert_eq!(diag.skipped_carryover_slots, 1);
    }
}
