//! River/reservoir/stream station shapes: RRS and the ORRS order index.
//!
//! The RRS record carries three variable sub-tables sized by counts read
//! earlier in the same record. Their combined byte length is computed by
//! [`rrs_sub_record_bytes`]; the formula is load-bearing — downstream
//! record arithmetic depends on these exact widths — and must not be
//! simplified.

use crate::diagnostics::Diagnostics;
use crate::error::DecodeError;
use crate::stream::ByteWindow;
use fs5_common::{Ident, TypeTag};
use serde::{Deserialize, Serialize};

/// Widest per-type count a sane record declares; anything beyond this is
/// treated as damage rather than decoded.
const MAX_RRS_COUNT: i32 = 50;

/// Hourly fractions per distribution row.
const DIST_FRACTIONS: usize = 24;

/// The combined byte length of the three RRS sub-tables:
/// 8 words per observed type, 2 words per missing-permitted type, 24 words
/// per time distribution.
pub fn rrs_sub_record_bytes(ntype: i32, nmiss: i32, ndist: i32) -> usize {
    (8 * (ntype * 4) + 2 * (nmiss * 4) + 24 * (ndist * 4)) as usize
}

/// One observed data type at an RRS station (8 words).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrsDataTypeEntry {
    pub data_code: TypeTag,
    pub interval_hours: i32,
    pub values_per_obs: i32,
    pub interpolation_flag: i32,
    pub min_discharge: f32,
    pub fraction_flag: i32,
}

/// One missing-data-permitted marker (2 words).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrsMissingEntry {
    pub data_code: TypeTag,
    pub permitted: bool,
}

/// RRS: river/reservoir/stream station parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrsStation {
    pub data_types: Vec<RrsDataTypeEntry>,
    pub missing_permitted: Vec<RrsMissingEntry>,
    /// Per-distribution hourly fractions
    pub distributions: Vec<[f32; DIST_FRACTIONS]>,
}

fn checked_count(value: i32, what: &'static str) -> Result<usize, DecodeError> {
    if (0..=MAX_RRS_COUNT).contains(&value) {
        Ok(value as usize)
    } else {
        Err(DecodeError::Truncated { what })
    }
}

pub(super) fn decode_rrs(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<RrsStation, DecodeError> {
    let ntype = window.read_i32()?;
    let nmiss = window.read_i32()?;
    let ndist = window.read_i32()?;

    let n_types = checked_count(ntype, "RRS data-type table")?;
    let n_miss = checked_count(nmiss, "RRS missing table")?;
    let n_dist = checked_count(ndist, "RRS distribution table")?;

    // The sub-tables must fit in what remains of the record.
    let sub_bytes = rrs_sub_record_bytes(ntype, nmiss, ndist);
    if window.remaining() < sub_bytes {
        return Err(DecodeError::Truncated {
            what: "RRS sub-tables",
        });
    }

    let mut data_types = Vec::with_capacity(n_types);
    for _ in 0..n_types {
        let code_bytes = window.read_raw(4)?;
        let interval_hours = window.read_i32()?;
        let values_per_obs = window.read_i32()?;
        let interpolation_flag = window.read_i32()?;
        let min_discharge = diag.clamp_f32(window.read_f32()?, 0.0, 1.0e7);
        let fraction_flag = window.read_i32()?;
        window.skip_words(2)?; // spare

        let Some(data_code) = TypeTag::from_field(&code_bytes) else {
            diag.malformed_index_entries += 1;
            continue;
        };
        data_types.push(RrsDataTypeEntry {
            data_code,
            interval_hours,
            values_per_obs,
            interpolation_flag,
            min_discharge,
            fraction_flag,
        });
    }

    let mut missing_permitted = Vec::with_capacity(n_miss);
    for _ in 0..n_miss {
        let code_bytes = window.read_raw(4)?;
        let permitted = window.read_i32()? != 0;
        let Some(data_code) = TypeTag::from_field(&code_bytes) else {
            diag.malformed_index_entries += 1;
            continue;
        };
        missing_permitted.push(RrsMissingEntry {
            data_code,
            permitted,
        });
    }

    let mut distributions = Vec::with_capacity(n_dist);
    for _ in 0..n_dist {
        let mut fractions = [0.0f32; DIST_FRACTIONS];
        for slot in &mut fractions {
            *slot = diag.clamp_f32(window.read_f32()?, 0.0, 1.0);
        }
        distributions.push(fractions);
    }

    Ok(RrsStation {
        data_types,
        missing_permitted,
        distributions,
    })
}

/// ORRS: the alphabetic order index over RRS stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RrsAlphaOrder {
    pub station_ids: Vec<Ident>,
}

pub(super) fn decode_orrs(
    window: &mut ByteWindow,
    diag: &mut Diagnostics,
) -> Result<RrsAlphaOrder, DecodeError> {
    let n_stations = window.read_i32()?;
    let n_stations = if n_stations >= 0 {
        n_stations as usize
    } else {
        diag.clamped_values += 1;
        0
    };

    let available = window.remaining() / 8;
    let mut station_ids = Vec::with_capacity(n_stations.min(available));
    for _ in 0..n_stations.min(available) {
        let id_bytes = window.read_raw(8)?;
        if let Some(id) = Ident::from_field(&id_bytes) {
            station_ids.push(id);
        } else {
            diag.malformed_index_entries += 1;
        }
    }

    Ok(RrsAlphaOrder { station_ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{ParametricRecord, decode_record, test_prefix};
    use crate::stream::ByteOrder;

    #[test]
    fn test_sub_record_byte_formula() {
        // The canonical worked example: 96 + 16 + 96.
        assert_eq!(rrs_sub_record_bytes(3, 2, 1), 208);
        assert_eq!(rrs_sub_record_bytes(0, 0, 0), 0);
        assert_eq!(rrs_sub_record_bytes(1, 0, 0), 32);
        assert_eq!(rrs_sub_record_bytes(0, 1, 0), 8);
        assert_eq!(rrs_sub_record_bytes(0, 0, 1), 96);
    }

    fn rrs_fixture(ntype: i32, nmiss: i32, ndist: i32) -> Vec<u8> {
        let mut bytes = test_prefix(0, "FTPK", "RRS");
        for v in [ntype, nmiss, ndist] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        for i in 0..ntype {
            bytes.extend_from_slice(b"STG ");
            for v in [6i32, 1, 1] {
                bytes.extend_from_slice(&v.to_be_bytes());
            }
            bytes.extend_from_slice(&(100.0 * i as f32).to_be_bytes());
            bytes.extend_from_slice(&0i32.to_be_bytes());
            bytes.extend_from_slice(&[0u8; 8]); // spare words
        }
        for _ in 0..nmiss {
            bytes.extend_from_slice(b"QIN ");
            bytes.extend_from_slice(&1i32.to_be_bytes());
        }
        for _ in 0..ndist {
            for hour in 0..24 {
                bytes.extend_from_slice(&(hour as f32 / 24.0).to_be_bytes());
            }
        }
        bytes
    }

    fn decode(bytes: Vec<u8>) -> Result<Option<ParametricRecord>, crate::error::DecodeError> {
        let mut window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let mut diag = Diagnostics::default();
        decode_record(
            &mut window,
            &Ident::new("FTPK").unwrap(),
            &TypeTag::new("RRS").unwrap(),
            &mut diag,
        )
    }

    #[test]
    fn test_rrs_decode() {
        let record = decode(rrs_fixture(3, 2, 1)).unwrap().unwrap();
        let ParametricRecord::RrsStation(rrs) = record else {
            panic!("wrong shape");
        };
        assert_eq!(rrs.data_types.len(), 3);
        assert_eq!(rrs.data_types[0].data_code.as_str(), "STG");
        assert_eq!(rrs.data_types[2].min_discharge, 200.0);
        assert_eq!(rrs.missing_permitted.len(), 2);
        assert!(rrs.missing_permitted[0].permitted);
        assert_eq!(rrs.distributions.len(), 1);
        assert_eq!(rrs.distributions[0][12], 0.5);
    }

    #[test]
    fn test_rrs_truncated_sub_tables_fail_cleanly() {
        let mut bytes = rrs_fixture(3, 2, 1);
        bytes.truncate(bytes.len() - 100);
        assert!(matches!(
            decode(bytes),
            Err(crate::error::DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_orrs_decode() {
        let mut bytes = test_prefix(0, "FTPK", "ORRS");
        bytes.extend_from_slice(&2i32.to_be_bytes());
        bytes.extend_from_slice(b"ALPHA   ");
        bytes.extend_from_slice(b"BRAVO   ");

        let mut window = ByteWindow::new_owned(bytes, ByteOrder::Big);
        let mut diag = Diagnostics::default();
        let record = decode_record(
            &mut window,
            &Ident::new("FTPK").unwrap(),
            &TypeTag::new("ORRS").unwrap(),
            &mut diag,
        )
        .unwrap()
        .unwrap();
        let ParametricRecord::RrsAlphaOrder(orrs) = record else {
            panic!("wrong shape");
        };
        assert_eq!(orrs.station_ids.len(), 2);
        assert_eq!(orrs.station_ids[1].as_str(), "BRAVO");
    }
}
