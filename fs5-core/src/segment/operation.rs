//! Operations and the parameter sub-array token scan.
//!
//! The general scanning rule: walk the sub-array left to right in 4-byte
//! tokens; a run of 3 consecutive well-formed text tokens is taken as a
//! two-word time-series identifier followed by a one-word data-type code —
//! but only when that code is in the known data-type table, which rejects
//! runs of accidental ASCII. After a match the scan jumps past all three
//! consumed tokens so they can never re-match.

use super::optable::{PoLayout, operation_name, po_layout};
use crate::timeseries::TimeSeries;
use fs5_common::ident::is_text_word;
use fs5_common::{DataType, Ident};
use serde::{Deserialize, Serialize};

/// A time-series reference named inside an operation's parameter sub-array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TsBinding {
    pub tsid: Ident,
    pub data_type: DataType,
}

/// One computational step within a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub number: i32,
    /// Type name from the fixed operation table
    pub type_name: String,
    pub user_name: Option<Ident>,
    pub redefinition_name: Option<Ident>,
    pub rating_curve_ids: Vec<Ident>,
    /// References named by the parameter sub-array
    pub ts_bindings: Vec<TsBinding>,
    /// Series resolved for those references; filled by the session
    pub time_series: Vec<TimeSeries>,
}

impl Operation {
    pub(super) fn new(
        number: i32,
        user_name: Option<Ident>,
        redefinition_name: Option<Ident>,
    ) -> Option<Self> {
        let type_name = operation_name(number)?.to_string();
        Some(Operation {
            number,
            type_name,
            user_name,
            redefinition_name,
            rating_curve_ids: Vec::new(),
            ts_bindings: Vec::new(),
            time_series: Vec::new(),
        })
    }

    /// True when the sub-array named this `{id, data type}` pair.
    pub fn binds(&self, tsid: &Ident, data_type: &DataType) -> bool {
        self.ts_bindings
            .iter()
            .any(|b| &b.tsid == tsid && &b.data_type == data_type)
    }
}

/// What a parameter sub-array scan produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PoScan {
    pub ts_bindings: Vec<TsBinding>,
    pub rating_curve_ids: Vec<Ident>,
}

/// Scans one operation's parameter sub-array for embedded identifiers.
///
/// `po` is the raw sub-array; a trailing partial word is ignored. The
/// operation number selects the scanning rule.
pub fn scan_po(po: &[u8], op_number: i32) -> PoScan {
    let words: Vec<&[u8]> = po.chunks_exact(4).collect();
    let mut scan = PoScan::default();

    let start = match po_layout(op_number) {
        PoLayout::NoIdentifiers => return scan,
        PoLayout::General => 0,
        PoLayout::SkipLeadingWord => 1,
        PoLayout::RatingCurveFirst => {
            if words.len() >= 2 {
                let mut id_bytes = [0u8; 8];
                id_bytes[..4].copy_from_slice(words[0]);
                id_bytes[4..].copy_from_slice(words[1]);
                if let Some(id) = Ident::from_field(&id_bytes) {
                    scan.rating_curve_ids.push(id);
                }
            }
            2
        }
    };

    let mut i = start;
    while i + 3 <= words.len() {
        let run_is_text =
            is_text_word(words[i]) && is_text_word(words[i + 1]) && is_text_word(words[i + 2]);
        if run_is_text {
            if let Some(data_type) = DataType::from_field(words[i + 2]) {
                let mut id_bytes = [0u8; 8];
                id_bytes[..4].copy_from_slice(words[i]);
                id_bytes[4..].copy_from_slice(words[i + 1]);
                if let Some(tsid) = Ident::from_field(&id_bytes) {
                    scan.ts_bindings.push(TsBinding { tsid, data_type });
                    // Jump past every consumed token.
                    i += 3;
                    continue;
                }
            }
        }
        i += 1;
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&[u8; 4]]) -> Vec<u8> {
        items.iter().flat_map(|w| w.iter().copied()).collect()
    }

    #[test]
    fn test_general_scan_finds_triples() {
        let po = words(&[
            &1f32.to_be_bytes(),
            b"FTPK",
            b"    ",
            b"QIN ",
            &42i32.to_be_bytes(),
        ]);
        let scan = scan_po(&po, 1);

        assert_eq!(scan.ts_bindings.len(), 1);
        assert_eq!(scan.ts_bindings[0].tsid.as_str(), "FTPK");
        assert_eq!(scan.ts_bindings[0].data_type.as_str(), "QIN");
    }

    #[test]
    fn test_unknown_data_type_rejects_the_run() {
        // Three text tokens whose third word is not a known data type:
        // spurious ASCII, not a reference.
        let po = words(&[b"FTPK", b"    ", b"XYZW"]);
        let scan = scan_po(&po, 1);
        assert!(scan.ts_bindings.is_empty());
    }

    #[test]
    fn test_match_skips_consumed_tokens() {
        // Two adjacent references decode independently; the second must not
        // be shifted by re-matching inside the first.
        let po = words(&[b"FTPK", b"    ", b"QIN ", b"GAPT", b"1   ", b"QME "]);
        let scan = scan_po(&po, 1);

        assert_eq!(scan.ts_bindings.len(), 2);
        assert_eq!(scan.ts_bindings[0].tsid.as_str(), "FTPK");
        assert_eq!(scan.ts_bindings[1].tsid.as_str(), "GAPT1");
        assert_eq!(scan.ts_bindings[1].data_type.as_str(), "QME");
    }

    #[test]
    fn test_skip_leading_word_layouts_ignore_index_zero() {
        // Word 0 is a control word that aliases ASCII. Under the general
        // rule it would seed a spurious triple; the special-cased
        // operations start at word 1 and extract only the real reference.
        let po = words(&[b"X123", b"4567", b"QIN ", b"FTPK", b"    ", b"QME "]);
        for op in [6, 7, 8, 10] {
            let scan = scan_po(&po, op);
            assert_eq!(scan.ts_bindings.len(), 1, "op {op}");
            assert_eq!(scan.ts_bindings[0].tsid.as_str(), "FTPK");
            assert_eq!(scan.ts_bindings[0].data_type.as_str(), "QME");
        }

        let general = scan_po(&po, 1);
        assert_eq!(general.ts_bindings.len(), 2);
        assert_eq!(general.ts_bindings[0].tsid.as_str(), "X1234567");
    }

    #[test]
    fn test_rating_curve_first_layouts() {
        let po = words(&[b"FTPK", b"RC  ", b"BILL", b"INGS", b"STG "]);
        for op in [23, 25] {
            let scan = scan_po(&po, op);
            assert_eq!(scan.rating_curve_ids.len(), 1, "op {op}");
            assert_eq!(scan.rating_curve_ids[0].as_str(), "FTPKRC");
            assert_eq!(scan.ts_bindings.len(), 1);
            assert_eq!(scan.ts_bindings[0].tsid.as_str(), "BILLINGS");
        }
    }

    #[test]
    fn test_no_identifier_layouts_extract_nothing() {
        let po = words(&[b"FTPK", b"    ", b"QIN ", b"STG ", b"MAP "]);
        for op in [30, 32] {
            let scan = scan_po(&po, op);
            assert!(scan.ts_bindings.is_empty(), "op {op}");
            assert!(scan.rating_curve_ids.is_empty());
        }
    }

    #[test]
    fn test_numeric_words_never_match() {
        let mut po = Vec::new();
        for v in [1.5f32, 2.5, 3.5, 4.5] {
            po.extend_from_slice(&v.to_be_bytes());
        }
        assert!(scan_po(&po, 1).ts_bindings.is_empty());
    }
}
