//! Processed/preprocessor data-type codes.
//!
//! Every time series in the database is keyed by an identifier plus a
//! 4-character data-type code (QIN = instantaneous discharge, MAP = mean
//! areal precipitation, ...). The operation decoder also uses the known-code
//! table to reject runs of accidental ASCII that would otherwise be taken
//! for identifier/data-type triples.

use crate::ident::TypeTag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data-type codes that can appear in parameter arrays and the processed
/// database index. The table is closed: codes outside it are never accepted
/// by the token scanner.
pub const KNOWN_DATA_TYPES: &[&str] = &[
    "AESC", "AIAI", "APIC", "AQME", "DQIN", "DQME", "EA", "FBEL", "FGIX", "FMAP", "INFW", "IQIN",
    "MAP", "MAPE", "MAPS", "MAPX", "MAT", "PELV", "POOL", "PTPX", "QIN", "QME", "RAIM", "RQIM",
    "RQIN", "RQME", "RQOT", "RSEL", "SASC", "SDQI", "SDQM", "SNOG", "SNWE", "SPEL", "SQIN", "SQME",
    "STG", "SWE", "TA", "TAVG", "TMAX", "TMIN", "TWEL", "ZELV",
];

/// A 4-character time-series data-type code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataType(String);

impl DataType {
    /// Builds a data type from its raw on-disk word, accepting only codes
    /// present in [`KNOWN_DATA_TYPES`].
    pub fn from_field(bytes: &[u8]) -> Option<Self> {
        let tag = TypeTag::from_field(bytes)?;
        Self::new(tag.as_str())
    }

    /// Builds a data type from a string, accepting only known codes.
    pub fn new(code: &str) -> Option<Self> {
        let trimmed = code.trim_end();
        if KNOWN_DATA_TYPES.contains(&trimmed) {
            Some(DataType(trimmed.to_string()))
        } else {
            None
        }
    }

    /// Builds a data type without consulting the known-code table.
    ///
    /// Index builders use this: the processed index is authoritative for the
    /// codes it stores, even ones missing from the scanner's table.
    pub fn new_unchecked(code: &str) -> Self {
        DataType(code.trim_end().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The code padded back out to its 4-byte on-disk form.
    pub fn to_field(&self) -> [u8; 4] {
        let mut field = [b' '; 4];
        field[..self.0.len()].copy_from_slice(self.0.as_bytes());
        field
    }

    pub fn is_mapx(&self) -> bool {
        self.0 == "MAPX"
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_accepted() {
        assert_eq!(DataType::from_field(b"QIN ").unwrap().as_str(), "QIN");
        assert_eq!(DataType::from_field(b"MAPX").unwrap().as_str(), "MAPX");
    }

    #[test]
    fn test_unknown_codes_rejected() {
        assert!(DataType::from_field(b"ZZZZ").is_none());
        assert!(DataType::from_field(b"    ").is_none());
    }

    #[test]
    fn test_unchecked_bypasses_table() {
        assert_eq!(DataType::new_unchecked("ZZZZ").as_str(), "ZZZZ");
    }

    #[test]
    fn test_table_is_sorted_and_fits_in_a_word() {
        assert!(KNOWN_DATA_TYPES.windows(2).all(|w| w[0] < w[1]));
        assert!(KNOWN_DATA_TYPES.iter().all(|c| c.len() <= 4));
    }
}
