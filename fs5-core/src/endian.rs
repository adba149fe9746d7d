//! Byte-order detection for a database directory.
//!
//! The format carries no byte-order marker, but the first word of an index
//! header is a small record or entry count. Reading that word both ways and
//! asking which interpretation is plausible identifies the order the
//! database was written in. A single file can produce a false positive, so
//! a second, independent file is consulted before concluding big-endian.

use crate::registry::{FileRegistry, FileRole, RegistryError};
use crate::stream::{ByteOrder, StreamError};
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::{debug, warn};

/// The value range a leading index-header count plausibly occupies.
///
/// Real databases keep these counts in the hundreds to low thousands; the
/// byte-swapped reading of such a count lands in the hundreds of millions.
pub const PLAUSIBLE_COUNT_RANGE: RangeInclusive<i32> = 1..=65_536;

/// The two files probed, in order. Both are index files whose first word is
/// a count, and they are written by independent parts of the runtime.
const PROBE_ROLES: [FileRole; 2] = [
    FileRole::ProcessedIndex,
    FileRole::PreprocessorParametricIndex,
];

/// Errors raised while probing the byte order.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("probe file too short: {0}")]
    Stream(#[from] StreamError),
}

pub type Result<T> = std::result::Result<T, ProbeError>;

#[inline]
fn plausible(value: i32) -> bool {
    PLAUSIBLE_COUNT_RANGE.contains(&value)
}

fn leading_word(registry: &mut FileRegistry, role: FileRole) -> Result<[u8; 4]> {
    let logical = registry.open_or_rewind(role, false)?;
    let mut stream = logical.stream(ByteOrder::Big);
    let bytes = stream.read_bytes(4)?;
    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Determines the byte order of the database behind `registry`.
///
/// The primary file's leading word is decoded both ways. A plausible
/// little-endian reading settles the question; a plausible big-endian
/// reading is confirmed against the secondary file first, because one
/// swapped count can alias into range. When neither reading is plausible
/// the database is flagged big-endian and a warning is logged.
pub fn probe(registry: &mut FileRegistry) -> Result<ByteOrder> {
    let word = leading_word(registry, PROBE_ROLES[0])?;
    let little = ByteOrder::Little.i32_from(word);
    let big = ByteOrder::Big.i32_from(word);

    if plausible(little) {
        debug!(value = little, "byte-order probe: little-endian");
        return Ok(ByteOrder::Little);
    }

    if plausible(big) {
        // Confirm against the independent secondary file before concluding.
        let word2 = leading_word(registry, PROBE_ROLES[1])?;
        let little2 = ByteOrder::Little.i32_from(word2);
        let big2 = ByteOrder::Big.i32_from(word2);

        if plausible(big2) {
            debug!(value = big, "byte-order probe: big-endian, confirmed");
            return Ok(ByteOrder::Big);
        }
        if plausible(little2) {
            debug!(
                primary = big,
                secondary = little2,
                "byte-order probe: secondary file contradicts big-endian"
            );
            return Ok(ByteOrder::Little);
        }
        return Ok(ByteOrder::Big);
    }

    warn!(
        le = little,
        be = big,
        "byte-order probe: no plausible reading, flagging database big-endian"
    );
    Ok(ByteOrder::Big)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_probe_files(dir: &std::path::Path, primary: [u8; 4], secondary: [u8; 4]) {
        for (role, word) in PROBE_ROLES.iter().zip([primary, secondary]) {
            let mut f = std::fs::File::create(dir.join(role.filename())).unwrap();
            f.write_all(&word).unwrap();
        }
    }

    #[test]
    fn test_native_little_endian_count_detected() {
        let dir = tempfile::tempdir().unwrap();
        write_probe_files(dir.path(), 120i32.to_le_bytes(), 40i32.to_le_bytes());
        let mut registry = FileRegistry::new(dir.path());
        assert_eq!(probe(&mut registry).unwrap(), ByteOrder::Little);
    }

    #[test]
    fn test_swapped_order_detected_when_only_it_is_plausible() {
        let dir = tempfile::tempdir().unwrap();
        // 120 big-endian reads as 2013265920 little-endian: only the
        // byte-swapped interpretation is plausible.
        write_probe_files(dir.path(), 120i32.to_be_bytes(), 40i32.to_be_bytes());
        let mut registry = FileRegistry::new(dir.path());
        assert_eq!(probe(&mut registry).unwrap(), ByteOrder::Big);
    }

    #[test]
    fn test_second_file_vetoes_big_endian_false_positive() {
        let dir = tempfile::tempdir().unwrap();
        // Primary plausible only as big-endian, secondary plausible only
        // as little-endian: the secondary wins the disagreement.
        write_probe_files(dir.path(), 300i32.to_be_bytes(), 300i32.to_le_bytes());
        let mut registry = FileRegistry::new(dir.path());
        assert_eq!(probe(&mut registry).unwrap(), ByteOrder::Little);
    }

    #[test]
    fn test_implausible_everywhere_flags_big_endian() {
        let dir = tempfile::tempdir().unwrap();
        write_probe_files(dir.path(), [0xff; 4], [0xff; 4]);
        let mut registry = FileRegistry::new(dir.path());
        assert_eq!(probe(&mut registry).unwrap(), ByteOrder::Big);
    }
}
