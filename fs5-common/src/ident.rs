//! Fixed-width, blank-padded ASCII identifiers.
//!
//! Every name stored in an FS5Files database is a fixed-width ASCII field,
//! right-padded with blanks: entity identifiers occupy 8 bytes (two 4-byte
//! words), parameter type tags occupy 4 bytes (one word). Both are trimmed
//! of trailing blanks and NULs on read and compared in their trimmed form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Returns true if `byte` is printable ASCII (space through tilde).
#[inline]
pub fn is_printable_ascii(byte: u8) -> bool {
    (0x20..=0x7e).contains(&byte)
}

/// Returns true if a raw 4-byte word looks like a well-formed text token:
/// every byte printable ASCII. An all-blank word is well-formed — it is the
/// padding half of a short identifier.
///
/// Used by the operation decoder to distinguish character fields from
/// numeric words that happen to alias ASCII.
pub fn is_text_word(word: &[u8]) -> bool {
    word.len() == 4 && word.iter().all(|&b| is_printable_ascii(b))
}

fn trim_padded(bytes: &[u8]) -> Option<String> {
    // NUL padding appears in files written by some runtime versions; treat
    // it the same as blank padding.
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map(|p| p + 1)?;
    let head = &bytes[..end];
    if !head.iter().all(|&b| is_printable_ascii(b)) {
        return None;
    }
    // Blanks pad on the right only; an interior blank means the field is
    // not an identifier.
    if head.contains(&b' ') {
        return None;
    }
    Some(String::from_utf8_lossy(head).into_owned())
}

/// An 8-character entity identifier (segment, station, rating curve,
/// forecast group, time-series id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ident(String);

impl Ident {
    /// Builds an identifier from its raw on-disk field.
    ///
    /// Returns `None` for blank fields and fields containing non-printable
    /// bytes; index builders skip such entries rather than storing them.
    pub fn from_field(bytes: &[u8]) -> Option<Self> {
        let trimmed = trim_padded(bytes)?;
        if trimmed.len() > 8 {
            return None;
        }
        Some(Ident(trimmed))
    }

    /// Builds an identifier from a caller-supplied string.
    pub fn new(s: impl Into<String>) -> Option<Self> {
        let s = s.into();
        let trimmed = s.trim_end();
        if trimmed.is_empty()
            || s.len() > 8
            || trimmed.contains(' ')
            || !s.bytes().all(is_printable_ascii)
        {
            return None;
        }
        Some(Ident(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier padded back out to its 8-byte on-disk form.
    pub fn to_field(&self) -> [u8; 8] {
        let mut field = [b' '; 8];
        field[..self.0.len()].copy_from_slice(self.0.as_bytes());
        field
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A 4-character parameter type tag (GENL, PCPN, RRS, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeTag(String);

impl TypeTag {
    pub fn from_field(bytes: &[u8]) -> Option<Self> {
        let trimmed = trim_padded(bytes)?;
        if trimmed.len() > 4 {
            return None;
        }
        Some(TypeTag(trimmed))
    }

    pub fn new(s: impl Into<String>) -> Option<Self> {
        let s = s.into();
        let trimmed = s.trim_end();
        if trimmed.is_empty()
            || s.len() > 4
            || trimmed.contains(' ')
            || !s.bytes().all(is_printable_ascii)
        {
            return None;
        }
        Some(TypeTag(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tag padded back out to its 4-byte on-disk form.
    pub fn to_field(&self) -> [u8; 4] {
        let mut field = [b' '; 4];
        field[..self.0.len()].copy_from_slice(self.0.as_bytes());
        field
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_trims_trailing_blanks() {
        let id = Ident::from_field(b"FTPK    ").unwrap();
        assert_eq!(id.as_str(), "FTPK");
        assert_eq!(&id.to_field(), b"FTPK    ");
    }

    #[test]
    fn test_ident_trims_nul_padding() {
        let id = Ident::from_field(b"AB\0\0\0\0\0\0").unwrap();
        assert_eq!(id.as_str(), "AB");
    }

    #[test]
    fn test_blank_ident_is_rejected() {
        assert!(Ident::from_field(b"        ").is_none());
        assert!(Ident::from_field(&[0u8; 8]).is_none());
    }

    #[test]
    fn test_non_printable_ident_is_rejected() {
        assert!(Ident::from_field(&[0x01, 0x02, 0x03, 0x04, b' ', b' ', b' ', b' ']).is_none());
    }

    #[test]
    fn test_type_tag_round_trip() {
        let tag = TypeTag::from_field(b"PE  ").unwrap();
        assert_eq!(tag.as_str(), "PE");
        assert_eq!(&tag.to_field(), b"PE  ");
    }

    #[test]
    fn test_text_word_detection() {
        assert!(is_text_word(b"QIN "));
        assert!(is_text_word(b"FTPK"));
        // The padding half of a short identifier is still text.
        assert!(is_text_word(b"    "));
        assert!(!is_text_word(&1234i32.to_be_bytes()));
        assert!(!is_text_word(&f32::to_be_bytes(1.5)));
    }

    #[test]
    fn test_interior_blanks_invalidate_identifiers() {
        assert!(Ident::from_field(b"AB CD   ").is_none());
        assert!(Ident::new("AB CD").is_none());
        assert!(TypeTag::from_field(b"A B ").is_none());
    }
}
