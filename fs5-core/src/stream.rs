//! Byte-order-aware decoding of fixed-record binary files.
//!
//! Everything in an FS5Files database is addressed in fixed-length records
//! and decoded word by word: 4-byte integers, 4-byte IEEE-754 floats, 2-byte
//! shorts, and fixed-width blank-padded character fields. The byte order is
//! selected once per session (see [`crate::endian`]) and applied to every
//! read.
//!
//! Two read shapes exist:
//! - **fixed-record read**: seek to `(record - 1) * record_len` and read
//!   exactly one record;
//! - **virtual-record read**: same seek, but an explicitly requested byte
//!   count that may be smaller or larger than one physical record. Logical
//!   records that span a variable word count (segment parameter arrays,
//!   processed time series, station index entries) are read this way.
//!
//! A read past end-of-file surfaces as [`StreamError::EndOfFile`]; index
//! enumeration treats that as "no more records", not a failure.

use serde::{Deserialize, Serialize};
use std::io::{Read, Seek, SeekFrom};
use thiserror::Error;

/// Byte order of multi-byte fields, fixed per database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    #[inline]
    pub fn i32_from(self, bytes: [u8; 4]) -> i32 {
        match self {
            ByteOrder::Big => i32::from_be_bytes(bytes),
            ByteOrder::Little => i32::from_le_bytes(bytes),
        }
    }

    #[inline]
    pub fn f32_from(self, bytes: [u8; 4]) -> f32 {
        f32::from_bits(self.i32_from(bytes) as u32)
    }

    #[inline]
    pub fn i16_from(self, bytes: [u8; 2]) -> i16 {
        match self {
            ByteOrder::Big => i16::from_be_bytes(bytes),
            ByteOrder::Little => i16::from_le_bytes(bytes),
        }
    }
}

/// Errors raised by record and window reads.
#[derive(Debug, Error)]
pub enum StreamError {
    /// I/O error from the underlying file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read ran past the end of the file or window
    #[error("end of stream: {requested} bytes requested, {available} available")]
    EndOfFile { requested: usize, available: usize },

    /// Record numbers are 1-based; zero never addresses a record
    #[error("record number 0 is not addressable")]
    ZeroRecordNumber,
}

/// A specialized Result type for stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Cursor-based reads over one open logical file.
///
/// Wraps any seekable byte source with the session byte order. Every read
/// advances the underlying cursor; `seek_record` repositions it.
pub struct RecordStream<R> {
    inner: R,
    order: ByteOrder,
}

impl<R: Read + Seek> RecordStream<R> {
    pub fn new(inner: R, order: ByteOrder) -> Self {
        RecordStream { inner, order }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Positions the cursor at the start of a 1-based record: byte
    /// `(record - 1) * record_len`.
    pub fn seek_record(&mut self, record: u32, record_len: u32) -> Result<()> {
        if record == 0 {
            return Err(StreamError::ZeroRecordNumber);
        }
        let offset = u64::from(record - 1) * u64::from(record_len);
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Positions the cursor at an absolute byte offset.
    pub fn seek_byte(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// The current byte position of the cursor.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// The total byte length of the file. Restores the cursor afterwards.
    pub fn byte_len(&mut self) -> Result<u64> {
        let pos = self.inner.stream_position()?;
        let len = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(len)
    }

    /// Reads exactly `count` bytes at the cursor.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.inner.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                StreamError::EndOfFile {
                    requested: count,
                    available: 0,
                }
            } else {
                StreamError::Io(e)
            }
        })?;
        Ok(buf)
    }

    /// Fixed-record read: one whole record at a 1-based record number.
    pub fn read_record(&mut self, record: u32, record_len: u32) -> Result<Vec<u8>> {
        self.seek_record(record, record_len)?;
        self.read_bytes(record_len as usize)
    }

    /// Virtual-record read: seeks like a fixed read, then reads an explicit
    /// byte count that need not align with the physical record length.
    pub fn read_virtual(&mut self, record: u32, record_len: u32, count: usize) -> Result<Vec<u8>> {
        self.seek_record(record, record_len)?;
        self.read_bytes(count)
    }

    /// A fixed-record read wrapped into a decode window.
    pub fn record_window(&mut self, record: u32, record_len: u32) -> Result<ByteWindow> {
        let bytes = self.read_record(record, record_len)?;
        Ok(ByteWindow::new_owned(bytes, self.order))
    }

    /// A virtual-record read wrapped into a decode window.
    pub fn virtual_window(
        &mut self,
        record: u32,
        record_len: u32,
        count: usize,
    ) -> Result<ByteWindow> {
        let bytes = self.read_virtual(record, record_len, count)?;
        Ok(ByteWindow::new_owned(bytes, self.order))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let b = self.read_bytes(4)?;
        Ok(self.order.i32_from([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let b = self.read_bytes(4)?;
        Ok(self.order.f32_from([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let b = self.read_bytes(2)?;
        Ok(self.order.i16_from([b[0], b[1]]))
    }

    /// Reads a fixed-width character field, trimming trailing blanks.
    pub fn read_string(&mut self, width: usize) -> Result<String> {
        let b = self.read_bytes(width)?;
        Ok(trim_field(&b))
    }

    pub fn skip(&mut self, count: i64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(count))?;
        Ok(())
    }
}

fn trim_field(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |p| p + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Sequential decoding over an in-memory byte window.
///
/// Decoders that work on whole logical records (parameter arrays, carryover
/// slices, parametric records) read the bytes once and walk them with a
/// window cursor, so a malformed record can never leave the file cursor in
/// an inconsistent position.
#[derive(Debug, Clone)]
pub struct ByteWindow {
    bytes: Vec<u8>,
    order: ByteOrder,
    pos: usize,
}

impl ByteWindow {
    pub fn new_owned(bytes: Vec<u8>, order: ByteOrder) -> Self {
        ByteWindow {
            bytes,
            order,
            pos: 0,
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// The current position in 4-byte words.
    pub fn word_position(&self) -> usize {
        self.pos / 4
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.bytes.len());
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn raw(&self) -> &[u8] {
        &self.bytes
    }

    fn take(&mut self, count: usize) -> Result<&[u8]> {
        if self.remaining() < count {
            return Err(StreamError::EndOfFile {
                requested: count,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let order = self.order;
        let b = self.take(4)?;
        Ok(order.i32_from([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let order = self.order;
        let b = self.take(4)?;
        Ok(order.f32_from([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let order = self.order;
        let b = self.take(2)?;
        Ok(order.i16_from([b[0], b[1]]))
    }

    /// Reads a fixed-width character field, trimming trailing blanks.
    pub fn read_string(&mut self, width: usize) -> Result<String> {
        let b = self.take(width)?;
        Ok(trim_field(b))
    }

    /// Reads a raw byte run without decoding.
    pub fn read_raw(&mut self, count: usize) -> Result<Vec<u8>> {
        Ok(self.take(count)?.to_vec())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count)?;
        Ok(())
    }

    pub fn skip_words(&mut self, words: usize) -> Result<()> {
        self.skip(words * 4)
    }

    /// The raw 4-byte word at an absolute word index, without moving the
    /// cursor. `None` past the end of the window.
    pub fn word_at(&self, word_index: usize) -> Option<&[u8]> {
        let start = word_index * 4;
        self.bytes.get(start..start + 4)
    }
}
