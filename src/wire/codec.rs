//! Binary Codec
//!
//! Primitive field encoding shared by every protocol message:
//! - `u8` as a single byte
//! - `u32` as 4 bytes, little-endian
//! - strings as a one-byte length (0-255) followed by UTF-8 bytes
//!
//! The deserializer borrows its input and never allocates beyond it.

use thiserror::Error;

/// Longest string (in UTF-8 bytes) that fits behind a one-byte length prefix.
pub const MAX_STRING_LEN: usize = u8::MAX as usize;

/// Codec and registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Tried to read past the end of the buffer.
    #[error("buffer underrun at offset {offset}: needed {needed} bytes, {available} available")]
    BufferUnderrun {
        /// Read position when the failure happened.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// Leading tag byte does not name a known message.
    #[error("unknown message type: {0}")]
    UnknownMessageType(u8),

    /// String is too long for its one-byte length prefix.
    #[error("string of {len} bytes exceeds the {max} byte limit", max = MAX_STRING_LEN)]
    StringTooLong {
        /// UTF-8 length of the rejected string.
        len: usize,
    },

    /// String bytes are not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
}

/// Accumulates encoded fields into a binary frame.
#[derive(Debug, Default, Clone)]
pub struct Serializer {
    buf: Vec<u8>,
}

impl Serializer {
    /// Create an empty serializer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a serializer with a preallocated buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Write a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a u32 (little-endian).
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a length-prefixed UTF-8 string.
    ///
    /// Fails without writing anything if the encoding is longer than 255 bytes.
    pub fn write_string(&mut self, value: &str) -> Result<(), WireError> {
        let bytes = value.as_bytes();
        let len = u8::try_from(bytes.len())
            .map_err(|_| WireError::StringTooLong { len: bytes.len() })?;
        self.write_u8(len);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Write raw bytes with no length prefix.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish and return the encoded frame.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads encoded fields from a borrowed frame.
///
/// `peek_*` leave the cursor in place, `read_*` advance it.
#[derive(Debug, Clone)]
pub struct Deserializer<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Deserializer<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Unread byte count.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn peek_slice(&self, len: usize) -> Result<&'a [u8], WireError> {
        let available = self.remaining();
        if len > available {
            return Err(WireError::BufferUnderrun {
                offset: self.offset,
                needed: len,
                available,
            });
        }
        Ok(&self.data[self.offset..self.offset + len])
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let slice = self.peek_slice(len)?;
        self.offset += len;
        Ok(slice)
    }

    /// Look at the next byte.
    pub fn peek_u8(&self) -> Result<u8, WireError> {
        Ok(self.peek_slice(1)?[0])
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_slice(1)?[0])
    }

    /// Look at the next little-endian u32.
    pub fn peek_u32(&self) -> Result<u32, WireError> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.peek_slice(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    /// Read a little-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let value = self.peek_u32()?;
        self.offset += 4;
        Ok(value)
    }

    /// Read a length-prefixed UTF-8 string.
    ///
    /// On failure the cursor may have moved past the length byte; callers
    /// discard the whole frame anyway.
    pub fn read_string(&mut self) -> Result<String, WireError> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_slice(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| WireError::InvalidUtf8)
    }

    /// Read every remaining byte.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let rest = &self.data[self.offset..];
        self.offset = self.data.len();
        rest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_is_little_endian() {
        let mut ser = Serializer::new();
        ser.write_u32(0x0403_0201);
        assert_eq!(ser.into_bytes(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_string_length_prefix_counts_utf8_bytes() {
        let mut ser = Serializer::new();
        ser.write_string("café").unwrap();
        let bytes = ser.into_bytes();
        assert_eq!(bytes[0], 5);
        assert_eq!(bytes.len(), 6);

        let mut de = Deserializer::new(&bytes);
        assert_eq!(de.read_string().unwrap(), "café");
        assert_eq!(de.remaining(), 0);
    }

    #[test]
    fn test_string_boundaries() {
        let longest = "x".repeat(MAX_STRING_LEN);
        let mut ser = Serializer::new();
        ser.write_string("").unwrap();
        ser.write_string(&longest).unwrap();
        let bytes = ser.into_bytes();
        assert_eq!(bytes.len(), 1 + 1 + MAX_STRING_LEN);

        let mut de = Deserializer::new(&bytes);
        assert_eq!(de.read_string().unwrap(), "");
        assert_eq!(de.read_string().unwrap(), longest);
    }

    #[test]
    fn test_string_too_long_writes_nothing() {
        let mut ser = Serializer::new();
        ser.write_u8(7);
        let result = ser.write_string(&"é".repeat(128));
        assert_eq!(result, Err(WireError::StringTooLong { len: 256 }));
        assert_eq!(ser.len(), 1);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut ser = Serializer::new();
        ser.write_u8(9);
        ser.write_u32(1234);
        let bytes = ser.into_bytes();

        let mut de = Deserializer::new(&bytes);
        assert_eq!(de.peek_u8().unwrap(), 9);
        assert_eq!(de.position(), 0);
        assert_eq!(de.read_u8().unwrap(), 9);
        assert_eq!(de.peek_u32().unwrap(), 1234);
        assert_eq!(de.position(), 1);
        assert_eq!(de.read_u32().unwrap(), 1234);
        assert_eq!(de.position(), 5);
    }

    #[test]
    fn test_underrun_on_empty_buffer() {
        let mut de = Deserializer::new(&[]);
        assert!(matches!(de.peek_u8(), Err(WireError::BufferUnderrun { .. })));
        assert!(matches!(de.read_u8(), Err(WireError::BufferUnderrun { .. })));
    }

    #[test]
    fn test_underrun_on_short_u32() {
        let mut de = Deserializer::new(&[1, 2, 3]);
        assert_eq!(
            de.read_u32(),
            Err(WireError::BufferUnderrun { offset: 0, needed: 4, available: 3 })
        );
        assert_eq!(de.position(), 0);
    }

    #[test]
    fn test_string_length_exceeds_buffer() {
        let mut de = Deserializer::new(&[10, b'a', b'b']);
        assert_eq!(
            de.read_string(),
            Err(WireError::BufferUnderrun { offset: 1, needed: 10, available: 2 })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let mut de = Deserializer::new(&[2, 0xC3, 0x28]);
        assert_eq!(de.read_string(), Err(WireError::InvalidUtf8));
    }

    #[test]
    fn test_read_remaining() {
        let mut de = Deserializer::new(&[1, 2, 3, 4]);
        de.read_u8().unwrap();
        assert_eq!(de.read_remaining(), &[2, 3, 4]);
        assert_eq!(de.remaining(), 0);
        assert!(de.read_remaining().is_empty());
    }
}
