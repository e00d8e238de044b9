//! Read half of the binary cursor.
//!
//! Consumes the primitives written by [`SaveWriter`](crate::SaveWriter) in
//! the same order. Every failure is a [`CodecError`] classified as
//! "not this format"; the reader never panics on malformed input.

use crate::error::CodecError;
use crate::writer::LEN_PREFIX;

/// Cursor over a borrowed byte buffer.
#[derive(Debug, Clone)]
pub struct SaveReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> SaveReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current cursor offset.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Whether every byte has been consumed.
    pub const fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Consume `count` raw bytes.
    pub fn take(&mut self, count: usize) -> Result<&'a [u8], CodecError> {
        let eof = CodecError::UnexpectedEof {
            offset: self.offset,
            needed: count,
            remaining: self.remaining(),
        };
        let end = self.offset.checked_add(count).ok_or_else(|| eof.clone())?;
        let bytes = self.data.get(self.offset..end).ok_or(eof)?;
        self.offset = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let offset = self.offset;
        let bytes = self.take(N)?;
        <[u8; N]>::try_from(bytes).map_err(|_err| CodecError::UnexpectedEof {
            offset,
            needed: N,
            remaining: bytes.len(),
        })
    }

    /// Consume `signature` or fail with [`CodecError::SignatureMismatch`].
    ///
    /// The cursor is left untouched on mismatch.
    pub fn expect_signature(&mut self, signature: &[u8]) -> Result<(), CodecError> {
        let start = self.offset;
        match self.take(signature.len()) {
            Ok(bytes) if bytes == signature => Ok(()),
            _ => {
                self.offset = start;
                Err(CodecError::SignatureMismatch)
            }
        }
    }

    /// Read a `0`/`1` boolean byte.
    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(CodecError::InvalidTag {
                context: "bool",
                value,
            }),
        }
    }

    /// Read a `u8`.
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(u8::from_le_bytes(self.take_array()?))
    }

    /// Read a `u16`.
    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    /// Read a `u32`.
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    /// Read a `u64`.
    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    /// Read an `i32`.
    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    /// Read an `i64`.
    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    /// Read an `f64`.
    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    /// Read a `u32` length prefix.
    pub fn read_len(&mut self) -> Result<usize, CodecError> {
        let length = self.read_u32()?;
        usize::try_from(length).map_err(|_err| CodecError::LengthOverflow {
            length: usize::MAX,
        })
    }

    /// Read a length-prefixed byte blob.
    pub fn read_prefixed_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let length = self.read_len()?;
        self.take(length)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let offset = self.offset;
        let bytes = self.read_prefixed_bytes()?;
        core::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_err| CodecError::InvalidUtf8 { offset })
    }

    /// Read a length-prefixed array, decoding each element with `read`.
    pub fn read_array<T>(
        &mut self,
        mut read: impl FnMut(&mut Self) -> Result<T, CodecError>,
    ) -> Result<Vec<T>, CodecError> {
        let length = self.read_len()?;
        // Every element occupies at least one byte; cap the allocation so a
        // corrupt prefix cannot request gigabytes.
        let mut items = Vec::with_capacity(length.min(self.remaining()));
        for _ in 0..length {
            items.push(read(self)?);
        }
        Ok(items)
    }

    /// Read a length-prefixed region with `read`.
    ///
    /// `read` sees only the region's bytes. Whatever it leaves unread is
    /// skipped, so the outer cursor always lands just past the region.
    pub fn read_region<T>(
        &mut self,
        read: impl FnOnce(&mut SaveReader<'a>) -> Result<T, CodecError>,
    ) -> Result<T, CodecError> {
        let body = self.read_prefixed_bytes()?;
        let mut inner = SaveReader::new(body);
        read(&mut inner)
    }

    /// Skip a length-prefixed region without interpreting it.
    pub fn skip_region(&mut self) -> Result<(), CodecError> {
        self.read_prefixed_bytes().map(|_body| ())
    }

    /// Peek at the length prefix of the next region without consuming it.
    pub fn peek_region_len(&self) -> Result<usize, CodecError> {
        let mut probe = self.clone();
        let length = probe.read_len()?;
        Ok(length.saturating_add(LEN_PREFIX))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::writer::SaveWriter;

    #[test]
    fn reads_what_was_written() {
        let mut writer = SaveWriter::new();
        writer.write_bool(false);
        writer.write_u16(513);
        writer.write_i32(-7);
        writer.write_i64(-1_234_567_890_123);
        writer.write_f64(2.5);
        writer.write_string("woodcutting").unwrap();
        writer
            .write_array(&[3_u32, 4, 5], |w, v| {
                w.write_u32(*v);
                Ok(())
            })
            .unwrap();
        let bytes = writer.into_bytes().unwrap();

        let mut reader = SaveReader::new(&bytes);
        assert!(!reader.read_bool().unwrap());
        assert_eq!(reader.read_u16().unwrap(), 513);
        assert_eq!(reader.read_i32().unwrap(), -7);
        assert_eq!(reader.read_i64().unwrap(), -1_234_567_890_123);
        assert!((reader.read_f64().unwrap() - 2.5).abs() < f64::EPSILON);
        assert_eq!(reader.read_string().unwrap(), "woodcutting");
        assert_eq!(reader.read_array(SaveReader::read_u32).unwrap(), vec![3, 4, 5]);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn reading_past_end_is_not_this_format() {
        let bytes = [1_u8, 2];
        let mut reader = SaveReader::new(&bytes);
        let err = reader.read_u32().unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotThisFormat);
        assert!(matches!(
            err,
            CodecError::UnexpectedEof {
                offset: 0,
                needed: 4,
                remaining: 2
            }
        ));
    }

    #[test]
    fn signature_mismatch_leaves_cursor() {
        let bytes = *b"JSON{}";
        let mut reader = SaveReader::new(&bytes);
        assert_eq!(
            reader.expect_signature(b"IDLW"),
            Err(CodecError::SignatureMismatch)
        );
        assert_eq!(reader.offset(), 0);
        assert!(reader.expect_signature(b"JSON").is_ok());
        assert_eq!(reader.offset(), 4);
    }

    #[test]
    fn short_buffer_fails_signature() {
        let bytes = [b'I'];
        let mut reader = SaveReader::new(&bytes);
        assert_eq!(
            reader.expect_signature(b"IDLW"),
            Err(CodecError::SignatureMismatch)
        );
    }

    #[test]
    fn partially_read_region_stays_aligned() {
        let mut writer = SaveWriter::new();
        writer
            .write_region(|w| {
                w.write_u32(10);
                w.write_u32(20);
                w.write_string("ignored").unwrap();
                Ok(())
            })
            .unwrap();
        writer.write_u16(0xBEEF);
        let bytes = writer.into_bytes().unwrap();

        let mut reader = SaveReader::new(&bytes);
        let first = reader.read_region(SaveReader::read_u32).unwrap();
        assert_eq!(first, 10);
        assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
    }

    #[test]
    fn region_read_cannot_overrun() {
        let mut writer = SaveWriter::new();
        writer
            .write_region(|w| {
                w.write_u8(1);
                Ok(())
            })
            .unwrap();
        writer.write_u32(99);
        let bytes = writer.into_bytes().unwrap();

        let mut reader = SaveReader::new(&bytes);
        assert!(reader.read_region(SaveReader::read_u32).is_err());
    }

    #[test]
    fn skip_region_and_peek() {
        let mut writer = SaveWriter::new();
        writer
            .write_region(|w| {
                w.write_u64(1);
                Ok(())
            })
            .unwrap();
        writer.write_u8(3);
        let bytes = writer.into_bytes().unwrap();

        let mut reader = SaveReader::new(&bytes);
        assert_eq!(reader.peek_region_len().unwrap(), 12);
        reader.skip_region().unwrap();
        assert_eq!(reader.read_u8().unwrap(), 3);
    }

    #[test]
    fn invalid_bool_and_utf8_rejected() {
        let bytes = [2_u8];
        assert!(matches!(
            SaveReader::new(&bytes).read_bool(),
            Err(CodecError::InvalidTag { context: "bool", value: 2 })
        ));

        let bytes = [2_u8, 0, 0, 0, 0xFF, 0xFE];
        assert!(matches!(
            SaveReader::new(&bytes).read_string(),
            Err(CodecError::InvalidUtf8 { offset: 0 })
        ));
    }

    #[test]
    fn huge_array_prefix_fails_cleanly() {
        let bytes = [0xFF_u8, 0xFF, 0xFF, 0xFF, 1];
        let mut reader = SaveReader::new(&bytes);
        assert!(reader.read_array(SaveReader::read_u8).is_err());
    }
}
