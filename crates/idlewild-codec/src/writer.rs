//! Write half of the binary cursor.
//!
//! All fixed-width values are little-endian. Variable-length values
//! (strings, arrays, byte blobs, regions) carry a `u32` length prefix.

use crate::error::CodecError;

/// Size of every length prefix in bytes.
pub(crate) const LEN_PREFIX: usize = 4;

/// Appends primitives to a growable buffer.
///
/// Construct with [`SaveWriter::with_capacity`] using the previous save's
/// measured size so consecutive saves of similar shape do not reallocate.
#[derive(Debug, Default)]
pub struct SaveWriter {
    buffer: Vec<u8>,
    /// Start offsets of the length placeholders of open regions.
    open_regions: Vec<usize>,
}

impl SaveWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer pre-sized to `hint` bytes.
    pub fn with_capacity(hint: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(hint),
            open_regions: Vec::new(),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Borrow the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer, failing if a region is still open.
    pub fn into_bytes(self) -> Result<Vec<u8>, CodecError> {
        if self.open_regions.is_empty() {
            Ok(self.buffer)
        } else {
            Err(CodecError::UnbalancedRegion {
                open: self.open_regions.len(),
            })
        }
    }

    /// Append raw bytes without a length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Append a boolean as a single `0`/`1` byte.
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    /// Append a `u8`.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Append a `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a `u64`.
    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append an `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append an `i64`.
    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append an `f64`.
    pub fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Append a `u32` length prefix.
    pub fn write_len(&mut self, length: usize) -> Result<(), CodecError> {
        let prefix = u32::try_from(length).map_err(|_err| CodecError::LengthOverflow { length })?;
        self.write_u32(prefix);
        Ok(())
    }

    /// Append a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, value: &str) -> Result<(), CodecError> {
        self.write_prefixed_bytes(value.as_bytes())
    }

    /// Append a length-prefixed byte blob.
    pub fn write_prefixed_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.write_len(bytes.len())?;
        self.write_bytes(bytes);
        Ok(())
    }

    /// Append a length-prefixed array, encoding each element with `write`.
    pub fn write_array<T>(
        &mut self,
        items: &[T],
        mut write: impl FnMut(&mut Self, &T) -> Result<(), CodecError>,
    ) -> Result<(), CodecError> {
        self.write_len(items.len())?;
        for item in items {
            write(self, item)?;
        }
        Ok(())
    }

    /// Append a length-prefixed sequence from any exact-size iterator
    /// (sets, map entries).
    pub fn write_iter<I>(
        &mut self,
        items: I,
        mut write: impl FnMut(&mut Self, I::Item) -> Result<(), CodecError>,
    ) -> Result<(), CodecError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = items.into_iter();
        self.write_len(iter.len())?;
        for item in iter {
            write(self, item)?;
        }
        Ok(())
    }

    /// Open a length-prefixed region. Everything written until the
    /// matching [`stop_marking_write_region`](Self::stop_marking_write_region)
    /// is counted in its prefix, so readers can skip it whole.
    pub fn start_marking_write_region(&mut self) {
        self.open_regions.push(self.buffer.len());
        self.write_u32(0);
    }

    /// Close the innermost open region and patch its length prefix.
    pub fn stop_marking_write_region(&mut self) -> Result<(), CodecError> {
        let start = self
            .open_regions
            .pop()
            .ok_or(CodecError::UnbalancedRegion { open: 0 })?;
        let body_start = start.saturating_add(LEN_PREFIX);
        let length = self.buffer.len().saturating_sub(body_start);
        let prefix = u32::try_from(length).map_err(|_err| CodecError::LengthOverflow { length })?;
        let slot = self
            .buffer
            .get_mut(start..body_start)
            .ok_or(CodecError::UnbalancedRegion {
                open: self.open_regions.len(),
            })?;
        slot.copy_from_slice(&prefix.to_le_bytes());
        Ok(())
    }

    /// Write `body` inside its own length-prefixed region.
    pub fn write_region(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<(), CodecError>,
    ) -> Result<(), CodecError> {
        self.start_marking_write_region();
        body(self)?;
        self.stop_marking_write_region()
    }
}
