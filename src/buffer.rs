use thiserror::Error;

macro_rules! impl_read {
    ($fn_name:ident, $at_name:ident, $typ:ty) => {
        /// Reads a big-endian value at an absolute offset without moving the cursor.
        pub fn $at_name(&self, offset: usize) -> Result<$typ, BufReaderError> {
            const SIZE: usize = size_of::<$typ>();
            let bytes: [u8; SIZE] = self.bytes_at(offset, SIZE)?.try_into().map_err(|_| {
                BufReaderError::TruncatedData {
                    offset,
                    needed: SIZE,
                    available: self.available_at(offset),
                }
            })?;

            Ok(<$typ>::from_be_bytes(bytes))
        }

        /// Reads a big-endian value at the cursor and advances past it.
        pub fn $fn_name(&mut self) -> Result<$typ, BufReaderError> {
            let value = self.$at_name(self.pos)?;
            self.pos += size_of::<$typ>();

            Ok(value)
        }
    };
}

/// Represents the possible errors that can occur when using `BufReader`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufReaderError {
    /// A read would run past the end of the buffer.
    #[error("Truncated data: needed {needed} bytes at offset {offset}, only {available} available")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

/// A bounds-checked big-endian cursor over a borrowed byte buffer.
///
/// Every read is checked against the end of the buffer, so a malformed
/// offset or count surfaces as [`BufReaderError::TruncatedData`] instead
/// of an out-of-bounds access.
#[derive(Debug, Clone, Copy)]
pub struct BufReader<'a> {
    inner: &'a [u8],
    pos: usize,
}

impl<'a> BufReader<'a> {
    /// Returns a new reader positioned at the start of `buffer`.
    pub fn from_buffer(buffer: &'a [u8]) -> Self {
        Self {
            inner: buffer,
            pos: 0,
        }
    }

    /// Moves the cursor to an absolute position.
    ///
    /// Seeking past the end is allowed; the next read reports the truncation.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_index::buffer::BufReader;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut reader = BufReader::from_buffer(&data);
    ///
    /// reader.seek_to(4);
    /// assert_eq!(reader.read_u32().unwrap(), 20);
    /// ```
    pub fn seek_to(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Skips `n` bytes from the current cursor position.
    ///
    /// # Examples
    ///
    /// ```
    /// use glyph_index::buffer::BufReader;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut reader = BufReader::from_buffer(&data);
    ///
    /// assert_eq!(reader.read_u32().unwrap(), 10);
    /// reader.skip(4);
    ///
    /// // Nothing left to read
    /// assert!(reader.read_u32().is_err());
    /// ```
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    /// The current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.available_at(self.pos)
    }

    /// Fails unless `len` bytes are readable starting at the cursor.
    pub fn ensure(&self, len: usize) -> Result<(), BufReaderError> {
        self.bytes_at(self.pos, len).map(|_| ())
    }

    fn available_at(&self, offset: usize) -> usize {
        self.inner.len().saturating_sub(offset)
    }

    fn bytes_at(&self, offset: usize, len: usize) -> Result<&'a [u8], BufReaderError> {
        offset
            .checked_add(len)
            .and_then(|end| self.inner.get(offset..end))
            .ok_or(BufReaderError::TruncatedData {
                offset,
                needed: len,
                available: self.available_at(offset),
            })
    }

    impl_read!(read_u32, read_u32_at, u32);
    impl_read!(read_u16, read_u16_at, u16);
}
