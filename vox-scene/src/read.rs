//! Forward-only reading of the little-endian primitives `.vox` files are made of.

use crate::DecodeError;

/// A cursor over a byte slice which counts the bytes it has consumed.
///
/// Chunk regions are represented by further [`ByteReader`]s obtained from [`Self::split()`],
/// so a decoder can never read past the end of the region it was given.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    /// Invariant: `position <= data.len()`.
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Start reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Number of bytes read so far.
    pub fn consumed(&self) -> usize {
        self.position
    }

    /// Number of bytes that have not yet been read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Whether all bytes have been read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read exactly `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if count > available {
            return Err(DecodeError::TruncatedInput {
                offset: self.position,
                wanted: count,
                available,
            });
        }
        let bytes = &self.data[self.position..][..count];
        self.position += count;
        Ok(bytes)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut array = [0; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let [byte] = self.read_array()?;
        Ok(byte)
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian `i32`.
    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read an `i32` element count or byte length, rejecting negative values.
    pub fn read_length(&mut self) -> Result<usize, DecodeError> {
        let length = self.read_i32()?;
        usize::try_from(length).map_err(|_| DecodeError::InvalidLength { length })
    }

    /// Read a string: an `i32` byte length followed by that many bytes, with no terminator.
    ///
    /// The format does not specify an encoding; bytes which are not UTF-8 are replaced with
    /// U+FFFD so that attribute values remain usable as text.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let length = self.read_length()?;
        let bytes = self.read_bytes(length)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Split off the next `count` bytes as a separate reader, and advance past them.
    pub fn split(&mut self, count: usize) -> Result<ByteReader<'a>, DecodeError> {
        self.read_bytes(count).map(ByteReader::new)
    }

    /// An upper bound on how many items of `item_size` bytes could still be read,
    /// for use in preallocating without trusting declared counts.
    pub(crate) fn capacity_hint(&self, declared: usize, item_size: usize) -> usize {
        declared.min(self.remaining() / item_size.max(1))
    }
}
