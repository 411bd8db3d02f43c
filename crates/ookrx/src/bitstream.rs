//! Append-only bit buffer with a rewindable reader

use thiserror::Error;

/// Error using a [`BitStream`] or [`BitStreamReader`]
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BitStreamError {
    /// Attempt to append a value other than 0 or 1
    #[error("attempt to append non-binary value {0} to bit stream")]
    InvalidBit(u8),

    /// Attempt to read past the end of the stream
    #[error("attempt to read past the end of the bit stream")]
    Overread,

    /// Attempt to rewind the cursor below zero
    #[error("attempt to rewind bit stream reader below zero")]
    UnderflowRewind,
}

/// An append-only sequence of bits
///
/// Bits are appended with [`add()`](BitStream::add) and read back
/// through any number of [readers](BitStreamReader). The stream only
/// ever grows; readers never mutate it.
///
/// ```
/// use ookrx::BitStream;
///
/// let mut bits = BitStream::default();
/// bits.add(1).unwrap();
/// bits.add(0).unwrap();
///
/// let mut reader = bits.reader();
/// assert_eq!(reader.get_bit(), Ok(1));
/// assert_eq!(reader.get_bit(), Ok(0));
/// assert!(reader.at_end());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitStream {
    // one bit per byte to make things easy
    bits: Vec<u8>,
}

impl BitStream {
    /// New empty stream with room for `sized_for` bits
    pub fn with_capacity(sized_for: usize) -> Self {
        Self {
            bits: Vec::with_capacity(sized_for),
        }
    }

    /// Append a single bit
    ///
    /// `bit` must be `0` or `1`; anything else is rejected with
    /// [`BitStreamError::InvalidBit`].
    pub fn add(&mut self, bit: u8) -> Result<(), BitStreamError> {
        if bit > 1 {
            return Err(BitStreamError::InvalidBit(bit));
        }
        self.bits.push(bit);
        Ok(())
    }

    /// Number of bits in the stream
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True if no bits have been appended
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// New reader positioned at the first bit
    ///
    /// Many readers may exist over one stream; each keeps its own
    /// cursor.
    pub fn reader(&self) -> BitStreamReader<'_> {
        BitStreamReader {
            stream: self,
            thumb: 0,
        }
    }
}

/// Cursor over a [`BitStream`]
///
/// Supports forward reads, non-consuming peeks, multi-bit rewind,
/// and LSB-first nibble extraction.
#[derive(Clone, Debug)]
pub struct BitStreamReader<'s> {
    stream: &'s BitStream,
    thumb: usize,
}

impl<'s> BitStreamReader<'s> {
    /// True if the cursor is past the last bit
    pub fn at_end(&self) -> bool {
        self.thumb >= self.stream.bits.len()
    }

    /// Next bit, without advancing
    pub fn peek_bit(&self) -> Result<u8, BitStreamError> {
        self.stream
            .bits
            .get(self.thumb)
            .copied()
            .ok_or(BitStreamError::Overread)
    }

    /// Next bit, advancing the cursor by one
    pub fn get_bit(&mut self) -> Result<u8, BitStreamError> {
        let bit = self.peek_bit()?;
        self.thumb += 1;
        Ok(bit)
    }

    /// Rewind the cursor by `count` bits
    pub fn unget_bits(&mut self, count: usize) -> Result<(), BitStreamError> {
        self.thumb = self
            .thumb
            .checked_sub(count)
            .ok_or(BitStreamError::UnderflowRewind)?;
        Ok(())
    }

    /// Rewind the cursor by one bit
    pub fn unget_bit(&mut self) -> Result<(), BitStreamError> {
        self.unget_bits(1)
    }

    /// Next four bits as an LSB-first nibble, without advancing
    ///
    /// Bit *i* (counting from the cursor) contributes `2^i`, so the
    /// first bit read is the least significant. Returns `None`,
    /// without consuming anything, when fewer than four bits remain.
    pub fn peek_nibble_lsb(&self) -> Option<u8> {
        let bits = self.stream.bits.get(self.thumb..self.thumb + 4)?;
        Some(bits[0] + 2 * bits[1] + 4 * bits[2] + 8 * bits[3])
    }

    /// Next four bits as an LSB-first nibble, advancing the cursor
    pub fn get_nibble_lsb(&mut self) -> Option<u8> {
        let nibble = self.peek_nibble_lsb()?;
        self.thumb += 4;
        Some(nibble)
    }

    /// Rewind the cursor by one nibble
    pub fn unget_nibble(&mut self) -> Result<(), BitStreamError> {
        self.unget_bits(4)
    }

    /// Drain the remaining bits into a human-readable string
    ///
    /// Bits are grouped four to a word, like `"0101 1100"`. The
    /// reader is consumed to the end. Diagnostics only.
    pub fn remaining_bits(&mut self) -> String {
        let mut out = String::new();
        let mut count = 0usize;
        while let Ok(bit) = self.get_bit() {
            if count > 0 && count % 4 == 0 {
                out.push(' ');
            }
            out.push(if bit == 0 { '0' } else { '1' });
            count += 1;
        }
        out
    }
}
