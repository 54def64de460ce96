//! Byte ranges.
//!
//! A [`ByteRange`] represents a byte range relative to the start or end of a
//! stored value. Stores truncate ranges extending beyond the value; a range
//! whose offset lies beyond the value is invalid.

use std::ops::Range;

use thiserror::Error;

/// A byte offset.
pub type ByteOffset = u64;

/// A byte length.
pub type ByteLength = u64;

/// A byte range.
///
/// A byte range has an offset and optional length.
/// An offset can be specified relative to the start or end of a value.
/// If the length is [`None`], the byte range extends to the end of the value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ByteRange {
    /// A byte range from the start of a value.
    FromStart(ByteOffset, Option<ByteLength>),
    /// A byte range from the end of a value.
    FromEnd(ByteOffset, Option<ByteLength>),
}

impl ByteRange {
    /// Return the start of the byte range for a value of length `size`.
    #[must_use]
    pub fn start(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, _) => *offset,
            Self::FromEnd(offset, length) => {
                length.as_ref().map_or(0, |length| size - offset - length)
            }
        }
    }

    /// Return the exclusive end of the byte range for a value of length `size`.
    #[must_use]
    pub fn end(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, length) => {
                length.as_ref().map_or(size, |length| offset + length)
            }
            Self::FromEnd(offset, _) => size - offset,
        }
    }

    /// Return the length of the byte range for a value of length `size`.
    #[must_use]
    pub fn length(&self, size: u64) -> u64 {
        match self {
            Self::FromStart(offset, None) | Self::FromEnd(offset, None) => size - offset,
            Self::FromStart(_, Some(length)) | Self::FromEnd(_, Some(length)) => *length,
        }
    }

    /// Convert the byte range to a [`Range<u64>`] for a value of length `size`.
    #[must_use]
    pub fn to_range(&self, size: u64) -> Range<u64> {
        self.start(size)..self.end(size)
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FromStart(offset, length) => write!(
                f,
                "{}..{}",
                offset,
                length.map_or(String::new(), |length| (offset + length).to_string())
            ),
            Self::FromEnd(offset, length) => write!(
                f,
                "{}..-{offset}",
                length.map_or(String::new(), |length| format!("-{}", offset + length))
            ),
        }
    }
}

/// An invalid byte range error.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid byte range {0} for bytes of length {1}")]
pub struct InvalidByteRangeError(ByteRange, u64);

impl InvalidByteRangeError {
    /// Create a new [`InvalidByteRangeError`].
    #[must_use]
    pub fn new(byte_range: ByteRange, bytes_len: u64) -> Self {
        Self(byte_range, bytes_len)
    }
}

/// Validate byte ranges against a value of length `bytes_len`.
///
/// # Errors
/// Returns [`InvalidByteRangeError`] if any byte range is invalid.
pub fn validate_byte_ranges(
    byte_ranges: &[ByteRange],
    bytes_len: u64,
) -> Result<(), InvalidByteRangeError> {
    for byte_range in byte_ranges {
        let valid = match byte_range {
            ByteRange::FromStart(offset, length) | ByteRange::FromEnd(offset, length) => {
                offset + length.unwrap_or(0) <= bytes_len
            }
        };
        if !valid {
            return Err(InvalidByteRangeError(*byte_range, bytes_len));
        }
    }
    Ok(())
}

/// Extract a byte range from bytes.
///
/// # Errors
/// Returns [`InvalidByteRangeError`] if the byte range is invalid.
///
/// # Panics
/// Panics if the byte range is beyond [`usize::MAX`].
pub fn extract_byte_range(
    bytes: &[u8],
    byte_range: &ByteRange,
) -> Result<Vec<u8>, InvalidByteRangeError> {
    validate_byte_ranges(std::slice::from_ref(byte_range), bytes.len() as u64)?;
    let range = byte_range.to_range(bytes.len() as u64);
    let range = usize::try_from(range.start).unwrap()..usize::try_from(range.end).unwrap();
    Ok(bytes[range].to_vec())
}

/// Extract byte ranges from bytes.
///
/// # Errors
/// Returns [`InvalidByteRangeError`] if any byte range is invalid.
pub fn extract_byte_ranges(
    bytes: &[u8],
    byte_ranges: &[ByteRange],
) -> Result<Vec<Vec<u8>>, InvalidByteRangeError> {
    byte_ranges
        .iter()
        .map(|byte_range| extract_byte_range(bytes, byte_range))
        .collect()
}
