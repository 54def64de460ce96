//! Chunk compression.
//!
//! Chunks are compressed as a whole: an optional byte [`ShuffleFilter`]
//! followed by a compressor implementing [`CompressorTraits`]. The pipeline is
//! configured by an explicit [`CodecParams`] value owned by each array; there
//! is no process-global codec state.

use std::io::Read;
use std::sync::Arc;

use thiserror::Error;

/// An [`Arc`] wrapped compressor.
pub type Compressor = Arc<dyn CompressorTraits>;

/// The compressor identifier of a [`CodecParams`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CodecId {
    /// No compression.
    None,
    /// Gzip (DEFLATE with zlib wrapper).
    Gzip,
}

/// A filter applied to chunk bytes before compression.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ShuffleFilter {
    /// No shuffle.
    #[default]
    None,
    /// Byte transpose: group the i-th byte of every element together.
    /// Improves compression of data whose elements vary in their low bytes.
    Byte,
}

/// Codec configuration: compressor, compression level, and shuffle filter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CodecParams {
    id: CodecId,
    level: u32,
    shuffle: ShuffleFilter,
}

impl CodecParams {
    /// Create a configuration with no compression.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            id: CodecId::None,
            level: 0,
            shuffle: ShuffleFilter::None,
        }
    }

    /// Create a gzip configuration with compression level `level`.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidCompressionLevel`] if `level` exceeds 9.
    pub fn gzip(level: u32) -> Result<Self, CodecError> {
        if level <= 9 {
            Ok(Self {
                id: CodecId::Gzip,
                level,
                shuffle: ShuffleFilter::None,
            })
        } else {
            Err(CodecError::InvalidCompressionLevel(level))
        }
    }

    /// Set the shuffle filter.
    #[must_use]
    pub const fn shuffle(mut self, shuffle: ShuffleFilter) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Return the compressor identifier.
    #[must_use]
    pub const fn id(&self) -> CodecId {
        self.id
    }

    /// Return the compression level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Return the shuffle filter.
    #[must_use]
    pub const fn shuffle_filter(&self) -> ShuffleFilter {
        self.shuffle
    }
}

impl Default for CodecParams {
    fn default() -> Self {
        Self::none()
    }
}

/// Compressor traits: stateless whole-buffer compression.
pub trait CompressorTraits: Send + Sync + core::fmt::Debug {
    /// Encode `decoded`, returning the compressed bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if encoding fails.
    fn encode(&self, decoded: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Decode `encoded` into `decoded`, which must be exactly the decoded size.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if decoding fails or the decoded size does not
    /// match the length of `decoded`.
    fn decode_into(&self, encoded: &[u8], decoded: &mut [u8]) -> Result<(), CodecError>;
}

/// The identity compressor.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoneCompressor;

impl CompressorTraits for NoneCompressor {
    fn encode(&self, decoded: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(decoded)
    }

    fn decode_into(&self, encoded: &[u8], decoded: &mut [u8]) -> Result<(), CodecError> {
        if encoded.len() == decoded.len() {
            decoded.copy_from_slice(encoded);
            Ok(())
        } else {
            Err(CodecError::UnexpectedDecodedSize(
                encoded.len(),
                decoded.len(),
            ))
        }
    }
}

/// A `gzip` compressor.
#[derive(Copy, Clone, Debug)]
pub struct GzipCompressor {
    compression: flate2::Compression,
}

impl GzipCompressor {
    /// Create a new `gzip` compressor with compression level `level`.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidCompressionLevel`] if `level` exceeds 9.
    pub fn new(level: u32) -> Result<Self, CodecError> {
        if level <= 9 {
            Ok(Self {
                compression: flate2::Compression::new(level),
            })
        } else {
            Err(CodecError::InvalidCompressionLevel(level))
        }
    }
}

impl CompressorTraits for GzipCompressor {
    fn encode(&self, decoded: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = flate2::bufread::GzEncoder::new(decoded.as_slice(), self.compression);
        let mut encoded = Vec::new();
        encoder.read_to_end(&mut encoded)?;
        Ok(encoded)
    }

    fn decode_into(&self, encoded: &[u8], decoded: &mut [u8]) -> Result<(), CodecError> {
        let mut decoder = flate2::bufread::GzDecoder::new(encoded);
        let mut out = Vec::with_capacity(decoded.len());
        decoder.read_to_end(&mut out)?;
        if out.len() == decoded.len() {
            decoded.copy_from_slice(&out);
            Ok(())
        } else {
            Err(CodecError::UnexpectedDecodedSize(out.len(), decoded.len()))
        }
    }
}

/// The compression pipeline of an array: shuffle filter then compressor.
#[derive(Clone, Debug)]
pub struct CodecPipeline {
    compressor: Compressor,
    shuffle: ShuffleFilter,
    element_size: usize,
}

impl CodecPipeline {
    /// Create a new pipeline from `params` for elements of `element_size` bytes.
    ///
    /// # Panics
    /// Panics if the compression level of `params` exceeds 9; [`CodecParams`]
    /// constructors uphold this.
    #[must_use]
    pub fn new(params: &CodecParams, element_size: usize) -> Self {
        let compressor: Compressor = match params.id() {
            CodecId::None => Arc::new(NoneCompressor),
            CodecId::Gzip => Arc::new(GzipCompressor::new(params.level()).unwrap()),
        };
        Self {
            compressor,
            shuffle: params.shuffle_filter(),
            element_size,
        }
    }

    /// Encode the bytes of a whole chunk.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if encoding fails.
    pub fn encode(&self, mut decoded: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        if self.shuffle == ShuffleFilter::Byte && self.element_size > 1 {
            decoded = shuffle(&decoded, self.element_size);
        }
        self.compressor.encode(decoded)
    }

    /// Decode `encoded` into the chunk buffer `decoded`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if decoding fails or the decoded size does not
    /// match the length of `decoded`.
    pub fn decode_into(&self, encoded: &[u8], decoded: &mut [u8]) -> Result<(), CodecError> {
        self.compressor.decode_into(encoded, decoded)?;
        if self.shuffle == ShuffleFilter::Byte && self.element_size > 1 {
            let shuffled = decoded.to_vec();
            unshuffle_into(&shuffled, decoded, self.element_size);
        }
        Ok(())
    }
}

/// Byte transpose `bytes` with `element_size` byte elements.
fn shuffle(bytes: &[u8], element_size: usize) -> Vec<u8> {
    debug_assert_eq!(bytes.len() % element_size, 0);
    let num_elements = bytes.len() / element_size;
    let mut shuffled = vec![0; bytes.len()];
    for byte in 0..element_size {
        for element in 0..num_elements {
            shuffled[byte * num_elements + element] = bytes[element * element_size + byte];
        }
    }
    shuffled
}

/// Invert [`shuffle`], writing into `bytes`.
fn unshuffle_into(shuffled: &[u8], bytes: &mut [u8], element_size: usize) {
    debug_assert_eq!(shuffled.len() % element_size, 0);
    let num_elements = shuffled.len() / element_size;
    for byte in 0..element_size {
        for element in 0..num_elements {
            bytes[element * element_size + byte] = shuffled[byte * num_elements + element];
        }
    }
}

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid compression level.
    #[error("invalid compression level {0}, must be 0-9")]
    InvalidCompressionLevel(u32),
    /// The decoded size does not match the expected chunk size.
    #[error("unexpected decoded size {0}, expected {1}")]
    UnexpectedDecodedSize(usize, usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_params() {
        assert!(CodecParams::gzip(9).is_ok());
        assert!(matches!(
            CodecParams::gzip(10),
            Err(CodecError::InvalidCompressionLevel(10))
        ));
        assert_eq!(CodecParams::default().id(), CodecId::None);
    }

    #[test]
    fn shuffle_round_trip() {
        let bytes: Vec<u8> = (0..12).collect();
        let shuffled = shuffle(&bytes, 4);
        assert_eq!(shuffled, vec![0, 4, 8, 1, 5, 9, 2, 6, 10, 3, 7, 11]);
        let mut unshuffled = vec![0; 12];
        unshuffle_into(&shuffled, &mut unshuffled, 4);
        assert_eq!(unshuffled, bytes);
    }

    #[test]
    fn gzip_round_trip() {
        let pipeline = CodecPipeline::new(&CodecParams::gzip(5).unwrap(), 1);
        let decoded: Vec<u8> = (0..64).map(|i| i % 7).collect();
        let encoded = pipeline.encode(decoded.clone()).unwrap();
        let mut out = vec![0; decoded.len()];
        pipeline.decode_into(&encoded, &mut out).unwrap();
        assert_eq!(out, decoded);

        // wrong output size
        let mut out = vec![0; decoded.len() - 1];
        assert!(matches!(
            pipeline.decode_into(&encoded, &mut out),
            Err(CodecError::UnexpectedDecodedSize(..))
        ));
    }

    #[test]
    fn gzip_shuffle_round_trip() {
        let params = CodecParams::gzip(5).unwrap().shuffle(ShuffleFilter::Byte);
        let pipeline = CodecPipeline::new(&params, 4);
        let decoded: Vec<u8> = (0..64u32)
            .flat_map(|element| element.to_ne_bytes())
            .collect();
        let encoded = pipeline.encode(decoded.clone()).unwrap();
        let mut out = vec![0; decoded.len()];
        pipeline.decode_into(&encoded, &mut out).unwrap();
        assert_eq!(out, decoded);
    }

    #[test]
    fn none_round_trip() {
        let pipeline = CodecPipeline::new(&CodecParams::none(), 2);
        let decoded: Vec<u8> = (0..16).collect();
        let encoded = pipeline.encode(decoded.clone()).unwrap();
        assert_eq!(encoded, decoded);
        let mut out = vec![0; decoded.len()];
        pipeline.decode_into(&encoded, &mut out).unwrap();
        assert_eq!(out, decoded);
    }
}
