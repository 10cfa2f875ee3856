//! Trait and value definitions for perceptual fingerprints.

use super::fast_decode::FastDecoder;
use crate::error::FingerprintError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A computed perceptual hash that can be compared
pub trait PerceptualHash: Clone + Send + Sync {
    /// Compute the Hamming distance to another hash
    ///
    /// Returns the number of bits that differ between the two hashes.
    /// Lower distance = more similar images.
    fn distance(&self, other: &Self) -> u32;

    /// Get the raw hash bytes
    fn as_bytes(&self) -> &[u8];

    /// Get the hash as a hexadecimal string
    fn to_hex(&self) -> String {
        self.as_bytes()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Get the total number of bits in this hash
    fn bit_count(&self) -> u32 {
        (self.as_bytes().len() * 8) as u32
    }

    /// Calculate similarity as a percentage (0-100)
    fn similarity(&self, other: &Self) -> f64 {
        let distance = self.distance(other);
        let max_distance = self.bit_count();
        if max_distance == 0 {
            return 100.0;
        }
        (1.0 - (distance as f64 / max_distance as f64)) * 100.0
    }
}

/// Fixed-width perceptual fingerprint.
///
/// Bits are packed most-significant first: bit 0 of the grid is the top
/// bit of byte 0. Ordering compares the packed bytes, which for equal
/// widths is the same as comparing the fingerprints as unsigned integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Wrap already packed bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Build a 64-bit fingerprint from its integer value
    pub fn from_u64(value: u64) -> Self {
        Self {
            bytes: value.to_be_bytes().to_vec(),
        }
    }

    /// Integer value, if this is a 64-bit fingerprint
    pub fn as_u64(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.bytes.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }

    /// The leading `bits` bits as an integer (at most 64).
    ///
    /// Used as the coarse bucket key during clustering. Zero bits yields 0,
    /// which puts everything in one bucket.
    pub fn prefix(&self, bits: u32) -> u64 {
        let bits = bits.min(self.bit_count()).min(64);
        let mut value = 0u64;
        for i in 0..bits {
            let byte = self.bytes[(i / 8) as usize];
            let bit = (byte >> (7 - i % 8)) & 1;
            value = (value << 1) | u64::from(bit);
        }
        value
    }
}

impl PerceptualHash for Fingerprint {
    fn distance(&self, other: &Self) -> u32 {
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// An algorithm that turns an image into a [`Fingerprint`].
///
/// Implementations must be pure: the same pixels always give the same
/// fingerprint, and no state is shared between calls.
pub trait FingerprintAlgorithm: Send + Sync {
    /// Compute a fingerprint from an already-decoded image
    fn fingerprint_image(&self, image: &DynamicImage) -> Result<Fingerprint, FingerprintError>;

    /// Width of the fingerprints this algorithm produces
    fn bit_count(&self) -> u32;

    /// Compute a fingerprint from encoded image bytes
    fn fingerprint_bytes(&self, bytes: &[u8], path: &Path) -> Result<Fingerprint, FingerprintError> {
        let image = FastDecoder::decode_bytes(bytes, path)?;
        self.fingerprint_image(&image).map_err(|e| e.with_path(path))
    }

    /// Compute a fingerprint directly from a file path.
    ///
    /// JPEGs go through zune-jpeg, everything else through the image crate.
    fn fingerprint_file(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let image = FastDecoder::decode(path)?;
        self.fingerprint_image(&image).map_err(|e| e.with_path(path))
    }
}
