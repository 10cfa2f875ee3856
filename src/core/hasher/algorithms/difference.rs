//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Checking the decoded geometry against [`GeometryLimits`]
//! 2. Resampling to grayscale at (hash_size+1) x hash_size
//! 3. Comparing each pixel to the one on its right
//! 4. Setting the bit if the right pixel is brighter
//!
//! Rows are concatenated top to bottom, so the first row lands in the
//! most significant bits of the fingerprint.

use super::super::fast_resize::GrayResampler;
use super::super::geometry::GeometryLimits;
use super::super::traits::{Fingerprint, FingerprintAlgorithm};
use crate::error::FingerprintError;
use image::DynamicImage;

/// Difference Hash (dHash) implementation
pub struct DifferenceHasher {
    /// Size of the comparison grid (hash_size x hash_size bits)
    hash_size: u32,
    limits: GeometryLimits,
}

impl DifferenceHasher {
    /// Create a new dHash hasher with default geometry limits
    pub fn new(hash_size: u32) -> Self {
        Self::with_limits(hash_size, GeometryLimits::default())
    }

    /// Create a dHash hasher with explicit geometry limits
    pub fn with_limits(hash_size: u32, limits: GeometryLimits) -> Self {
        Self { hash_size, limits }
    }
}

impl FingerprintAlgorithm for DifferenceHasher {
    fn fingerprint_image(&self, image: &DynamicImage) -> Result<Fingerprint, FingerprintError> {
        self.limits.check(image.width(), image.height())?;

        // One extra column so every cell has a right-hand neighbour
        let gray = GrayResampler::new().resample(image, self.hash_size + 1, self.hash_size)?;

        let bits = (self.hash_size * self.hash_size) as usize;
        let mut bytes = Vec::with_capacity(bits.div_ceil(8));
        let mut current_byte: u8 = 0;
        let mut bit_position = 0;

        for y in 0..self.hash_size {
            for x in 0..self.hash_size {
                let left = gray.get_pixel(x, y)[0];
                let right = gray.get_pixel(x + 1, y)[0];

                if right > left {
                    current_byte |= 1 << (7 - bit_position);
                }

                bit_position += 1;
                if bit_position == 8 {
                    bytes.push(current_byte);
                    current_byte = 0;
                    bit_position = 0;
                }
            }
        }

        if bit_position > 0 {
            bytes.push(current_byte);
        }

        Ok(Fingerprint::from_bytes(&bytes))
    }

    fn bit_count(&self) -> u32 {
        self.hash_size * self.hash_size
    }
}
