//! # Hasher Module
//!
//! Computes perceptual fingerprints for images.
//!
//! ## How It Works
//! 1. Decode the file (zune-jpeg for JPEG, image crate otherwise)
//! 2. Reject images below 50x50 or outside a 1:5 / 5:1 aspect ratio
//! 3. Resample to a small grayscale grid
//! 4. Turn horizontal brightness gradients into bits (dHash)
//! 5. Compare fingerprints using Hamming distance
//!
//! ## Performance Optimizations
//! - Uses `zune-jpeg` for 1.5-2x faster JPEG decoding
//! - Uses `fast_image_resize` for SIMD-accelerated resampling
//!
//! ## Example
//! ```rust,ignore
//! use perceptual_dedup::core::hasher::HasherConfig;
//!
//! let hasher = HasherConfig::new().hash_size(8).build()?;
//! let fingerprint = hasher.fingerprint_file(&path)?;
//! ```

mod algorithms;
pub mod fast_decode;
pub mod fast_resize;
mod geometry;
mod traits;

pub use algorithms::DifferenceHasher;
pub use geometry::{
    GeometryLimits, DEFAULT_MAX_ASPECT, DEFAULT_MIN_ASPECT, DEFAULT_MIN_DIMENSION,
};
pub use traits::{Fingerprint, FingerprintAlgorithm, PerceptualHash};

use crate::error::DedupError;

/// Default grid size: 8x8 gradients, 64-bit fingerprints
pub const DEFAULT_HASH_SIZE: u32 = 8;

/// Configuration builder for hashers
#[derive(Debug, Clone)]
pub struct HasherConfig {
    /// Grid size N; fingerprints are N*N bits
    hash_size: u32,
    /// Geometry an image must satisfy to be fingerprinted
    limits: GeometryLimits,
}

impl HasherConfig {
    /// Create a new hasher configuration with defaults
    pub fn new() -> Self {
        Self {
            hash_size: DEFAULT_HASH_SIZE,
            limits: GeometryLimits::default(),
        }
    }

    /// Set the grid size (2-32)
    ///
    /// - 8: 64 bits, fast, good for most uses
    /// - 16: 256 bits, more selective
    pub fn hash_size(mut self, size: u32) -> Self {
        self.hash_size = size;
        self
    }

    /// Smallest accepted width and height
    pub fn min_dimension(mut self, pixels: u32) -> Self {
        self.limits.min_dimension = pixels;
        self
    }

    /// Accepted width / height ratio range (inclusive)
    pub fn aspect_ratio(mut self, min: f64, max: f64) -> Self {
        self.limits.min_aspect = min;
        self.limits.max_aspect = max;
        self
    }

    /// Width of the fingerprints this configuration produces
    pub fn bit_count(&self) -> u32 {
        self.hash_size * self.hash_size
    }

    /// Check the configuration without building anything
    pub fn validate(&self) -> Result<(), DedupError> {
        if !(2..=32).contains(&self.hash_size) {
            return Err(DedupError::Config(format!(
                "hash size {} is out of range (2-32)",
                self.hash_size
            )));
        }
        let GeometryLimits {
            min_aspect,
            max_aspect,
            ..
        } = self.limits;
        if !(min_aspect > 0.0 && min_aspect <= max_aspect && max_aspect.is_finite()) {
            return Err(DedupError::Config(format!(
                "aspect ratio range [{}, {}] is invalid",
                min_aspect, max_aspect
            )));
        }
        Ok(())
    }

    /// Build the hasher
    pub fn build(self) -> Result<DifferenceHasher, DedupError> {
        self.validate()?;
        Ok(DifferenceHasher::with_limits(self.hash_size, self.limits))
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::new()
    }
}
