//! Size and aspect-ratio guard applied before fingerprinting.
//!
//! Tiny or extremely elongated images collapse to a handful of source
//! pixels per grid cell, and their gradients stop meaning anything.

use crate::error::FingerprintError;
use std::path::PathBuf;

/// Smallest accepted width and height, in pixels
pub const DEFAULT_MIN_DIMENSION: u32 = 50;
/// Narrowest accepted width / height ratio
pub const DEFAULT_MIN_ASPECT: f64 = 0.2;
/// Widest accepted width / height ratio
pub const DEFAULT_MAX_ASPECT: f64 = 5.0;

/// Decoded-geometry bounds an image must satisfy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryLimits {
    pub min_dimension: u32,
    pub min_aspect: f64,
    pub max_aspect: f64,
}

impl GeometryLimits {
    /// Check decoded dimensions; the error carries an empty path.
    pub fn check(&self, width: u32, height: u32) -> Result<(), FingerprintError> {
        let degenerate = || FingerprintError::DegenerateImage {
            path: PathBuf::new(),
            width,
            height,
        };

        if width < self.min_dimension || height < self.min_dimension || height == 0 {
            return Err(degenerate());
        }

        let aspect = width as f64 / height as f64;
        if aspect < self.min_aspect || aspect > self.max_aspect {
            return Err(degenerate());
        }

        Ok(())
    }
}

impl Default for GeometryLimits {
    fn default() -> Self {
        Self {
            min_dimension: DEFAULT_MIN_DIMENSION,
            min_aspect: DEFAULT_MIN_ASPECT,
            max_aspect: DEFAULT_MAX_ASPECT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_photo() {
        assert!(GeometryLimits::default().check(4032, 3024).is_ok());
    }

    #[test]
    fn rejects_below_minimum_size() {
        let limits = GeometryLimits::default();
        assert!(limits.check(49, 100).is_err());
        assert!(limits.check(100, 49).is_err());
        assert!(limits.check(50, 50).is_ok());
    }

    #[test]
    fn aspect_bounds_are_inclusive() {
        let limits = GeometryLimits::default();
        assert!(limits.check(500, 100).is_ok());
        assert!(limits.check(100, 500).is_ok());
        assert!(limits.check(501, 100).is_err());
        assert!(limits.check(100, 501).is_err());
    }
}
