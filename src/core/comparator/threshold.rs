//! Threshold handling for fingerprint comparison.

use crate::error::CompareError;

/// Default maximum Hamming distance for two photos to count as duplicates
pub const DEFAULT_THRESHOLD: u32 = 5;

/// Maximum allowed Hamming distance between duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdStrategy {
    threshold: u32,
}

impl ThresholdStrategy {
    /// Create a threshold for fingerprints `bit_count` bits wide.
    ///
    /// Recommended values for 64-bit fingerprints:
    /// - 0: identical fingerprints only
    /// - 5: conservative, few false positives
    /// - 10: permissive, catches more edits
    pub fn new(threshold: u32, bit_count: u32) -> Result<Self, CompareError> {
        if threshold > bit_count {
            return Err(CompareError::InvalidThreshold {
                value: threshold,
                max: bit_count,
            });
        }
        Ok(Self { threshold })
    }

    /// Whether two photos at `distance` are duplicates
    pub fn is_duplicate(&self, distance: u32) -> bool {
        distance <= self.threshold
    }

    /// The configured threshold
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_at_boundary() {
        let strategy = ThresholdStrategy::new(5, 64).unwrap();

        assert!(strategy.is_duplicate(4));
        assert!(strategy.is_duplicate(5));
        assert!(!strategy.is_duplicate(6));
    }

    #[test]
    fn zero_threshold_only_accepts_identical() {
        let strategy = ThresholdStrategy::new(0, 64).unwrap();
        assert!(strategy.is_duplicate(0));
        assert!(!strategy.is_duplicate(1));
    }

    #[test]
    fn threshold_cannot_exceed_width() {
        assert!(ThresholdStrategy::new(64, 64).is_ok());
        assert!(matches!(
            ThresholdStrategy::new(65, 64),
            Err(CompareError::InvalidThreshold { value: 65, max: 64 })
        ));
    }
}
