//! Fast SIMD-accelerated grayscale downsampling.
//!
//! Uses fast_image_resize, which picks AVX2/NEON code paths when available.
//! Convolution filters are area-aware when shrinking, so every source
//! pixel contributes to the output grid.

use crate::error::FingerprintError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage};
use std::path::PathBuf;

fn resize_error(reason: String) -> FingerprintError {
    FingerprintError::UnreadableFile {
        path: PathBuf::new(),
        reason,
    }
}

/// Grayscale downsampler with a reusable resizer
pub struct GrayResampler {
    resizer: Resizer,
    filter: FilterType,
}

impl GrayResampler {
    /// Create a resampler using the default smooth filter (bilinear)
    pub fn new() -> Self {
        Self::with_filter(FilterType::Bilinear)
    }

    /// Create a resampler with an explicit convolution filter
    pub fn with_filter(filter: FilterType) -> Self {
        Self {
            resizer: Resizer::new(),
            filter,
        }
    }

    /// Convert to grayscale and resample to `width` x `height`.
    pub fn resample(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, FingerprintError> {
        // Converting first means the resizer works on one channel
        let gray = image.to_luma8();
        let (src_width, src_height) = gray.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err(resize_error("Invalid source dimensions".to_string()));
        }
        if width == 0 || height == 0 {
            return Err(resize_error("Invalid destination dimensions".to_string()));
        }

        let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
            .map_err(|e| resize_error(format!("Failed to create source image: {}", e)))?;
        let mut dst_image = Image::new(width, height, PixelType::U8);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(self.filter));
        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| resize_error(format!("Resize failed: {}", e)))?;

        GrayImage::from_raw(width, height, dst_image.into_vec())
            .ok_or_else(|| resize_error("Failed to create result buffer".to_string()))
    }
}

impl Default for GrayResampler {
    fn default() -> Self {
        Self::new()
    }
}
