//! Downsampled color summaries used for tile matching.
//!
//! A [`FeatureVector`] is a flat, channel-major sequence of values sampled
//! from a small image or a rectangular region of one. It exists purely for
//! similarity comparison; output quality comes from the full-resolution
//! tile buffers, never from these vectors.

use image::{imageops, RgbImage};

use crate::config::ColorMode;

/// ITU-R BT.601 luma from an RGB triple.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

/// A fixed-length color summary of an image region.
///
/// Immutable once built. In [`ColorMode::Color`] every pixel contributes
/// its three channel values; in [`ColorMode::Gray`] a single luma value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector {
    values: Vec<u8>,
}

impl FeatureVector {
    /// Build a feature vector from every pixel of `image`, row-major.
    pub fn from_image(image: &RgbImage, mode: ColorMode) -> Self {
        let mut values = Vec::with_capacity(
            image.width() as usize * image.height() as usize * mode.channels(),
        );
        for pixel in image.pixels() {
            let [r, g, b] = pixel.0;
            match mode {
                ColorMode::Color => values.extend_from_slice(&[r, g, b]),
                ColorMode::Gray => values.push(luma(r, g, b)),
            }
        }
        Self { values }
    }

    /// Build a feature vector from the `width` x `height` region of
    /// `image` whose top-left corner is `(x, y)`.
    pub fn from_region(
        image: &RgbImage,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        mode: ColorMode,
    ) -> Self {
        let region = imageops::crop_imm(image, x, y, width, height).to_image();
        Self::from_image(&region, mode)
    }

    /// Channel values, channel-major per sample.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Number of channel values in the vector.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the vector holds no samples.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
impl FeatureVector {
    /// Test constructor from raw channel values.
    pub fn from_raw(values: Vec<u8>) -> Self {
        Self { values }
    }
}
