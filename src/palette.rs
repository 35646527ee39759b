//! Tile palette construction.
//!
//! Discovers tile source images under a directory, normalizes each one to a
//! square tile, and pairs the full-resolution pixels with a small feature
//! vector for matching. The palette is built once and never mutated, which
//! is what makes lock-free concurrent lookup by the matching workers safe.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::{ColorMode, MosaicConfig};
use crate::feature::FeatureVector;

/// Error while locating tile source files.
#[derive(Debug, Error)]
pub enum PaletteError {
    /// The tile path does not point at a directory
    #[error("tile directory '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// The directory path produced an invalid search pattern
    #[error("invalid tile search pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// An immutable, indexed collection of tiles.
///
/// Indexes returned by the matcher address both the feature slice and the
/// full-resolution pixel buffers.
#[derive(Debug, Clone, Default)]
pub struct TilePalette {
    features: Vec<FeatureVector>,
    tiles: Vec<RgbImage>,
}

/// A loaded palette together with how many source files were skipped.
#[derive(Debug)]
pub struct LoadedPalette {
    /// The usable tiles.
    pub palette: TilePalette,
    /// Files that failed to decode and never entered the palette.
    pub skipped: usize,
}

impl TilePalette {
    /// Load every readable image under `dir` (searched recursively).
    ///
    /// Unreadable or undecodable files are skipped and counted, never
    /// fatal. Palette order follows the sorted file paths so that repeated
    /// runs see identical tile indexes; the per-file decode and resize work
    /// runs in parallel.
    pub fn load(dir: &Path, config: &MosaicConfig) -> Result<LoadedPalette, PaletteError> {
        if !dir.is_dir() {
            return Err(PaletteError::NotADirectory(dir.to_path_buf()));
        }

        let pattern = dir.join("**").join("*");
        let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let processed: Vec<Option<(RgbImage, FeatureVector)>> =
            paths.par_iter().map(|path| process_file(path, config)).collect();

        let mut palette = TilePalette::default();
        let mut skipped = 0;
        for entry in processed {
            match entry {
                Some((pixels, features)) => {
                    palette.tiles.push(pixels);
                    palette.features.push(features);
                }
                None => skipped += 1,
            }
        }

        Ok(LoadedPalette { palette, skipped })
    }

    /// Build a palette from already-decoded images, in the given order.
    pub fn from_images<I>(images: I, config: &MosaicConfig) -> Self
    where
        I: IntoIterator<Item = DynamicImage>,
    {
        let mut palette = TilePalette::default();
        for image in images {
            let (pixels, features) = process_image(image, config);
            palette.tiles.push(pixels);
            palette.features.push(features);
        }
        palette
    }

    /// Small feature vectors, indexed by tile id. Shared read-only with the
    /// matching workers.
    pub fn features(&self) -> &[FeatureVector] {
        &self.features
    }

    /// Full-resolution pixel buffer of one tile.
    pub fn tile(&self, id: usize) -> &RgbImage {
        &self.tiles[id]
    }

    /// Number of tiles in the palette.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True when no usable tile was found.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Decode one tile file; `None` drops it from the palette.
fn process_file(path: &Path, config: &MosaicConfig) -> Option<(RgbImage, FeatureVector)> {
    let image = image::open(path).ok()?;
    Some(process_image(image, config))
}

/// Normalize a source image into tile pixels plus its feature vector.
///
/// The largest centered square is cut out, then resized to the tile edge
/// (output pixels) and to the feature edge (matching samples).
fn process_image(image: DynamicImage, config: &MosaicConfig) -> (RgbImage, FeatureVector) {
    let image = match config.color_mode {
        ColorMode::Gray => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorMode::Color => image,
    };
    let rgb = image.to_rgb8();

    let (width, height) = rgb.dimensions();
    let edge = width.min(height);
    let square =
        imageops::crop_imm(&rgb, (width - edge) / 2, (height - edge) / 2, edge, edge).to_image();

    let pixels = imageops::resize(&square, config.tile_size, config.tile_size, FilterType::Lanczos3);
    let small =
        imageops::resize(&square, config.feature_edge(), config.feature_edge(), FilterType::Lanczos3);
    let features = FeatureVector::from_image(&small, config.color_mode);

    (pixels, features)
}
