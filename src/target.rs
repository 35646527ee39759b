//! Target image preparation and grid iteration.
//!
//! The decoded target is enlarged, center-cropped so a whole number of
//! tiles fits in each direction, and downsampled once into the match
//! representation. Grid cells are then yielded in a fixed order, each
//! carrying its full-resolution bounding box and its query feature vector.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use thiserror::Error;

use crate::config::{ColorMode, MosaicConfig};
use crate::feature::FeatureVector;

/// Error while preparing the target image.
#[derive(Debug, Error)]
pub enum TargetError {
    /// The enlarged target does not fit even one tile
    #[error("target image ({width}x{height} after enlargement) is smaller than one {tile_size}px tile")]
    TooSmall { width: u32, height: u32, tile_size: u32 },
}

/// A cell's bounding box in full-resolution output coordinates.
///
/// `x1`/`y1` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CellBox {
    /// Box width in pixels.
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    /// Box height in pixels.
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// One unit of matching work: a box to fill and the query describing it.
#[derive(Debug, Clone)]
pub struct GridCell {
    /// Where the chosen tile will be pasted.
    pub bounds: CellBox,
    /// Downsampled color content of this cell.
    pub query: FeatureVector,
}

/// The enlarged, cropped target image plus its match representation.
#[derive(Debug)]
pub struct PreparedTarget {
    width: u32,
    height: u32,
    small: RgbImage,
    tile_size: u32,
    feature_edge: u32,
    color_mode: ColorMode,
}

impl PreparedTarget {
    /// Enlarge, crop and downsample a decoded target image.
    pub fn prepare(image: DynamicImage, config: &MosaicConfig) -> Result<Self, TargetError> {
        let image = match config.color_mode {
            ColorMode::Gray => DynamicImage::ImageLuma8(image.to_luma8()),
            ColorMode::Color => image,
        };
        let rgb = image.to_rgb8();

        let width = rgb.width() * config.enlargement;
        let height = rgb.height() * config.enlargement;

        let columns = width / config.tile_size;
        let rows = height / config.tile_size;
        if columns == 0 || rows == 0 {
            return Err(TargetError::TooSmall { width, height, tile_size: config.tile_size });
        }

        let large = imageops::resize(&rgb, width, height, FilterType::Lanczos3);

        // Crop centrally so the grid tiles the canvas exactly
        let cropped_width = columns * config.tile_size;
        let cropped_height = rows * config.tile_size;
        let cropped = imageops::crop_imm(
            &large,
            (width - cropped_width) / 2,
            (height - cropped_height) / 2,
            cropped_width,
            cropped_height,
        )
        .to_image();

        // One downsample pass sized so every cell region holds exactly
        // feature_edge x feature_edge samples
        let feature_edge = config.feature_edge();
        let small = imageops::resize(
            &cropped,
            columns * feature_edge,
            rows * feature_edge,
            FilterType::Lanczos3,
        );

        Ok(Self {
            width: cropped_width,
            height: cropped_height,
            small,
            tile_size: config.tile_size,
            feature_edge,
            color_mode: config.color_mode,
        })
    }

    /// Full-resolution output dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Grid cells per row.
    pub fn columns(&self) -> u32 {
        self.width / self.tile_size
    }

    /// Grid cells per column.
    pub fn rows(&self) -> u32 {
        self.height / self.tile_size
    }

    /// Total number of grid cells.
    pub fn cell_count(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    /// Iterate the grid in a fixed column-major order.
    ///
    /// The enumeration order is deterministic but carries no correctness
    /// weight: every cell names its own box, so results may arrive in any
    /// order downstream.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        let tile_size = self.tile_size;
        let edge = self.feature_edge;
        let rows = self.rows();
        (0..self.columns()).flat_map(move |cx| {
            (0..rows).map(move |cy| GridCell {
                bounds: CellBox {
                    x0: cx * tile_size,
                    y0: cy * tile_size,
                    x1: (cx + 1) * tile_size,
                    y1: (cy + 1) * tile_size,
                },
                query: FeatureVector::from_region(
                    &self.small,
                    cx * edge,
                    cy * edge,
                    edge,
                    edge,
                    self.color_mode,
                ),
            })
        })
    }
}
