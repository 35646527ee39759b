//! Run configuration for mosaic construction.
//!
//! All tunables live in one struct that is threaded through palette
//! construction, target preparation and the pipeline - there is no
//! process-wide state.

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 50;

/// Default tile matching resolution (higher values give a better fit but
/// require more processing).
pub const DEFAULT_MATCH_RESOLUTION: u32 = 5;

/// Default enlargement factor applied to the target before gridding.
pub const DEFAULT_ENLARGEMENT: u32 = 5;

/// Default output filename.
pub const DEFAULT_OUTPUT: &str = "mosaic.jpeg";

/// Channel interpretation for matching and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Full RGB matching, three channel values per feature sample.
    Color,
    /// Grayscale matching, one luma value per feature sample.
    Gray,
}

impl ColorMode {
    /// Number of channel values contributed by one pixel sample.
    pub fn channels(&self) -> usize {
        match self {
            ColorMode::Color => 3,
            ColorMode::Gray => 1,
        }
    }
}

/// Configuration for one mosaic run.
#[derive(Debug, Clone)]
pub struct MosaicConfig {
    /// Height/width of mosaic tiles in pixels.
    pub tile_size: u32,
    /// Tile matching resolution, clamped to `tile_size`.
    pub match_resolution: u32,
    /// The mosaic will be this many times wider and taller than the target.
    pub enlargement: u32,
    /// Channel interpretation for matching and output.
    pub color_mode: ColorMode,
    /// Number of matching workers.
    pub worker_count: usize,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            match_resolution: DEFAULT_MATCH_RESOLUTION,
            enlargement: DEFAULT_ENLARGEMENT,
            color_mode: ColorMode::Color,
            worker_count: default_worker_count(),
        }
    }
}

impl MosaicConfig {
    /// Edge length in pixels of the region covered by one feature sample.
    ///
    /// A match resolution above `tile_size` is clamped; a block size of 1
    /// means every tile pixel becomes a sample.
    pub fn block_size(&self) -> u32 {
        let tile_size = self.tile_size.max(1);
        tile_size / self.match_resolution.clamp(1, tile_size)
    }

    /// Edge length of the downsampled representation used for matching.
    pub fn feature_edge(&self) -> u32 {
        self.tile_size / self.block_size()
    }

    /// Number of channel values in every feature vector of this run.
    pub fn feature_len(&self) -> usize {
        let edge = self.feature_edge() as usize;
        edge * edge * self.color_mode.channels()
    }
}

/// Default worker count: one unit is reserved for the driver and the
/// assembly consumer, and there is always at least one worker.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}
