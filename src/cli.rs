//! Command-line interface implementation

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{self, default_worker_count, ColorMode, MosaicConfig};
use crate::output::save_image;
use crate::palette::TilePalette;
use crate::pipeline::compose;
use crate::progress::ProgressCounter;
use crate::target::PreparedTarget;

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// pxm - build a photo mosaic from a target image and a directory of tile images
#[derive(Parser)]
#[command(name = "pxm")]
#[command(about = "Build a photo mosaic from a target image and a directory of tile images")]
#[command(version)]
pub struct Cli {
    /// Target image the mosaic will reproduce
    pub image: PathBuf,

    /// Directory of tile source images, searched recursively
    pub tiles: PathBuf,

    /// Output file; the extension picks the format
    #[arg(short, long, default_value = config::DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Match and render in grayscale
    #[arg(long)]
    pub gray: bool,

    /// Tile edge length in pixels
    #[arg(long, default_value_t = config::DEFAULT_TILE_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub tile_size: u32,

    /// Tile matching resolution (higher values fit better but cost more)
    #[arg(long = "match-res", default_value_t = config::DEFAULT_MATCH_RESOLUTION, value_parser = clap::value_parser!(u32).range(1..))]
    pub match_resolution: u32,

    /// Enlargement factor applied to the target before gridding
    #[arg(long = "enlarge", default_value_t = config::DEFAULT_ENLARGEMENT, value_parser = clap::value_parser!(u32).range(1..))]
    pub enlargement: u32,

    /// Number of matching workers (default: available cores minus one)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    run_mosaic(&cli)
}

/// Execute a full mosaic build
fn run_mosaic(cli: &Cli) -> ExitCode {
    let config = MosaicConfig {
        tile_size: cli.tile_size,
        match_resolution: cli.match_resolution,
        enlargement: cli.enlargement,
        color_mode: if cli.gray { ColorMode::Gray } else { ColorMode::Color },
        worker_count: cli.workers.unwrap_or_else(default_worker_count).max(1),
    };

    // Build the tile palette
    println!("Reading tiles from \"{}\"...", cli.tiles.display());
    let loaded = match TilePalette::load(&cli.tiles, &config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    if loaded.skipped > 0 {
        eprintln!("Warning: skipped {} unreadable tile file(s)", loaded.skipped);
    }
    println!("Processed {} tiles.", loaded.palette.len());
    if loaded.palette.is_empty() {
        eprintln!("Warning: no usable tiles found, every cell will be left blank");
    }

    // Prepare the target
    println!("Processing main image...");
    let image = match image::open(&cli.image) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: cannot open target image '{}': {}", cli.image.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let target = match PreparedTarget::prepare(image, &config) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    // Ctrl-C flips the cancel flag; the pipeline drains and hands back a
    // partial canvas instead of dying mid-paste
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed)) {
            eprintln!("Warning: cannot install Ctrl-C handler: {}", e);
        }
    }

    println!("Building mosaic, press Ctrl-C to abort...");
    let mut progress = ProgressCounter::new(target.cell_count());
    let result = compose(&target, &loaded.palette, &config, &cancel, |done, _| {
        progress.update(done);
    });
    progress.finish();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Err(e) = save_image(&report.image, &cli.output) {
        eprintln!("Error: failed to save '{}': {}", cli.output.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    if report.interrupted {
        println!("Interrupted: partial mosaic saved to {}", cli.output.display());
    } else {
        println!("Finished, output is in {}", cli.output.display());
    }
    if report.unmatched > 0 {
        eprintln!("Warning: {} cell(s) had no matching tile and were left blank", report.unmatched);
    }

    ExitCode::from(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses_defaults() {
        let cli = Cli::parse_from(["pxm", "photo.png", "tiles"]);
        assert_eq!(cli.output, PathBuf::from("mosaic.jpeg"));
        assert!(!cli.gray);
        assert_eq!(cli.tile_size, 50);
        assert_eq!(cli.match_resolution, 5);
        assert_eq!(cli.enlargement, 5);
        assert_eq!(cli.workers, None);
    }

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::parse_from([
            "pxm", "photo.png", "tiles", "-o", "out.png", "--gray", "--tile-size", "32",
            "--match-res", "8", "--enlarge", "2", "-j", "3",
        ]);
        assert_eq!(cli.output, PathBuf::from("out.png"));
        assert!(cli.gray);
        assert_eq!(cli.tile_size, 32);
        assert_eq!(cli.match_resolution, 8);
        assert_eq!(cli.enlargement, 2);
        assert_eq!(cli.workers, Some(3));
    }

    #[test]
    fn test_cli_rejects_zero_tile_size() {
        assert!(Cli::try_parse_from(["pxm", "photo.png", "tiles", "--tile-size", "0"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
