//! pxm - command-line tool for building photo mosaics from tile image collections

use std::process::ExitCode;

use pixmosaic::cli;

fn main() -> ExitCode {
    cli::run()
}
