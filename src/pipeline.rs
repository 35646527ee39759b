//! The parallel composition pipeline.
//!
//! One driver feeds grid cells through a bounded work channel to a pool of
//! matching workers; a single assembly consumer collects results and paints
//! the canvas. Termination is sentinel-counted: the driver enqueues exactly
//! one [`WorkItem::Done`] per worker, and each worker answers with one
//! [`ResultItem::WorkerDone`] before exiting. The consumer stops once it
//! has seen every worker's sentinel.
//!
//! Shared state is limited to the read-only palette and the channels; the
//! canvas has a single writer, so no locks are involved anywhere.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use image::RgbImage;
use thiserror::Error;

use crate::canvas::MosaicCanvas;
use crate::config::MosaicConfig;
use crate::feature::FeatureVector;
use crate::matcher;
use crate::palette::TilePalette;
use crate::target::{CellBox, GridCell, PreparedTarget};

/// Fatal pipeline faults. These indicate a protocol bug, not a runtime
/// condition to recover from.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every worker disappeared while the driver still had work to hand out
    #[error("work channel closed before all cells were dispatched")]
    WorkChannelClosed,
    /// All result producers vanished before each worker signalled completion
    #[error("result channel closed before every worker signalled completion")]
    ResultChannelClosed,
    /// The assembly consumer panicked
    #[error("pipeline thread panicked")]
    ThreadPanicked,
}

/// One message on the work distribution channel.
enum WorkItem {
    Cell(GridCell),
    /// No more work for the worker that pops this.
    Done,
}

/// One message on the result aggregation channel.
enum ResultItem {
    Match {
        bounds: CellBox,
        /// `None` when the palette was empty and no fit existed.
        tile: Option<usize>,
    },
    /// The sending worker has exited.
    WorkerDone,
}

/// Outcome of a pipeline run.
#[derive(Debug)]
pub struct MosaicReport {
    /// The assembled canvas - complete, or partial after an interruption.
    pub image: RgbImage,
    /// Cells painted with a best-fit tile.
    pub matched: usize,
    /// Cells left blank because no tile could match.
    pub unmatched: usize,
    /// True when the cancel flag stopped dispatch before the grid was done.
    pub interrupted: bool,
}

/// Run the full matching and composition pipeline.
///
/// Dispatches every grid cell of `target` to `config.worker_count` matching
/// workers and assembles their results into a canvas. `on_dispatch` is
/// invoked as `(dispatched, total)` after each cell is handed out.
///
/// Setting `cancel` (checked between cells) stops dispatch; sentinels are
/// still sent, in-flight results are drained, and the partial canvas comes
/// back with `interrupted` set rather than being discarded.
pub fn compose(
    target: &PreparedTarget,
    palette: &TilePalette,
    config: &MosaicConfig,
    cancel: &AtomicBool,
    mut on_dispatch: impl FnMut(usize, usize),
) -> Result<MosaicReport, PipelineError> {
    let worker_count = config.worker_count.max(1);
    let (width, height) = target.dimensions();
    let total = target.cell_count();

    // Bounded to the worker count: a fast driver blocks instead of
    // buffering the whole grid
    let (work_tx, work_rx) = bounded::<WorkItem>(worker_count);
    let (result_tx, result_rx) = unbounded::<ResultItem>();

    thread::scope(|scope| {
        for _ in 0..worker_count {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let features = palette.features();
            scope.spawn(move || worker_loop(work_rx, result_tx, features));
        }
        // Workers hold the only result senders now; the consumer observes
        // disconnection if any of them dies without its sentinel
        drop(work_rx);
        drop(result_tx);

        let canvas = MosaicCanvas::new(width, height);
        let consumer = scope.spawn(move || assemble(result_rx, palette, canvas, worker_count));

        let mut interrupted = false;
        let mut dispatched = 0;
        for cell in target.cells() {
            if cancel.load(Ordering::Relaxed) {
                interrupted = true;
                break;
            }
            if work_tx.send(WorkItem::Cell(cell)).is_err() {
                return Err(PipelineError::WorkChannelClosed);
            }
            dispatched += 1;
            on_dispatch(dispatched, total);
        }

        // Interrupted or not, every worker gets exactly one sentinel
        for _ in 0..worker_count {
            if work_tx.send(WorkItem::Done).is_err() {
                return Err(PipelineError::WorkChannelClosed);
            }
        }
        drop(work_tx);

        let (canvas, matched, unmatched) =
            consumer.join().map_err(|_| PipelineError::ThreadPanicked)??;

        Ok(MosaicReport { image: canvas.into_image(), matched, unmatched, interrupted })
    })
}

/// Matching worker: pop, match, push, until the sentinel arrives.
fn worker_loop(
    work_rx: Receiver<WorkItem>,
    result_tx: Sender<ResultItem>,
    features: &[FeatureVector],
) {
    while let Ok(item) = work_rx.recv() {
        match item {
            WorkItem::Cell(cell) => {
                let tile = matcher::best_fit(&cell.query, features);
                if result_tx.send(ResultItem::Match { bounds: cell.bounds, tile }).is_err() {
                    break;
                }
            }
            WorkItem::Done => break,
        }
    }
    let _ = result_tx.send(ResultItem::WorkerDone);
}

/// Assembly consumer: the canvas's sole writer.
fn assemble(
    result_rx: Receiver<ResultItem>,
    palette: &TilePalette,
    mut canvas: MosaicCanvas,
    worker_count: usize,
) -> Result<(MosaicCanvas, usize, usize), PipelineError> {
    let mut active_workers = worker_count;
    let mut matched = 0;
    let mut unmatched = 0;

    while active_workers > 0 {
        match result_rx.recv() {
            Ok(ResultItem::Match { bounds, tile }) => match tile {
                Some(id) => {
                    canvas.paste(palette.tile(id), &bounds);
                    matched += 1;
                }
                None => unmatched += 1,
            },
            Ok(ResultItem::WorkerDone) => active_workers -= 1,
            Err(_) => return Err(PipelineError::ResultChannelClosed),
        }
    }

    Ok((canvas, matched, unmatched))
}
