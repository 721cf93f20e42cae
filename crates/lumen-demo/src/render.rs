//! Background render loop: grab, enhance, compose, hand off.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use lumen_core::{Frame, Pipeline, frame};
use tokio::sync::mpsc;

use crate::frame_source::FrameSource;

/// Capacity of the render → display channel. Frames are dropped when full.
pub const DISPLAY_QUEUE: usize = 4;

/// Counters reported when the loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub grabbed: u64,
    pub failed: u64,
    pub dropped: u64,
}

/// Everything the render thread needs.
pub struct RenderLoop {
    pub pipeline: Arc<Pipeline>,
    pub source: Box<dyn FrameSource>,
    pub display_size: (u32, u32),
    pub frame_delay: Duration,
}

impl RenderLoop {
    /// Run one tick. Returns `None` when there was nothing to show.
    pub fn tick(&mut self, stats: &mut RenderStats) -> Option<Frame> {
        let original = self.source.grab()?;
        stats.grabbed += 1;

        let processed = match self.pipeline.run(&original) {
            Ok(processed) => processed,
            Err(e) => {
                stats.failed += 1;
                tracing::warn!("skipping frame: {e}");
                return None;
            }
        };

        let composed = frame::side_by_side(&original, &processed);
        let (width, height) = self.display_size;
        Some(frame::resize_for_display(&composed, width, height))
    }

    /// Loop until `stop` is set or the receiver goes away.
    pub fn run(mut self, tx: mpsc::Sender<Frame>, stop: Arc<AtomicBool>) -> RenderStats {
        let mut stats = RenderStats::default();
        while !stop.load(Ordering::Relaxed) {
            if let Some(composed) = self.tick(&mut stats) {
                match tx.try_send(composed) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => stats.dropped += 1,
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
            std::thread::sleep(self.frame_delay);
        }
        tracing::info!(
            "render loop stopped: {} grabbed, {} failed, {} dropped",
            stats.grabbed,
            stats.failed,
            stats.dropped
        );
        stats
    }

    /// Start the loop on its own thread.
    pub fn spawn(
        self,
        stop: Arc<AtomicBool>,
    ) -> (mpsc::Receiver<Frame>, std::thread::JoinHandle<RenderStats>) {
        let (tx, rx) = mpsc::channel(DISPLAY_QUEUE);
        let handle = std::thread::spawn(move || self.run(tx, stop));
        (rx, handle)
    }
}
