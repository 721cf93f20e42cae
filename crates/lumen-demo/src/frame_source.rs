//! Frame sources standing in for a live camera.
//!
//! The render loop only ever asks for "the next frame or none".

use std::path::{Path, PathBuf};

use image::Rgb;
use lumen_core::Frame;

use crate::image_loader::{self, ImageLoadError};

/// A lazy, endless supply of frames.
pub trait FrameSource: Send {
    /// Next frame, or `None` when no frame is available this tick.
    fn grab(&mut self) -> Option<Frame>;
}

/// Repeats one still image forever.
pub struct StillImageSource {
    frame: Frame,
}

impl StillImageSource {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }

    pub fn open(path: &Path) -> Result<Self, ImageLoadError> {
        Ok(Self::new(image_loader::load_frame(path)?))
    }
}

impl FrameSource for StillImageSource {
    fn grab(&mut self) -> Option<Frame> {
        Some(self.frame.clone())
    }
}

/// Cycles through the images of a directory in file-name order.
///
/// Files that fail to decode are skipped for that tick.
pub struct DirectorySource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl DirectorySource {
    pub fn open(dir: &Path) -> Result<Self, ImageLoadError> {
        Ok(Self {
            paths: image_loader::list_frames(dir)?,
            next: 0,
        })
    }
}

impl FrameSource for DirectorySource {
    fn grab(&mut self) -> Option<Frame> {
        let path = &self.paths[self.next];
        self.next = (self.next + 1) % self.paths.len();
        match image_loader::load_frame(path) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::warn!("skipping {}: {e}", path.display());
                None
            }
        }
    }
}

/// A diagonal color gradient that drifts one step per frame, with a little
/// deterministic speckle so the denoisers have something to do.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    tick: u32,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tick: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn grab(&mut self) -> Option<Frame> {
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);
        let (w, h) = (self.width.max(1), self.height.max(1));
        let phase = tick % (w + h);

        Some(Frame::from_fn(self.width, self.height, |x, y| {
            let base = ((x + y + phase) * 160 / (w + h) % 256) as u8;
            let speckle = if (x * 7 + y * 13 + tick % 29) % 29 == 0 { 90 } else { 0 };
            Rgb([
                base.saturating_add(speckle),
                (y * 120 / h) as u8 + 40,
                160u8.saturating_sub(base / 2),
            ])
        }))
    }
}
