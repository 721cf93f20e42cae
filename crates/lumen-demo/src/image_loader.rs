//! Image loading for the demo's frame sources.

use std::path::{Path, PathBuf};

use lumen_core::Frame;

/// Extensions picked up when cycling a directory of frames.
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Load an image from disk as an 8-bit RGB frame.
///
/// Supports common formats via the `image` crate. Alpha is dropped and
/// higher bit depths are reduced to 8 bits.
pub fn load_frame(path: &Path) -> Result<Frame, ImageLoadError> {
    let img = image::open(path).map_err(ImageLoadError::Decode)?;
    Ok(img.to_rgb8())
}

/// List the image files in `dir`, sorted by file name.
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, ImageLoadError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_frame = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if path.is_file() && is_frame {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        return Err(ImageLoadError::Empty(dir.to_path_buf()));
    }
    paths.sort();
    Ok(paths)
}

/// Errors that can occur during image loading.
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no image files in {}", .0.display())]
    Empty(PathBuf),
}
