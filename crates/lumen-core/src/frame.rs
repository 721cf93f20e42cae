//! Frame representation and per-channel helpers shared by the enhancers.

use image::{GrayImage, RgbImage, imageops};

/// A single 8-bit RGB frame flowing through the pipeline.
pub type Frame = RgbImage;

/// A 256-entry lookup table mapping input intensities to output intensities.
pub type Lut = [u8; 256];

/// Build the identity table `i -> i`.
pub fn identity_lut() -> Lut {
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        *entry = i as u8;
    }
    lut
}

/// Remap every R, G and B sample of `frame` through `lut`.
pub fn apply_lut(frame: &Frame, lut: &Lut) -> Frame {
    let mut out = frame.clone();
    for sample in out.iter_mut() {
        *sample = lut[*sample as usize];
    }
    out
}

/// Split a frame into its R, G and B planes.
pub fn split_channels(frame: &Frame) -> [GrayImage; 3] {
    let (width, height) = frame.dimensions();
    let mut planes = [
        GrayImage::new(width, height),
        GrayImage::new(width, height),
        GrayImage::new(width, height),
    ];
    for (x, y, px) in frame.enumerate_pixels() {
        for (c, plane) in planes.iter_mut().enumerate() {
            plane.put_pixel(x, y, image::Luma([px.0[c]]));
        }
    }
    planes
}

/// Merge three equally sized planes back into an RGB frame.
pub fn merge_channels(planes: &[GrayImage; 3]) -> Frame {
    let (width, height) = planes[0].dimensions();
    debug_assert!(planes.iter().all(|p| p.dimensions() == (width, height)));
    Frame::from_fn(width, height, |x, y| {
        image::Rgb([
            planes[0].get_pixel(x, y).0[0],
            planes[1].get_pixel(x, y).0[0],
            planes[2].get_pixel(x, y).0[0],
        ])
    })
}

/// Place `left` and `right` next to each other on one canvas.
///
/// The canvas is as wide as both frames together and as tall as the taller
/// one; uncovered pixels stay black.
pub fn side_by_side(left: &Frame, right: &Frame) -> Frame {
    let width = left.width() + right.width();
    let height = left.height().max(right.height());
    let mut canvas = Frame::new(width, height);
    imageops::replace(&mut canvas, left, 0, 0);
    imageops::replace(&mut canvas, right, i64::from(left.width()), 0);
    canvas
}

/// Resize a frame for display using nearest-neighbour sampling.
pub fn resize_for_display(frame: &Frame, width: u32, height: u32) -> Frame {
    if frame.dimensions() == (width, height) {
        return frame.clone();
    }
    imageops::resize(frame, width, height, imageops::FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Frame {
        Frame::from_fn(width, height, |x, y| {
            image::Rgb([(x * 10) as u8, (y * 20) as u8, ((x + y) * 5) as u8])
        })
    }

    #[test]
    fn test_identity_lut_is_identity() {
        let frame = gradient(5, 4);
        assert_eq!(apply_lut(&frame, &identity_lut()), frame);
    }

    #[test]
    fn test_split_merge_preserves_frame() {
        let frame = gradient(6, 3);
        let planes = split_channels(&frame);
        assert_eq!(planes[1].get_pixel(2, 1).0[0], 20);
        assert_eq!(merge_channels(&planes), frame);
    }

    #[test]
    fn test_side_by_side_layout() {
        let left = Frame::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let right = Frame::from_pixel(2, 4, image::Rgb([200, 100, 50]));
        let canvas = side_by_side(&left, &right);
        assert_eq!(canvas.dimensions(), (5, 4));
        assert_eq!(canvas.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(canvas.get_pixel(3, 3).0, [200, 100, 50]);
        // Below the shorter left frame the canvas stays black.
        assert_eq!(canvas.get_pixel(1, 3).0, [0, 0, 0]);
    }

    #[test]
    fn test_resize_for_display_dimensions() {
        let frame = gradient(8, 4);
        let resized = resize_for_display(&frame, 4, 2);
        assert_eq!(resized.dimensions(), (4, 2));
    }
}
