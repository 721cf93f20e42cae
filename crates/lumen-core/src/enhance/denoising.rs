//! Denoising enhancers: median blur and bilateral smoothing.

use image::Rgb;

use super::{EnhanceError, Enhancer, check_params, param_or};
use crate::frame::Frame;
use crate::params::{ParamSchema, ParamValues};

/// Median blur over a square `kernel_size` window.
///
/// The window radius is `kernel_size / 2`, so an even size behaves like the
/// next odd one and `kernel_size == 1` leaves the frame untouched.
#[derive(Debug, Clone)]
pub struct MedianFilterDenoiser {
    name: String,
}

impl MedianFilterDenoiser {
    /// Parameters the schema must declare.
    pub const REQUIRED: &'static [&'static str] = &["kernel_size"];
    /// Used when `kernel_size` is missing from the live parameters.
    pub const DEFAULT_KERNEL_SIZE: f64 = 9.0;

    pub fn new(name: &str, schema: &ParamSchema) -> Result<Self, EnhanceError> {
        check_params(Self::REQUIRED, schema)?;
        Ok(Self {
            name: name.to_string(),
        })
    }
}

impl Enhancer for MedianFilterDenoiser {
    fn name(&self) -> &str {
        &self.name
    }

    fn enhance(&self, image: &Frame, params: &ParamValues) -> Result<Frame, EnhanceError> {
        let value = param_or(params, "kernel_size", Self::DEFAULT_KERNEL_SIZE);
        // Slider values arrive as floats; truncate like an integer cast.
        let kernel_size = value as i64;
        if kernel_size < 1 {
            return Err(EnhanceError::InvalidParameter {
                name: "kernel_size",
                value,
                reason: "kernel size must be at least 1",
            });
        }

        let radius =
            u32::try_from(kernel_size / 2).map_err(|_| EnhanceError::InvalidParameter {
                name: "kernel_size",
                value,
                reason: "kernel size does not fit a pixel radius",
            })?;
        if radius == 0 {
            return Ok(image.clone());
        }
        Ok(imageproc::filter::median_filter(image, radius, radius))
    }
}

/// Edge-preserving bilateral smoothing.
///
/// `distance` is the diameter of the pixel neighbourhood; `sigma` is used for
/// both the color and the spatial Gaussian. A non-positive `distance` derives
/// the radius from sigma (`round(1.5 × sigma)`), and a non-positive sigma is
/// treated as `1`. The radius never exceeds the frame's larger side.
#[derive(Debug, Clone)]
pub struct BilateralFilterDenoiser {
    name: String,
}

impl BilateralFilterDenoiser {
    pub const REQUIRED: &'static [&'static str] = &["distance", "sigma"];
    pub const DEFAULT_DISTANCE: f64 = 10.0;
    pub const DEFAULT_SIGMA: f64 = 20.0;

    pub fn new(name: &str, schema: &ParamSchema) -> Result<Self, EnhanceError> {
        check_params(Self::REQUIRED, schema)?;
        Ok(Self {
            name: name.to_string(),
        })
    }
}

impl Enhancer for BilateralFilterDenoiser {
    fn name(&self) -> &str {
        &self.name
    }

    fn enhance(&self, image: &Frame, params: &ParamValues) -> Result<Frame, EnhanceError> {
        let distance = param_or(params, "distance", Self::DEFAULT_DISTANCE) as i64;
        let sigma = param_or(params, "sigma", Self::DEFAULT_SIGMA) as i64;

        let sigma = if sigma <= 0 { 1.0 } else { sigma as f32 };
        let radius = if distance <= 0 {
            i64::from((sigma * 1.5).round() as u32)
        } else {
            distance / 2
        };
        let max_radius = i64::from(image.width().max(image.height()));
        let radius = radius.min(max_radius) as u32;

        Ok(bilateral_filter(image, radius, sigma, sigma))
    }
}

/// Build the color-distance weight table indexed by the L1 distance between
/// two RGB pixels (`0..=765`).
fn make_color_kernel(sigma_color: f32) -> Vec<f32> {
    let coeff = -0.5 / (sigma_color * sigma_color);
    (0..=255 * 3)
        .map(|d| {
            let d = d as f32;
            (d * d * coeff).exp()
        })
        .collect()
}

/// Spatial offsets inside a disc of `radius` with their Gaussian weights.
fn make_spatial_kernel(radius: u32, sigma_space: f32) -> Vec<(i32, i32, f32)> {
    let r = radius as i32;
    let coeff = -0.5 / (sigma_space * sigma_space);
    let mut kernel = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            let dist_sq = (dx * dx + dy * dy) as f32;
            if dist_sq.sqrt() > radius as f32 {
                continue;
            }
            kernel.push((dx, dy, (dist_sq * coeff).exp()));
        }
    }
    kernel
}

/// Exact bilateral filter on an RGB frame with replicated borders.
fn bilateral_filter(image: &Frame, radius: u32, sigma_color: f32, sigma_space: f32) -> Frame {
    let (width, height) = image.dimensions();
    if radius == 0 || width == 0 || height == 0 {
        return image.clone();
    }

    let color_kernel = make_color_kernel(sigma_color);
    let spatial_kernel = make_spatial_kernel(radius, sigma_space);
    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;

    Frame::from_fn(width, height, |x, y| {
        let center = image.get_pixel(x, y).0;
        let mut sum = [0.0f32; 3];
        let mut weight_sum = 0.0f32;

        for &(dx, dy, spatial_weight) in &spatial_kernel {
            let sx = (x as i32 + dx).clamp(0, max_x) as u32;
            let sy = (y as i32 + dy).clamp(0, max_y) as u32;
            let neighbor = image.get_pixel(sx, sy).0;

            let color_dist: usize = (0..3)
                .map(|c| neighbor[c].abs_diff(center[c]) as usize)
                .sum();
            let weight = spatial_weight * color_kernel[color_dist];

            for c in 0..3 {
                sum[c] += neighbor[c] as f32 * weight;
            }
            weight_sum += weight;
        }

        if weight_sum > 0.0 {
            Rgb([
                (sum[0] / weight_sum).round().clamp(0.0, 255.0) as u8,
                (sum[1] / weight_sum).round().clamp(0.0, 255.0) as u8,
                (sum[2] / weight_sum).round().clamp(0.0, 255.0) as u8,
            ])
        } else {
            Rgb(center)
        }
    })
}
