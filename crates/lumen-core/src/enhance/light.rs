//! Light-enhancement enhancers: global histogram equalization, gamma
//! correction and CLAHE.

use image::{GrayImage, Luma, Rgb};
use palette::{FromColor, Lab, LinSrgb, Srgb};

use super::{EnhanceError, Enhancer, check_params, param_or};
use crate::frame::{self, Frame, Lut};
use crate::params::{ParamSchema, ParamValues};

/// Gamma used in place of non-positive values.
pub const GAMMA_FLOOR: f64 = 0.1;

/// Equalizes the R, G and B histograms independently. Takes no parameters.
#[derive(Debug, Clone)]
pub struct GlobalHistogramEqualization {
    name: String,
}

impl GlobalHistogramEqualization {
    pub const REQUIRED: &'static [&'static str] = &[];

    pub fn new(name: &str, schema: &ParamSchema) -> Result<Self, EnhanceError> {
        check_params(Self::REQUIRED, schema)?;
        Ok(Self {
            name: name.to_string(),
        })
    }
}

impl Enhancer for GlobalHistogramEqualization {
    fn name(&self) -> &str {
        &self.name
    }

    fn enhance(&self, image: &Frame, _params: &ParamValues) -> Result<Frame, EnhanceError> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(image.clone());
        }
        let planes =
            frame::split_channels(image).map(|plane| imageproc::contrast::equalize_histogram(&plane));
        Ok(frame::merge_channels(&planes))
    }
}

/// Build the gamma table `table[i] = (i / 255)^(1 / gamma) × 255`.
///
/// `gamma <= 0` (and NaN) is replaced by [`GAMMA_FLOOR`]. Entries are
/// truncated toward zero like an 8-bit cast.
pub fn gamma_table(gamma: f64) -> Lut {
    let gamma = if gamma > 0.0 { gamma } else { GAMMA_FLOOR };
    let inv_gamma = 1.0 / gamma;

    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let mapped = (i as f64 / 255.0).powf(inv_gamma) * 255.0;
        *entry = mapped.clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Per-pixel gamma correction through a 256-entry lookup table.
#[derive(Debug, Clone)]
pub struct GammaCorrection {
    name: String,
}

impl GammaCorrection {
    pub const REQUIRED: &'static [&'static str] = &["gamma"];
    pub const DEFAULT_GAMMA: f64 = 1.0;

    pub fn new(name: &str, schema: &ParamSchema) -> Result<Self, EnhanceError> {
        check_params(Self::REQUIRED, schema)?;
        Ok(Self {
            name: name.to_string(),
        })
    }
}

impl Enhancer for GammaCorrection {
    fn name(&self) -> &str {
        &self.name
    }

    fn enhance(&self, image: &Frame, params: &ParamValues) -> Result<Frame, EnhanceError> {
        let gamma = param_or(params, "gamma", Self::DEFAULT_GAMMA);
        Ok(frame::apply_lut(image, &gamma_table(gamma)))
    }
}

/// CLAHE applied to the lightness channel of CIE L\*a\*b\*.
///
/// Lightness is quantized to 8 bits (`L × 255 / 100`) before equalization;
/// the a\* and b\* channels pass through untouched. The tile grid is clamped
/// to the frame size along each axis.
#[derive(Debug, Clone)]
pub struct LocalHistogramEqualization {
    name: String,
}

impl LocalHistogramEqualization {
    pub const REQUIRED: &'static [&'static str] = &["clip_limit", "tile_grid_size"];
    pub const DEFAULT_CLIP_LIMIT: f64 = 2.5;
    pub const DEFAULT_TILE_GRID_SIZE: f64 = 10.0;

    pub fn new(name: &str, schema: &ParamSchema) -> Result<Self, EnhanceError> {
        check_params(Self::REQUIRED, schema)?;
        Ok(Self {
            name: name.to_string(),
        })
    }
}

impl Enhancer for LocalHistogramEqualization {
    fn name(&self) -> &str {
        &self.name
    }

    fn enhance(&self, image: &Frame, params: &ParamValues) -> Result<Frame, EnhanceError> {
        let clip_limit = param_or(params, "clip_limit", Self::DEFAULT_CLIP_LIMIT);
        let grid_value = param_or(params, "tile_grid_size", Self::DEFAULT_TILE_GRID_SIZE);
        let grid = grid_value as i64;
        if grid < 1 {
            return Err(EnhanceError::InvalidParameter {
                name: "tile_grid_size",
                value: grid_value,
                reason: "tile grid must have at least one tile",
            });
        }
        if !clip_limit.is_finite() {
            return Err(EnhanceError::InvalidParameter {
                name: "clip_limit",
                value: clip_limit,
                reason: "clip limit must be finite",
            });
        }

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(image.clone());
        }
        let lab: Vec<Lab> = image.pixels().map(|px| rgb_to_lab(px.0)).collect();

        let lightness = GrayImage::from_fn(width, height, |x, y| {
            let l = lab[(y * width + x) as usize].l;
            Luma([(l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8])
        });
        let tiles_x = grid.min(i64::from(width)) as usize;
        let tiles_y = grid.min(i64::from(height)) as usize;
        let equalized = clahe::clahe_u8_to_u8(tiles_x, tiles_y, clip_limit as f32, &lightness);

        Ok(Frame::from_fn(width, height, |x, y| {
            let original = lab[(y * width + x) as usize];
            let l = equalized.get_pixel(x, y).0[0] as f32 * 100.0 / 255.0;
            Rgb(lab_to_rgb(Lab::new(l, original.a, original.b)))
        }))
    }
}

fn rgb_to_lab(rgb: [u8; 3]) -> Lab {
    let srgb: Srgb = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format();
    let linear: LinSrgb = srgb.into_linear();
    Lab::from_color(linear)
}

fn lab_to_rgb(lab: Lab) -> [u8; 3] {
    let linear: LinSrgb = LinSrgb::from_color(lab);
    let srgb: Srgb = Srgb::from_linear(linear);
    let out: Srgb<u8> = srgb.into_format();
    [out.red, out.green, out.blue]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamSpec;

    fn gamma_schema() -> ParamSchema {
        let mut schema = ParamSchema::new();
        schema.insert("gamma".into(), ParamSpec::new(1.0, 0.0, 5.0, 0.1));
        schema
    }

    fn clahe_schema() -> ParamSchema {
        let mut schema = ParamSchema::new();
        schema.insert("clip_limit".into(), ParamSpec::new(2.5, 0.0, 40.0, 0.5));
        schema.insert("tile_grid_size".into(), ParamSpec::new(10.0, 1.0, 32.0, 1.0));
        schema
    }

    fn values(pairs: &[(&str, f64)]) -> ParamValues {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn gradient(width: u32, height: u32) -> Frame {
        Frame::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x * y) % 256) as u8])
        })
    }

    #[test]
    fn test_gamma_one_is_identity_table() {
        assert_eq!(gamma_table(1.0), frame::identity_lut());
    }

    #[test]
    fn test_gamma_zero_uses_floor() {
        assert_eq!(gamma_table(0.0), gamma_table(GAMMA_FLOOR));
        assert_eq!(gamma_table(-3.0), gamma_table(GAMMA_FLOOR));
        assert_eq!(gamma_table(f64::NAN), gamma_table(GAMMA_FLOOR));
    }

    #[test]
    fn test_gamma_table_is_monotonic_with_fixed_ends() {
        for gamma in [0.1, 0.5, 2.2, 5.0] {
            let table = gamma_table(gamma);
            assert_eq!(table[0], 0);
            assert_eq!(table[255], 255);
            assert!(table.windows(2).all(|w| w[0] <= w[1]), "gamma {gamma}");
        }
    }

    #[test]
    fn test_gamma_table_truncates_entries() {
        let table = gamma_table(2.0);
        assert_eq!(table[64], 127);
        for (i, &entry) in table.iter().enumerate() {
            let expected = ((i as f64 / 255.0).powf(0.5) * 255.0) as u8;
            assert_eq!(entry, expected, "entry {i}");
        }
    }

    #[test]
    fn test_gamma_above_one_brightens() {
        let table = gamma_table(2.0);
        assert!(table[64] > 64);
        let table = gamma_table(0.5);
        assert!(table[64] < 64);
    }

    #[test]
    fn test_gamma_requires_param() {
        let err = GammaCorrection::new("gamma", &ParamSchema::new()).unwrap_err();
        assert_eq!(err, EnhanceError::MissingParameter("gamma".into()));
    }

    #[test]
    fn test_gamma_one_returns_same_frame() {
        let gamma = GammaCorrection::new("gamma", &gamma_schema()).unwrap();
        let frame = gradient(9, 7);
        let out = gamma.enhance(&frame, &values(&[("gamma", 1.0)])).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn test_global_equalization_stretches_each_channel() {
        let equalize = GlobalHistogramEqualization::new("global_he", &ParamSchema::new()).unwrap();
        let frame = Frame::from_fn(16, 1, |x, _| {
            let v = 100 + x as u8;
            Rgb([v, 255 - v, 128])
        });
        let out = equalize.enhance(&frame, &ParamValues::new()).unwrap();
        let reds: Vec<u8> = out.pixels().map(|p| p.0[0]).collect();
        assert_eq!(*reds.last().unwrap(), 255);
        assert!(reds.windows(2).all(|w| w[0] <= w[1]));
        // Green runs the other way and is equalized on its own.
        assert_eq!(out.get_pixel(0, 0).0[1], 255);
    }

    #[test]
    fn test_clahe_requires_both_params() {
        let mut schema = ParamSchema::new();
        schema.insert("clip_limit".into(), ParamSpec::new(2.5, 0.0, 40.0, 0.5));
        let err = LocalHistogramEqualization::new("clahe", &schema).unwrap_err();
        assert_eq!(err, EnhanceError::MissingParameter("tile_grid_size".into()));
    }

    #[test]
    fn test_clahe_rejects_empty_grid() {
        let local = LocalHistogramEqualization::new("clahe", &clahe_schema()).unwrap();
        let err = local
            .enhance(&gradient(8, 8), &values(&[("tile_grid_size", 0.0)]))
            .unwrap_err();
        assert!(matches!(
            err,
            EnhanceError::InvalidParameter {
                name: "tile_grid_size",
                ..
            }
        ));
    }

    #[test]
    fn test_clahe_keeps_gray_neutral() {
        let local = LocalHistogramEqualization::new("clahe", &clahe_schema()).unwrap();
        let frame = Frame::from_fn(32, 32, |x, _| {
            let v = 90 + (x / 2) as u8;
            Rgb([v, v, v])
        });
        let out = local
            .enhance(&frame, &values(&[("clip_limit", 4.0), ("tile_grid_size", 2.0)]))
            .unwrap();
        assert_eq!(out.dimensions(), frame.dimensions());
        for px in out.pixels() {
            let [r, g, b] = px.0;
            assert!(r.abs_diff(g) <= 2 && g.abs_diff(b) <= 2, "{:?} not gray", px.0);
        }
    }

    #[test]
    fn test_clahe_spreads_low_contrast_lightness() {
        let local = LocalHistogramEqualization::new("clahe", &clahe_schema()).unwrap();
        let frame = Frame::from_fn(32, 32, |x, y| {
            let v = 110 + ((x + y) % 8) as u8;
            Rgb([v, v, v])
        });
        let out = local
            .enhance(&frame, &values(&[("clip_limit", 4.0), ("tile_grid_size", 4.0)]))
            .unwrap();
        let spread = |f: &Frame| {
            let reds: Vec<u8> = f.pixels().map(|p| p.0[0]).collect();
            reds.iter().max().unwrap() - reds.iter().min().unwrap()
        };
        assert!(spread(&out) > spread(&frame));
    }

    #[test]
    fn test_clahe_grid_larger_than_frame() {
        let local = LocalHistogramEqualization::new("clahe", &clahe_schema()).unwrap();
        let frame = gradient(3, 2);
        let out = local
            .enhance(&frame, &values(&[("clip_limit", 2.5), ("tile_grid_size", 32.0)]))
            .unwrap();
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn test_clahe_empty_frame() {
        let local = LocalHistogramEqualization::new("clahe", &clahe_schema()).unwrap();
        let frame = Frame::new(0, 0);
        let out = local.enhance(&frame, &ParamValues::new()).unwrap();
        assert_eq!(out.dimensions(), (0, 0));
    }

    #[test]
    fn test_lab_round_trip_is_close() {
        for rgb in [[0, 0, 0], [255, 255, 255], [200, 30, 90], [12, 180, 240]] {
            let back = lab_to_rgb(rgb_to_lab(rgb));
            for c in 0..3 {
                assert!(back[c].abs_diff(rgb[c]) <= 1, "{rgb:?} -> {back:?}");
            }
        }
    }
}
