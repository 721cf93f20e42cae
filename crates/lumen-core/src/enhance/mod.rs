//! Enhancers: named, parameterized image transforms.
//!
//! Every enhancer is stateless: the pipeline builds a fresh instance from its
//! registry entry each time a frame passes through the stage, and hands it the
//! stage's current parameter values.

pub mod denoising;
pub mod light;

use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::params::{ParamSchema, ParamValues};

pub use denoising::{BilateralFilterDenoiser, MedianFilterDenoiser};
pub use light::{GammaCorrection, GlobalHistogramEqualization, LocalHistogramEqualization};

/// Errors raised while building or running an enhancer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnhanceError {
    /// The parameter schema lacks a parameter this enhancer requires.
    #[error("need to have {0} parameter")]
    MissingParameter(String),

    /// A parameter value cannot be used by the underlying filter.
    #[error("invalid value {value} for parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// A named image transform with a fixed parameter set.
pub trait Enhancer: Send + Sync {
    /// Name of the registry entry this instance was built from.
    fn name(&self) -> &str;

    /// Produce the enhanced version of `image` using `params`.
    ///
    /// Parameters absent from `params` fall back to the variant's default.
    fn enhance(&self, image: &Frame, params: &ParamValues) -> Result<Frame, EnhanceError>;
}

/// The enhancer variants a configuration entry can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancerKind {
    /// Median blur.
    MedianFilter,
    /// Edge-preserving bilateral smoothing.
    BilateralFilter,
    /// Per-channel global histogram equalization.
    GlobalHistogramEqualization,
    /// Lookup-table gamma correction.
    GammaCorrection,
    /// CLAHE on the L* channel.
    LocalHistogramEqualization,
}

impl EnhancerKind {
    /// Human-readable label for logs and controller UIs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MedianFilter => "Median filter",
            Self::BilateralFilter => "Bilateral filter",
            Self::GlobalHistogramEqualization => "Global histogram equalization",
            Self::GammaCorrection => "Gamma correction",
            Self::LocalHistogramEqualization => "Local histogram equalization (CLAHE)",
        }
    }

    /// Parameters a schema must declare for this variant.
    pub const fn required_params(&self) -> &'static [&'static str] {
        match self {
            Self::MedianFilter => MedianFilterDenoiser::REQUIRED,
            Self::BilateralFilter => BilateralFilterDenoiser::REQUIRED,
            Self::GlobalHistogramEqualization => GlobalHistogramEqualization::REQUIRED,
            Self::GammaCorrection => GammaCorrection::REQUIRED,
            Self::LocalHistogramEqualization => LocalHistogramEqualization::REQUIRED,
        }
    }

    /// Build a fresh enhancer of this kind named `name`.
    pub fn instantiate(
        &self,
        name: &str,
        schema: &ParamSchema,
    ) -> Result<Box<dyn Enhancer>, EnhanceError> {
        Ok(match self {
            Self::MedianFilter => Box::new(MedianFilterDenoiser::new(name, schema)?),
            Self::BilateralFilter => Box::new(BilateralFilterDenoiser::new(name, schema)?),
            Self::GlobalHistogramEqualization => {
                Box::new(GlobalHistogramEqualization::new(name, schema)?)
            }
            Self::GammaCorrection => Box::new(GammaCorrection::new(name, schema)?),
            Self::LocalHistogramEqualization => {
                Box::new(LocalHistogramEqualization::new(name, schema)?)
            }
        })
    }
}

/// Fail with [`EnhanceError::MissingParameter`] for the first required
/// parameter `schema` does not declare.
pub(crate) fn check_params(required: &[&str], schema: &ParamSchema) -> Result<(), EnhanceError> {
    match required.iter().find(|name| !schema.contains_key(**name)) {
        Some(missing) => Err(EnhanceError::MissingParameter((*missing).to_string())),
        None => Ok(()),
    }
}

/// Read `key` from `params`, falling back to `default`.
pub(crate) fn param_or(params: &ParamValues, key: &str, default: f64) -> f64 {
    params.get(key).copied().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamSpec;

    #[test]
    fn test_check_params_reports_first_missing() {
        let mut schema = ParamSchema::new();
        schema.insert("distance".into(), ParamSpec::new(10.0, 1.0, 30.0, 1.0));
        let err = check_params(&["distance", "sigma"], &schema).unwrap_err();
        assert_eq!(err, EnhanceError::MissingParameter("sigma".into()));
        assert_eq!(err.to_string(), "need to have sigma parameter");
    }

    #[test]
    fn test_instantiate_keeps_name() {
        let mut schema = ParamSchema::new();
        schema.insert("gamma".into(), ParamSpec::new(1.0, 0.0, 5.0, 0.1));
        let enhancer = EnhancerKind::GammaCorrection
            .instantiate("gamma", &schema)
            .expect("schema declares gamma");
        assert_eq!(enhancer.name(), "gamma");
    }

    #[test]
    fn test_instantiate_without_required_param_fails() {
        let err = EnhancerKind::MedianFilter
            .instantiate("median", &ParamSchema::new())
            .err()
            .expect("kernel_size is required");
        assert_eq!(err, EnhanceError::MissingParameter("kernel_size".into()));
    }

    #[test]
    fn test_kind_serde_names() {
        let kind: EnhancerKind =
            serde_json::from_str("\"local_histogram_equalization\"").expect("known kind");
        assert_eq!(kind, EnhancerKind::LocalHistogramEqualization);
        assert!(serde_json::from_str::<EnhancerKind>("\"sharpen\"").is_err());
    }

    #[test]
    fn test_param_or_falls_back() {
        let mut params = ParamValues::new();
        params.insert("sigma".into(), 5.0);
        assert_eq!(param_or(&params, "sigma", 20.0), 5.0);
        assert_eq!(param_or(&params, "distance", 10.0), 10.0);
    }
}
