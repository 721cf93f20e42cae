//! Parameter schemas and live parameter values.
//!
//! A [`ParamSpec`] describes one tunable knob of an enhancer (default,
//! inclusive range and slider step). [`ParamValues`] is what actually flows
//! into `Enhancer::enhance` on every frame.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Current parameter values of an active enhancer, keyed by parameter name.
pub type ParamValues = BTreeMap<String, f64>;

/// Parameter schema of one enhancer, keyed by parameter name.
pub type ParamSchema = BTreeMap<String, ParamSpec>;

/// Schema of a single numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Value used when the enhancer is switched on.
    pub default: f64,
    /// Inclusive `[min, max]` bounds.
    pub range: [f64; 2],
    /// Slider resolution. Default: `1.0`.
    #[serde(default = "ParamSpec::default_step")]
    pub step: f64,
}

impl ParamSpec {
    /// Create a new spec. No validation happens here; see [`ParamSpec::validate`].
    pub const fn new(default: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            default,
            range: [min, max],
            step,
        }
    }

    /// Lower bound.
    pub const fn min(&self) -> f64 {
        self.range[0]
    }

    /// Upper bound.
    pub const fn max(&self) -> f64 {
        self.range[1]
    }

    /// Whether `value` is finite and inside `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min() && value <= self.max()
    }

    /// Check the schema invariants, returning the first violation.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.default.is_finite() && self.min().is_finite() && self.max().is_finite()) {
            return Err("default and range must be finite");
        }
        if self.min() > self.max() {
            return Err("range minimum exceeds maximum");
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err("step must be a positive number");
        }
        if !self.contains(self.default) {
            return Err("default lies outside range");
        }
        Ok(())
    }

    /// Default for serde deserialization when `step` is absent.
    fn default_step() -> f64 {
        1.0
    }
}

/// Collect the default value of every parameter in `schema`.
pub fn defaults(schema: &ParamSchema) -> ParamValues {
    schema
        .iter()
        .map(|(name, spec)| (name.clone(), spec.default))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_spec() {
        assert_eq!(ParamSpec::new(9.0, 1.0, 31.0, 2.0).validate(), Ok(()));
    }

    #[test]
    fn test_default_outside_range_rejected() {
        let spec = ParamSpec::new(40.0, 1.0, 31.0, 2.0);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let spec = ParamSpec::new(2.0, 3.0, 1.0, 1.0);
        assert_eq!(spec.validate(), Err("range minimum exceeds maximum"));
    }

    #[test]
    fn test_zero_step_rejected() {
        let spec = ParamSpec::new(1.0, 0.0, 2.0, 0.0);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_contains_rejects_nan() {
        let spec = ParamSpec::new(1.0, 0.0, 2.0, 0.1);
        assert!(spec.contains(2.0));
        assert!(!spec.contains(f64::NAN));
        assert!(!spec.contains(2.01));
    }

    #[test]
    fn test_step_defaults_when_absent() {
        let spec: ParamSpec = serde_json::from_str(r#"{"default": 1.0, "range": [0.0, 2.0]}"#)
            .expect("valid spec json");
        assert_eq!(spec.step, 1.0);
    }

    #[test]
    fn test_defaults_collects_every_param() {
        let mut schema = ParamSchema::new();
        schema.insert("distance".into(), ParamSpec::new(10.0, 1.0, 30.0, 1.0));
        schema.insert("sigma".into(), ParamSpec::new(20.0, 1.0, 150.0, 1.0));
        let values = defaults(&schema);
        assert_eq!(values.len(), 2);
        assert_eq!(values["distance"], 10.0);
        assert_eq!(values["sigma"], 20.0);
    }
}
