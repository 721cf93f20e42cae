//! Declarative pipeline configuration.
//!
//! A [`PipelineConfig`] lists the stages in the order frames pass through
//! them, and for each stage the enhancers a controller may switch on. It is
//! parsed once at startup and turned into a [`Registry`](crate::Registry).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::enhance::{EnhanceError, EnhancerKind};
use crate::params::{ParamSchema, ParamSpec};

/// Errors raised while loading or validating a pipeline configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("stage {0} is declared more than once")]
    DuplicateStage(String),

    #[error("enhancer {enhancer} is declared more than once in stage {stage}")]
    DuplicateEnhancer { stage: String, enhancer: String },

    #[error("invalid schema for {stage}/{enhancer} parameter {param}: {reason}")]
    InvalidSchema {
        stage: String,
        enhancer: String,
        param: String,
        reason: &'static str,
    },

    #[error("cannot build enhancer {stage}/{enhancer}: {source}")]
    Enhance {
        stage: String,
        enhancer: String,
        #[source]
        source: EnhanceError,
    },
}

/// Top-level configuration: stages in processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub stages: Vec<StageConfig>,
}

/// One stage and the enhancers that may occupy it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    pub enhancers: Vec<EnhancerConfig>,
}

/// One enhancer entry: unique name within the stage, variant and schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancerConfig {
    pub name: String,
    pub kind: EnhancerKind,
    #[serde(default)]
    pub params: ParamSchema,
}

impl EnhancerConfig {
    pub fn new(name: &str, kind: EnhancerKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            params: ParamSchema::new(),
        }
    }

    /// Builder-style helper for declaring a parameter.
    pub fn with_param(mut self, name: &str, spec: ParamSpec) -> Self {
        self.params.insert(name.to_string(), spec);
        self
    }
}

impl PipelineConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize back to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The stock catalog: a denoising stage followed by a light-enhancement
    /// stage.
    pub fn builtin() -> Self {
        Self {
            stages: vec![
                StageConfig {
                    name: "denoising".into(),
                    enhancers: vec![
                        EnhancerConfig::new("median", EnhancerKind::MedianFilter)
                            .with_param("kernel_size", ParamSpec::new(9.0, 1.0, 31.0, 2.0)),
                        EnhancerConfig::new("bilateral", EnhancerKind::BilateralFilter)
                            .with_param("distance", ParamSpec::new(10.0, 1.0, 30.0, 1.0))
                            .with_param("sigma", ParamSpec::new(20.0, 1.0, 150.0, 1.0)),
                    ],
                },
                StageConfig {
                    name: "light_enhancement".into(),
                    enhancers: vec![
                        EnhancerConfig::new("global_he", EnhancerKind::GlobalHistogramEqualization),
                        EnhancerConfig::new("gamma", EnhancerKind::GammaCorrection)
                            .with_param("gamma", ParamSpec::new(1.0, 0.0, 5.0, 0.1)),
                        EnhancerConfig::new("clahe", EnhancerKind::LocalHistogramEqualization)
                            .with_param("clip_limit", ParamSpec::new(2.5, 0.0, 10.0, 0.1))
                            .with_param("tile_grid_size", ParamSpec::new(10.0, 1.0, 32.0, 1.0)),
                    ],
                },
            ],
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builtin()
    }
}
