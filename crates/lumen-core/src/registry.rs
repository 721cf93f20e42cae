//! Enhancer registry: the per-stage catalog built from configuration.
//!
//! Read-only once built. Every lookup returns a descriptor; enhancers
//! themselves are instantiated on demand from it.

use std::collections::HashSet;

use crate::config::{ConfigError, PipelineConfig};
use crate::enhance::{EnhanceError, Enhancer, EnhancerKind};
use crate::params::{self, ParamSchema, ParamValues};

/// Errors raised by registry lookups.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown stage: {0}")]
    UnknownStage(String),

    #[error("enhancer {name} not found in stage {stage}")]
    NotFound { stage: String, name: String },

    #[error(transparent)]
    Enhance(#[from] EnhanceError),
}

/// Catalog entry for one enhancer.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancerDescriptor {
    pub name: String,
    pub kind: EnhancerKind,
    pub schema: ParamSchema,
}

impl EnhancerDescriptor {
    /// Default value of every declared parameter.
    pub fn defaults(&self) -> ParamValues {
        params::defaults(&self.schema)
    }

    /// Build a fresh enhancer instance.
    pub fn instantiate(&self) -> Result<Box<dyn Enhancer>, EnhanceError> {
        self.kind.instantiate(&self.name, &self.schema)
    }
}

#[derive(Debug, Clone)]
struct StageEntry {
    name: String,
    enhancers: Vec<EnhancerDescriptor>,
}

/// Per-stage enhancer catalog, in declared order.
#[derive(Debug, Clone)]
pub struct Registry {
    stages: Vec<StageEntry>,
}

impl Registry {
    /// Validate `config` and build the registry.
    ///
    /// Rejects duplicate stage names, duplicate enhancer names within a
    /// stage and invalid parameter schemas. Each entry is instantiated once
    /// so a schema missing a required parameter fails here.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let mut seen_stages = HashSet::new();
        let mut stages = Vec::with_capacity(config.stages.len());

        for stage in &config.stages {
            if !seen_stages.insert(stage.name.as_str()) {
                return Err(ConfigError::DuplicateStage(stage.name.clone()));
            }

            let mut seen_enhancers = HashSet::new();
            let mut enhancers = Vec::with_capacity(stage.enhancers.len());
            for entry in &stage.enhancers {
                if !seen_enhancers.insert(entry.name.as_str()) {
                    return Err(ConfigError::DuplicateEnhancer {
                        stage: stage.name.clone(),
                        enhancer: entry.name.clone(),
                    });
                }
                for (param, spec) in &entry.params {
                    spec.validate().map_err(|reason| ConfigError::InvalidSchema {
                        stage: stage.name.clone(),
                        enhancer: entry.name.clone(),
                        param: param.clone(),
                        reason,
                    })?;
                }

                let descriptor = EnhancerDescriptor {
                    name: entry.name.clone(),
                    kind: entry.kind,
                    schema: entry.params.clone(),
                };
                descriptor
                    .instantiate()
                    .map_err(|source| ConfigError::Enhance {
                        stage: stage.name.clone(),
                        enhancer: entry.name.clone(),
                        source,
                    })?;
                tracing::debug!(
                    "registered {}/{} ({})",
                    stage.name,
                    entry.name,
                    entry.kind.label()
                );
                enhancers.push(descriptor);
            }

            stages.push(StageEntry {
                name: stage.name.clone(),
                enhancers,
            });
        }

        tracing::info!(
            "enhancer registry built: {} stages, {} enhancers",
            stages.len(),
            stages.iter().map(|s| s.enhancers.len()).sum::<usize>()
        );
        Ok(Self { stages })
    }

    fn stage(&self, stage: &str) -> Result<&StageEntry, RegistryError> {
        self.stages
            .iter()
            .find(|s| s.name == stage)
            .ok_or_else(|| RegistryError::UnknownStage(stage.to_string()))
    }

    /// Descriptor of `name` in `stage`.
    pub fn lookup(&self, stage: &str, name: &str) -> Result<&EnhancerDescriptor, RegistryError> {
        self.stage(stage)?
            .enhancers
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| RegistryError::NotFound {
                stage: stage.to_string(),
                name: name.to_string(),
            })
    }

    /// Default parameter values of `name` in `stage`.
    pub fn defaults(&self, stage: &str, name: &str) -> Result<ParamValues, RegistryError> {
        Ok(self.lookup(stage, name)?.defaults())
    }

    /// Fresh instance of `name` in `stage`.
    pub fn instantiate(&self, stage: &str, name: &str) -> Result<Box<dyn Enhancer>, RegistryError> {
        Ok(self.lookup(stage, name)?.instantiate()?)
    }

    /// Stage names in processing order.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    /// Enhancer names of `stage` in declared order.
    pub fn enhancer_names(&self, stage: &str) -> Result<Vec<&str>, RegistryError> {
        Ok(self
            .stage(stage)?
            .enhancers
            .iter()
            .map(|e| e.name.as_str())
            .collect())
    }

    /// Whether `stage` is declared.
    pub fn has_stage(&self, stage: &str) -> bool {
        self.stages.iter().any(|s| s.name == stage)
    }
}
