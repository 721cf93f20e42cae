//! The enhancement pipeline: ordered stages, each either pass-through or
//! running one enhancer.
//!
//! # State machine
//! Every stage starts as [`Selection::Identity`].
//! - `toggle(stage, e)`: `Active(e, _)` → `Identity`; anything else →
//!   `Active(e, defaults(e))`.
//! - `set_param(stage, e, p, v)`: only while `Active(e, _)`; otherwise the
//!   write is stale and dropped.
//!
//! Selections are swapped copy-on-write, so a frame in flight always sees a
//! whole selection per stage even while a controller thread mutates them.

mod command;
mod selection;

use std::sync::Arc;

pub use command::{CommandOutcome, PipelineCommand};
pub use selection::{Selection, Stage};

use crate::config::{ConfigError, PipelineConfig};
use crate::enhance::EnhanceError;
use crate::frame::Frame;
use crate::params::ParamValues;
use crate::registry::{Registry, RegistryError};

/// Errors raised by pipeline operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("stage {stage} failed in {enhancer}: {source}")]
    Enhance {
        stage: String,
        enhancer: String,
        #[source]
        source: EnhanceError,
    },

    #[error("{enhancer} in stage {stage} has no parameter {param}")]
    UnknownParameter {
        stage: String,
        enhancer: String,
        param: String,
    },

    #[error("value {value} for {param} is outside [{min}, {max}]")]
    ParameterOutOfRange {
        param: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Outcome of [`Pipeline::set_param`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUpdate {
    /// The value was stored in a new selection.
    Applied,
    /// The stage no longer runs the addressed enhancer; nothing changed.
    Stale,
}

/// Ordered stages over a shared [`Registry`].
///
/// `Send + Sync`: share it through an `Arc` between the render loop and the
/// controller.
#[derive(Debug)]
pub struct Pipeline {
    registry: Registry,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// One identity stage per registry stage, in registry order.
    pub fn new(registry: Registry) -> Self {
        let stages = registry.stage_names().map(Stage::new).collect();
        Self { registry, stages }
    }

    /// Build the registry from `config` and wrap it.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Registry::from_config(config)?))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    fn stage(&self, name: &str) -> Result<&Stage, RegistryError> {
        self.stages
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| RegistryError::UnknownStage(name.to_string()))
    }

    /// Current selection of `stage`.
    pub fn selection(&self, stage: &str) -> Result<Arc<Selection>, PipelineError> {
        Ok(self.stage(stage)?.selection())
    }

    /// Every stage's current selection, in processing order.
    pub fn snapshot(&self) -> Vec<(String, Arc<Selection>)> {
        self.stages
            .iter()
            .map(|s| (s.name().to_string(), s.selection()))
            .collect()
    }

    /// Switch `enhancer` on in `stage`, or back to identity if it is the
    /// active one. Any other active enhancer in the stage is replaced.
    pub fn toggle(&self, stage: &str, enhancer: &str) -> Result<Arc<Selection>, PipelineError> {
        let slot = self.stage(stage)?;
        let defaults = self.registry.defaults(stage, enhancer)?;

        let (selection, _) = slot.update(|current| {
            if current.is_active(enhancer) {
                Some(Selection::Identity)
            } else {
                Some(Selection::Active {
                    enhancer: enhancer.to_string(),
                    params: defaults,
                })
            }
        });
        tracing::debug!("{stage}: toggle {enhancer} -> {selection:?}");
        Ok(selection)
    }

    /// Store `value` for `param` of `enhancer` in `stage`.
    ///
    /// The parameter must exist in the enhancer's schema and `value` must lie
    /// in its range. If `enhancer` is not the stage's active enhancer the
    /// write is stale and [`ParamUpdate::Stale`] is returned.
    pub fn set_param(
        &self,
        stage: &str,
        enhancer: &str,
        param: &str,
        value: f64,
    ) -> Result<ParamUpdate, PipelineError> {
        let slot = self.stage(stage)?;
        let descriptor = self.registry.lookup(stage, enhancer)?;
        let spec = descriptor
            .schema
            .get(param)
            .ok_or_else(|| PipelineError::UnknownParameter {
                stage: stage.to_string(),
                enhancer: enhancer.to_string(),
                param: param.to_string(),
            })?;
        if !spec.contains(value) {
            return Err(PipelineError::ParameterOutOfRange {
                param: param.to_string(),
                value,
                min: spec.min(),
                max: spec.max(),
            });
        }

        let (_, changed) = slot.update(|current| match current {
            Selection::Active {
                enhancer: active,
                params,
            } if active == enhancer => {
                let mut params = params.clone();
                params.insert(param.to_string(), value);
                Some(Selection::Active {
                    enhancer: active.clone(),
                    params,
                })
            }
            _ => None,
        });

        if changed {
            tracing::debug!("{stage}/{enhancer}: {param} = {value}");
            Ok(ParamUpdate::Applied)
        } else {
            tracing::warn!("{stage}/{enhancer}: dropped stale write of {param} = {value}");
            Ok(ParamUpdate::Stale)
        }
    }

    /// Return every stage to identity.
    pub fn reset(&self) {
        for stage in &self.stages {
            stage.replace(Selection::Identity);
        }
        tracing::debug!("pipeline reset");
    }

    /// Run `image` through `stage` alone.
    ///
    /// Identity returns a copy; an active selection instantiates its enhancer
    /// fresh and runs it with the selection's parameters.
    pub fn apply(&self, stage: &str, image: &Frame) -> Result<Frame, PipelineError> {
        let selection = self.stage(stage)?.selection();
        match selection.as_ref() {
            Selection::Identity => Ok(image.clone()),
            Selection::Active { enhancer, params } => {
                self.enhance(stage, enhancer, params, image)
            }
        }
    }

    /// Run `frame` through every stage in order.
    ///
    /// The first failing stage aborts the run; no partial output is returned.
    pub fn run(&self, frame: &Frame) -> Result<Frame, PipelineError> {
        let mut current: Option<Frame> = None;
        for stage in &self.stages {
            let selection = stage.selection();
            if let Selection::Active { enhancer, params } = selection.as_ref() {
                let input = current.as_ref().unwrap_or(frame);
                current = Some(self.enhance(stage.name(), enhancer, params, input)?);
            }
        }
        Ok(current.unwrap_or_else(|| frame.clone()))
    }

    fn enhance(
        &self,
        stage: &str,
        enhancer: &str,
        params: &ParamValues,
        image: &Frame,
    ) -> Result<Frame, PipelineError> {
        let wrap = |source: EnhanceError| PipelineError::Enhance {
            stage: stage.to_string(),
            enhancer: enhancer.to_string(),
            source,
        };
        let instance = self.registry.lookup(stage, enhancer)?.instantiate().map_err(wrap)?;
        instance.enhance(image, params).map_err(wrap)
    }
}
