//! Lumen Core: swappable, parameterized image-enhancement pipeline.
//!
//! This crate contains the enhancers, their registry, the declarative
//! configuration and the stage state machine. No display or capture
//! dependencies.

pub mod config;
pub mod enhance;
pub mod frame;
pub mod params;
pub mod pipeline;
pub mod registry;

// Re-exports for convenience.
pub use config::{ConfigError, PipelineConfig};
pub use enhance::{EnhanceError, Enhancer, EnhancerKind};
pub use frame::Frame;
pub use params::{ParamSpec, ParamValues};
pub use pipeline::{ParamUpdate, Pipeline, PipelineCommand, PipelineError, Selection};
pub use registry::{Registry, RegistryError};
