//! Controller commands.
//!
//! Commands follow the `#[serde(tag = "type", content = "data")]` layout so a
//! controller can send them as JSON lines.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{ParamUpdate, Pipeline, PipelineError, Selection};

/// A state change requested by a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineCommand {
    /// Switch `enhancer` on in `stage`, or off if it is already active.
    Toggle { stage: String, enhancer: String },

    /// Change one parameter of the active enhancer.
    SetParam {
        stage: String,
        enhancer: String,
        param: String,
        value: f64,
    },

    /// Return every stage to identity.
    Reset,
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Selection of the toggled stage after the toggle.
    Toggled(Arc<Selection>),
    /// Outcome of a parameter write.
    Param(ParamUpdate),
    Reset,
}

impl PipelineCommand {
    /// Parse a single JSON-encoded command.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

impl Pipeline {
    /// Apply `command` to the pipeline.
    pub fn execute(&self, command: &PipelineCommand) -> Result<CommandOutcome, PipelineError> {
        match command {
            PipelineCommand::Toggle { stage, enhancer } => {
                Ok(CommandOutcome::Toggled(self.toggle(stage, enhancer)?))
            }
            PipelineCommand::SetParam {
                stage,
                enhancer,
                param,
                value,
            } => Ok(CommandOutcome::Param(
                self.set_param(stage, enhancer, param, *value)?,
            )),
            PipelineCommand::Reset => {
                self.reset();
                Ok(CommandOutcome::Reset)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    #[test]
    fn test_parse_toggle_line() {
        let command = PipelineCommand::from_json(
            r#"{"type":"Toggle","data":{"stage":"denoising","enhancer":"median"}}"#,
        )
        .expect("valid command");
        assert_eq!(
            command,
            PipelineCommand::Toggle {
                stage: "denoising".into(),
                enhancer: "median".into(),
            }
        );
    }

    #[test]
    fn test_parse_reset_without_data() {
        let command = PipelineCommand::from_json(r#"{"type":"Reset"}"#).expect("valid command");
        assert_eq!(command, PipelineCommand::Reset);
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert!(PipelineCommand::from_json(r#"{"type":"Sharpen","data":{}}"#).is_err());
    }

    #[test]
    fn test_execute_sequence() {
        let pipeline = Pipeline::from_config(&PipelineConfig::builtin()).unwrap();

        let outcome = pipeline
            .execute(&PipelineCommand::Toggle {
                stage: "light_enhancement".into(),
                enhancer: "gamma".into(),
            })
            .unwrap();
        assert!(matches!(outcome, CommandOutcome::Toggled(sel) if sel.is_active("gamma")));

        let outcome = pipeline
            .execute(&PipelineCommand::SetParam {
                stage: "light_enhancement".into(),
                enhancer: "gamma".into(),
                param: "gamma".into(),
                value: 2.0,
            })
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Param(ParamUpdate::Applied));

        pipeline.execute(&PipelineCommand::Reset).unwrap();
        assert!(pipeline.selection("light_enhancement").unwrap().is_identity());
    }

    #[test]
    fn test_execute_reports_unknown_stage() {
        let pipeline = Pipeline::from_config(&PipelineConfig::builtin()).unwrap();
        let err = pipeline
            .execute(&PipelineCommand::Toggle {
                stage: "sharpening".into(),
                enhancer: "median".into(),
            })
            .unwrap_err();
        assert!(matches!(err, PipelineError::Registry(_)));
    }
}
