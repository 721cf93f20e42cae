//! Command-line controller: JSON-lines pipeline commands on stdin.
//!
//! Each line is one [`PipelineCommand`] in the
//! `{"type": ..., "data": {...}}` layout, e.g.
//! `{"type":"Toggle","data":{"stage":"denoising","enhancer":"median"}}`.
//! Blank lines and lines starting with `#` are ignored.

use std::io::BufRead;
use std::sync::Arc;

use lumen_core::pipeline::CommandOutcome;
use lumen_core::{Pipeline, PipelineCommand, Selection};
use serde::Serialize;

/// Per-stage selection report written to the log after every command.
#[derive(Debug, Serialize)]
struct StageStatus<'a> {
    stage: &'a str,
    #[serde(flatten)]
    selection: &'a Selection,
}

/// What happened to one input line.
#[derive(Debug, PartialEq)]
pub enum LineResult {
    Skipped,
    Executed(CommandOutcome),
    Rejected(String),
}

/// Parse and execute one controller line.
pub fn handle_line(pipeline: &Pipeline, line: &str) -> LineResult {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return LineResult::Skipped;
    }

    let command = match PipelineCommand::from_json(line) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!("ignoring malformed command: {e}");
            return LineResult::Rejected(e.to_string());
        }
    };

    match pipeline.execute(&command) {
        Ok(outcome) => {
            tracing::info!("{command:?} -> {outcome:?}");
            LineResult::Executed(outcome)
        }
        Err(e) => {
            tracing::warn!("command failed: {e}");
            LineResult::Rejected(e.to_string())
        }
    }
}

/// Serialize the pipeline's current selections as a JSON array.
pub fn status_json(pipeline: &Pipeline) -> Result<String, serde_json::Error> {
    let snapshot = pipeline.snapshot();
    let report: Vec<StageStatus<'_>> = snapshot
        .iter()
        .map(|(stage, selection)| StageStatus {
            stage,
            selection: selection.as_ref(),
        })
        .collect();
    serde_json::to_string(&report)
}

/// Feed every line of `reader` to the pipeline until EOF or a read error.
pub fn run<R: BufRead>(pipeline: &Pipeline, reader: R) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("controller input closed: {e}");
                break;
            }
        };
        if let LineResult::Executed(_) = handle_line(pipeline, &line) {
            match status_json(pipeline) {
                Ok(status) => tracing::info!("pipeline: {status}"),
                Err(e) => tracing::warn!("cannot report pipeline status: {e}"),
            }
        }
    }
    tracing::debug!("controller input exhausted");
}

/// Read commands from stdin on a background thread.
pub fn spawn_stdin_controller(pipeline: Arc<Pipeline>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        run(&pipeline, stdin.lock());
    })
}
