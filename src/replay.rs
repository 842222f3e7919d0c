//! Scripted pointer replay for headless hosts.
//!
//! A [`ReplayScript`] is a JSON list of steps applied to a [`Board`] in
//! order. Pointer coordinates are given in field units and mapped through
//! the board's current transform, so a script stays valid across viewport
//! sizes. Each step advances a synthetic clock by one frame.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, BoardError};
use crate::engine::{PointerKind, RawPointerEvent};
use crate::geometry::Point;
use crate::scene::Token;
use crate::surface::Surface;
use crate::tools::{ToolId, ToolSettings};

/// Synthetic time between steps, in milliseconds.
const STEP_MS: f64 = 16.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReplayStep {
    Tool {
        tool: ToolId,
    },
    Configure {
        tool: ToolId,
        settings: ToolSettings,
    },
    #[serde(rename_all = "camelCase")]
    Pointer {
        kind: PointerKind,
        x: f64,
        y: f64,
        #[serde(default)]
        buttons: u16,
        #[serde(default = "default_pointer_id")]
        pointer_id: i32,
    },
    Undo,
    Redo,
    Resize {
        width: f64,
        height: f64,
    },
    #[serde(rename_all = "camelCase")]
    SpawnToken {
        team_id: String,
        x: f64,
        y: f64,
        #[serde(default)]
        label: Option<String>,
    },
}

fn default_pointer_id() -> i32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    pub steps: Vec<ReplayStep>,
}

impl ReplayScript {
    /// # Errors
    ///
    /// Returns the parse error for malformed scripts.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Counters reported after a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub steps: usize,
    pub events: usize,
    pub undos: usize,
    pub redos: usize,
}

/// Apply every step of `script` to `board`.
///
/// # Errors
///
/// Returns [`BoardError::Engine`] when a resize step cannot fit the field.
pub fn run_script<S: Surface>(board: &mut Board<S>, script: &ReplayScript) -> Result<ReplaySummary, BoardError> {
    let mut summary = ReplaySummary::default();
    let mut clock = 0.0;
    for step in &script.steps {
        clock += STEP_MS;
        apply_step(board, step, clock, &mut summary)?;
        summary.events += board.take_events().len();
        summary.steps += 1;
    }
    Ok(summary)
}

#[allow(clippy::cast_possible_truncation)]
fn apply_step<S: Surface>(
    board: &mut Board<S>,
    step: &ReplayStep,
    clock: f64,
    summary: &mut ReplaySummary,
) -> Result<(), BoardError> {
    match step {
        ReplayStep::Tool { tool } => board.set_tool(*tool),
        ReplayStep::Configure { tool, settings } => board.configure_tool(*tool, settings),
        ReplayStep::Pointer { kind, x, y, buttons, pointer_id } => {
            let client = board.engine().field_to_screen(Point::new(*x, *y));
            board.pointer(RawPointerEvent {
                kind: *kind,
                pointer_id: *pointer_id,
                client_x: client.x,
                client_y: client.y,
                buttons: *buttons,
                timestamp: clock,
            });
        }
        ReplayStep::Undo => {
            if board.undo() {
                summary.undos += 1;
            } else {
                debug!("nothing to undo");
            }
        }
        ReplayStep::Redo => {
            if board.redo() {
                summary.redos += 1;
            } else {
                debug!("nothing to redo");
            }
        }
        ReplayStep::Resize { width, height } => board.resize(*width, *height)?,
        ReplayStep::SpawnToken { team_id, x, y, label } => {
            let token = Token { label: label.clone(), ..Token::new(team_id.as_str(), *x, *y) };
            board.spawn_token(token, clock as i64)?;
        }
    }
    Ok(())
}
