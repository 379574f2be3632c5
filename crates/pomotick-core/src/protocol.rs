//! Message protocol between front ends and the timer service.
//!
//! Commands are JSON objects tagged by `action`, e.g.
//! `{"action":"updateSettings","settings":{...}}`. Interactive front ends may
//! also send the bare action word (`start`, `pause`, ...).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::timer::{SessionType, Settings, TimerSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    GetState,
    Start,
    Pause,
    Reset,
    UpdateSettings { settings: Settings },
    /// Acknowledge the "session completed" flag.
    ClearSessionCompleted,
}

impl FromStr for Command {
    type Err = CoreError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.starts_with('{') {
            return Ok(serde_json::from_str(line)?);
        }
        match line.to_ascii_lowercase().as_str() {
            "status" | "state" | "getstate" => Ok(Command::GetState),
            "start" | "resume" => Ok(Command::Start),
            "pause" | "stop" => Ok(Command::Pause),
            "reset" => Ok(Command::Reset),
            "ack" | "clear" | "clearsessioncompleted" => Ok(Command::ClearSessionCompleted),
            "" => Err(CoreError::Custom("empty command".into())),
            other => Err(CoreError::Custom(format!("unknown command: {other}"))),
        }
    }
}

/// State as reported to front ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateReport {
    #[serde(flatten)]
    pub state: TimerSnapshot,
    /// Remaining time as `MM:SS`.
    pub formatted_time: String,
    /// Session that ran out since the last acknowledgement.
    pub completed_session: Option<SessionType>,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    State(StateReport),
    Error { success: bool, error: String },
    Ack { success: bool },
}

impl Response {
    pub fn ok() -> Self {
        Response::Ack { success: true }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            success: false,
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Response::State(_) => true,
            Response::Ack { success } | Response::Error { success, .. } => *success,
        }
    }
}
