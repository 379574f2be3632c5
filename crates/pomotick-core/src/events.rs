use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{DriverId, SessionType, Settings};

/// Every state change in the scheduler produces an Event.
/// Front ends poll for them or receive them from the timer service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session: SessionType,
        time_left: u32,
        driver: DriverId,
        at: DateTime<Utc>,
    },
    SessionPaused {
        session: SessionType,
        time_left: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        settings: Settings,
        at: DateTime<Utc>,
    },
    /// A session ran out. `next_driver` is set when auto-continuation
    /// already started the following session.
    SessionCompleted {
        session: SessionType,
        next_session: SessionType,
        completed_sessions: u32,
        auto_started: bool,
        next_driver: Option<DriverId>,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        session: SessionType,
        time_left: u32,
        formatted: String,
        is_running: bool,
        completed_sessions: u32,
        progress: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Timestamp at which the event was produced.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::SessionStarted { at, .. }
            | Event::SessionPaused { at, .. }
            | Event::TimerReset { at }
            | Event::SettingsUpdated { at, .. }
            | Event::SessionCompleted { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::TimerReset { at: Utc::now() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TimerReset");
        assert!(json.get("at").is_some());
    }

    #[test]
    fn completed_event_carries_both_sessions() {
        let event = Event::SessionCompleted {
            session: SessionType::Work,
            next_session: SessionType::LongBreak,
            completed_sessions: 4,
            auto_started: false,
            next_driver: None,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["session"], "work");
        assert_eq!(json["next_session"], "longBreak");
        assert_eq!(json["completed_sessions"], 4);
        assert!(json["next_driver"].is_null());
    }
}
