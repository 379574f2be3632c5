use serde::{Deserialize, Serialize};

/// Kind of interval currently being counted down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn is_break(self) -> bool {
        matches!(self, SessionType::ShortBreak | SessionType::LongBreak)
    }

    /// Human-readable label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            SessionType::Work => "Work",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }

    /// Message shown to the user when a session of this type ends.
    pub fn completion_message(self) -> &'static str {
        match self {
            SessionType::Work => "Work session complete! Time for a break.",
            SessionType::ShortBreak => "Short break complete! Ready to work?",
            SessionType::LongBreak => "Long break complete! Ready to work?",
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
