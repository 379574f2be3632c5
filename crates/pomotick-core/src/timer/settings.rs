use serde::{Deserialize, Serialize};

use super::session::SessionType;
use crate::error::ValidationError;

/// Upper bound for any single session, in minutes (one day).
pub const MAX_DURATION_MIN: u32 = 24 * 60;

/// Durations and auto-continuation policy for the session cycle.
///
/// Every field is required when deserializing: replacing settings is a
/// wholesale operation, never a partial merge. Both `snake_case` and the
/// `camelCase` names used by front ends are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Work session length in minutes.
    #[serde(alias = "workDuration")]
    pub work_duration: u32,
    /// Short break length in minutes.
    #[serde(alias = "shortBreakDuration")]
    pub short_break_duration: u32,
    /// Long break length in minutes.
    #[serde(alias = "longBreakDuration")]
    pub long_break_duration: u32,
    /// Completed work sessions between long breaks.
    #[serde(alias = "sessionsBeforeLongBreak")]
    pub sessions_before_long_break: u32,
    #[serde(alias = "autoStartBreaks")]
    pub auto_start_breaks: bool,
    #[serde(alias = "autoStartWork")]
    pub auto_start_work: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            sessions_before_long_break: 4,
            auto_start_breaks: false,
            auto_start_work: false,
        }
    }
}

impl Settings {
    /// Check that the settings describe a runnable cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidValue`] naming the first offending
    /// field when a duration is zero or above [`MAX_DURATION_MIN`], or when
    /// `sessions_before_long_break` is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("work_duration", self.work_duration),
            ("short_break_duration", self.short_break_duration),
            ("long_break_duration", self.long_break_duration),
        ] {
            if value == 0 {
                return Err(ValidationError::invalid(field, "must be at least 1 minute"));
            }
            if value > MAX_DURATION_MIN {
                return Err(ValidationError::invalid(
                    field,
                    format!("must be at most {MAX_DURATION_MIN} minutes, got {value}"),
                ));
            }
        }
        if self.sessions_before_long_break == 0 {
            return Err(ValidationError::invalid(
                "sessions_before_long_break",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Configured length of `session` in minutes.
    pub fn duration_min(&self, session: SessionType) -> u32 {
        match session {
            SessionType::Work => self.work_duration,
            SessionType::ShortBreak => self.short_break_duration,
            SessionType::LongBreak => self.long_break_duration,
        }
    }

    /// Configured length of `session` in seconds.
    pub fn duration_secs(&self, session: SessionType) -> u32 {
        self.duration_min(session).saturating_mul(60)
    }

    /// Whether entering `session` should start its countdown immediately.
    pub fn auto_starts(&self, session: SessionType) -> bool {
        if session.is_break() {
            self.auto_start_breaks
        } else {
            self.auto_start_work
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_classic_pomodoro() {
        let s = Settings::default();
        assert_eq!(s.duration_secs(SessionType::Work), 1500);
        assert_eq!(s.duration_secs(SessionType::ShortBreak), 300);
        assert_eq!(s.duration_secs(SessionType::LongBreak), 900);
        assert_eq!(s.sessions_before_long_break, 4);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_zero_sessions_before_long_break() {
        let s = Settings {
            sessions_before_long_break: 0,
            ..Settings::default()
        };
        let err = s.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::invalid("sessions_before_long_break", "must be at least 1")
        );
    }

    #[test]
    fn rejects_zero_and_oversized_durations() {
        let zero = Settings {
            short_break_duration: 0,
            ..Settings::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(ValidationError::InvalidValue { ref field, .. }) if field == "short_break_duration"
        ));

        let huge = Settings {
            work_duration: MAX_DURATION_MIN + 1,
            ..Settings::default()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn auto_start_policy_follows_session_kind() {
        let s = Settings {
            auto_start_breaks: true,
            auto_start_work: false,
            ..Settings::default()
        };
        assert!(s.auto_starts(SessionType::ShortBreak));
        assert!(s.auto_starts(SessionType::LongBreak));
        assert!(!s.auto_starts(SessionType::Work));
    }

    #[test]
    fn accepts_camel_case_keys() {
        let json = r#"{
            "workDuration": 50,
            "shortBreakDuration": 10,
            "longBreakDuration": 30,
            "sessionsBeforeLongBreak": 2,
            "autoStartBreaks": true,
            "autoStartWork": false
        }"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.work_duration, 50);
        assert_eq!(s.sessions_before_long_break, 2);
        assert!(s.auto_start_breaks);
    }

    #[test]
    fn rejects_partial_settings() {
        let json = r#"{ "workDuration": 50 }"#;
        assert!(serde_json::from_str::<Settings>(json).is_err());
    }
}
