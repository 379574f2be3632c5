//! Session-end notifications for the terminal.

use pomotick_core::storage::NotificationsConfig;
use pomotick_core::timer::{SessionEndListener, TimerSnapshot};
use tracing::info;

/// Prints the completion message (and rings the bell) when a session ends.
pub struct Notifier {
    config: NotificationsConfig,
}

impl Notifier {
    pub fn new(config: NotificationsConfig) -> Self {
        Self { config }
    }

    fn message(&self, ended: &TimerSnapshot) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        let bell = if self.config.bell { "\x07" } else { "" };
        Some(format!(
            "{bell}[pomotick] {}",
            ended.current_session.completion_message()
        ))
    }
}

impl SessionEndListener for Notifier {
    fn on_session_end(&mut self, ended: &TimerSnapshot) {
        info!(session = ?ended.current_session, completed = ended.completed_sessions, "notifying session end");
        if let Some(message) = self.message(ended) {
            eprintln!("{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomotick_core::SessionType;

    fn ended(session: SessionType) -> TimerSnapshot {
        TimerSnapshot {
            current_session: session,
            time_left: 0,
            is_running: true,
            completed_sessions: 0,
        }
    }

    #[test]
    fn message_includes_bell_when_enabled() {
        let notifier = Notifier::new(NotificationsConfig::default());
        let message = notifier.message(&ended(SessionType::Work)).unwrap();
        assert!(message.starts_with('\x07'));
        assert!(message.contains("Time for a break"));
    }

    #[test]
    fn silent_without_bell() {
        let notifier = Notifier::new(NotificationsConfig {
            enabled: true,
            bell: false,
        });
        let message = notifier.message(&ended(SessionType::LongBreak)).unwrap();
        assert_eq!(message, "[pomotick] Long break complete! Ready to work?");
    }

    #[test]
    fn disabled_notifications_print_nothing() {
        let notifier = Notifier::new(NotificationsConfig {
            enabled: false,
            bell: true,
        });
        assert!(notifier.message(&ended(SessionType::Work)).is_none());
    }
}
