//! Session scheduler implementation.
//!
//! The scheduler is a tick-driven state machine. It does not use internal
//! threads or read the clock: a host calls `tick()` once per elapsed second
//! while the countdown runs.
//!
//! ## State Transitions
//!
//! ```text
//! (Work, Paused) -start-> (Work, Running) -expire-> (ShortBreak | LongBreak, Paused)
//! (Break, Paused) -start-> (Break, Running) -expire-> (Work, Paused)
//! ```
//!
//! Auto-continuation may skip the `Paused` half of a transition.
//!
//! ## Tick drivers
//!
//! Each `start()` arms a fresh [`DriverId`]. A host that drives the countdown
//! from a timer task presents that id with every tick via
//! [`SessionScheduler::tick_driver`]; once the driver is disarmed by a pause,
//! reset or expiry, ticks carrying the old id are rejected as stale.
//!
//! ## Usage
//!
//! ```
//! use pomotick_core::timer::{SessionScheduler, SessionType, Settings};
//!
//! let mut scheduler = SessionScheduler::new(Settings::default()).unwrap();
//! scheduler.start();
//! for _ in 0..25 * 60 {
//!     scheduler.tick();
//! }
//! assert_eq!(scheduler.current_session(), SessionType::ShortBreak);
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::listener::{ListenerId, ListenerSet, SessionEndListener};
use super::session::SessionType;
use super::settings::Settings;
use crate::error::ValidationError;
use crate::events::Event;

/// Token identifying one armed tick driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(u64);

/// Lifecycle of the countdown driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDriver {
    Idle,
    Active(DriverId),
}

/// Immutable copy of the scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub current_session: SessionType,
    /// Seconds remaining in the current session.
    pub time_left: u32,
    pub is_running: bool,
    /// Completed work sessions since the last reset.
    pub completed_sessions: u32,
}

impl TimerSnapshot {
    pub fn formatted_time(&self) -> String {
        format_time(self.time_left)
    }
}

/// Result of presenting a tick from a specific driver.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// One second was counted down.
    Ticked { time_left: u32 },
    /// The session expired and the scheduler moved to the next one.
    Completed(Event),
    /// The driver is no longer armed; nothing changed.
    Stale,
}

/// Outcome of the pure transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: SessionType,
    pub completed_sessions: u32,
}

/// Decide which session follows `current`.
///
/// Completing a work session increments the count; every
/// `sessions_before_long_break`-th completion earns a long break.
pub fn next_session(current: SessionType, completed_sessions: u32, settings: &Settings) -> Transition {
    match current {
        SessionType::Work => {
            let completed = completed_sessions.saturating_add(1);
            // Settings are validated before they reach the scheduler; max(1)
            // keeps the modulus defined for callers of this free function.
            let every = settings.sessions_before_long_break.max(1);
            let next = if completed % every == 0 {
                SessionType::LongBreak
            } else {
                SessionType::ShortBreak
            };
            Transition {
                next,
                completed_sessions: completed,
            }
        }
        SessionType::ShortBreak | SessionType::LongBreak => Transition {
            next: SessionType::Work,
            completed_sessions,
        },
    }
}

/// Format seconds as `MM:SS`.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Core session state machine.
///
/// Owns the current session, the remaining time, the completed work count,
/// the settings and the session-end listeners. `is_running` is derived from
/// the driver lifecycle so the two can never disagree.
#[derive(Debug)]
pub struct SessionScheduler {
    settings: Settings,
    current_session: SessionType,
    time_left: u32,
    completed_sessions: u32,
    driver: TickDriver,
    next_driver_id: u64,
    listeners: ListenerSet,
}

impl SessionScheduler {
    /// Create a scheduler at `(Work, Paused)` with a full work session.
    ///
    /// # Errors
    ///
    /// Returns an error if `settings` fails [`Settings::validate`].
    pub fn new(settings: Settings) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self::with_valid_settings(settings))
    }

    fn with_valid_settings(settings: Settings) -> Self {
        Self {
            settings,
            current_session: SessionType::Work,
            time_left: settings.duration_secs(SessionType::Work),
            completed_sessions: 0,
            driver: TickDriver::Idle,
            next_driver_id: 0,
            listeners: ListenerSet::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_session(&self) -> SessionType {
        self.current_session
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        matches!(self.driver, TickDriver::Active(_))
    }

    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    pub fn driver(&self) -> TickDriver {
        self.driver
    }

    /// Id of the armed driver, if the countdown is running.
    pub fn active_driver(&self) -> Option<DriverId> {
        match self.driver {
            TickDriver::Active(id) => Some(id),
            TickDriver::Idle => None,
        }
    }

    pub fn session_duration_secs(&self, session: SessionType) -> u32 {
        self.settings.duration_secs(session)
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        let total = self.session_duration_secs(self.current_session);
        if total == 0 {
            return 0.0;
        }
        1.0 - (f64::from(self.time_left) / f64::from(total))
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            current_session: self.current_session,
            time_left: self.time_left,
            is_running: self.is_running(),
            completed_sessions: self.completed_sessions,
        }
    }

    /// Remaining time as `MM:SS`.
    pub fn formatted_time(&self) -> String {
        format_time(self.time_left)
    }

    /// Build a full state snapshot event.
    pub fn snapshot_event(&self) -> Event {
        Event::StateSnapshot {
            session: self.current_session,
            time_left: self.time_left,
            formatted: self.formatted_time(),
            is_running: self.is_running(),
            completed_sessions: self.completed_sessions,
            progress: self.progress(),
            at: Utc::now(),
        }
    }

    // ── Listeners ────────────────────────────────────────────────────

    /// Register a session-end listener.
    pub fn subscribe<L>(&mut self, listener: L) -> ListenerId
    where
        L: SessionEndListener + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down. No-op if already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        let driver = self.arm();
        debug!(session = ?self.current_session, time_left = self.time_left, ?driver, "session started");
        Some(Event::SessionStarted {
            session: self.current_session,
            time_left: self.time_left,
            driver,
            at: Utc::now(),
        })
    }

    /// Stop counting down. No-op if already paused.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        self.disarm();
        debug!(session = ?self.current_session, time_left = self.time_left, "session paused");
        Some(Event::SessionPaused {
            session: self.current_session,
            time_left: self.time_left,
            at: Utc::now(),
        })
    }

    /// Return to a paused, full-length first work session with no history.
    pub fn reset(&mut self) -> Event {
        self.disarm();
        self.current_session = SessionType::Work;
        self.time_left = self.settings.duration_secs(SessionType::Work);
        self.completed_sessions = 0;
        debug!("timer reset");
        Event::TimerReset { at: Utc::now() }
    }

    /// Replace the settings wholesale and reset.
    ///
    /// # Errors
    ///
    /// Returns an error if `settings` fails validation; the scheduler is left
    /// untouched in that case.
    pub fn update_settings(&mut self, settings: Settings) -> Result<Event, ValidationError> {
        settings.validate()?;
        self.settings = settings;
        self.reset();
        debug!(?settings, "settings updated");
        Ok(Event::SettingsUpdated {
            settings,
            at: Utc::now(),
        })
    }

    /// Count down one second on behalf of whichever driver is armed.
    ///
    /// Returns `Some(Event::SessionCompleted)` when the session expires.
    /// Ticking a paused scheduler does nothing.
    pub fn tick(&mut self) -> Option<Event> {
        let driver = self.active_driver()?;
        match self.tick_driver(driver) {
            TickOutcome::Completed(event) => Some(event),
            TickOutcome::Ticked { .. } | TickOutcome::Stale => None,
        }
    }

    /// Count down one second if `driver` is the armed driver.
    pub fn tick_driver(&mut self, driver: DriverId) -> TickOutcome {
        if self.driver != TickDriver::Active(driver) {
            trace!(?driver, "stale tick ignored");
            return TickOutcome::Stale;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            trace!(time_left = self.time_left, "tick");
            return TickOutcome::Ticked {
                time_left: self.time_left,
            };
        }
        TickOutcome::Completed(self.expire())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn arm(&mut self) -> DriverId {
        let id = DriverId(self.next_driver_id);
        self.next_driver_id += 1;
        self.driver = TickDriver::Active(id);
        id
    }

    fn disarm(&mut self) {
        self.driver = TickDriver::Idle;
    }

    fn expire(&mut self) -> Event {
        let ended = self.snapshot();
        self.listeners.notify(&ended);
        self.disarm();
        let next_driver = self.advance_session();
        info!(
            ended = ?ended.current_session,
            next = ?self.current_session,
            completed_sessions = self.completed_sessions,
            auto_started = next_driver.is_some(),
            "session completed"
        );
        Event::SessionCompleted {
            session: ended.current_session,
            next_session: self.current_session,
            completed_sessions: self.completed_sessions,
            auto_started: next_driver.is_some(),
            next_driver,
            at: Utc::now(),
        }
    }

    /// Move to the next session and apply the auto-continuation policy.
    /// Returns the new driver when the next session was started.
    fn advance_session(&mut self) -> Option<DriverId> {
        let transition = next_session(self.current_session, self.completed_sessions, &self.settings);
        self.current_session = transition.next;
        self.completed_sessions = transition.completed_sessions;
        self.time_left = self.settings.duration_secs(transition.next);
        self.disarm();

        if self.settings.auto_starts(self.current_session) {
            self.start();
        }
        self.active_driver()
    }
}

impl Default for SessionScheduler {
    fn default() -> Self {
        Self::with_valid_settings(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn short_settings() -> Settings {
        Settings {
            work_duration: 1,
            short_break_duration: 1,
            long_break_duration: 2,
            sessions_before_long_break: 2,
            auto_start_breaks: false,
            auto_start_work: false,
        }
    }

    fn run_to_completion(s: &mut SessionScheduler) -> Event {
        s.start();
        loop {
            if let Some(event) = s.tick() {
                return event;
            }
        }
    }

    #[test]
    fn starts_paused_on_full_work_session() {
        let s = SessionScheduler::default();
        let snap = s.snapshot();
        assert_eq!(snap.current_session, SessionType::Work);
        assert_eq!(snap.time_left, 1500);
        assert!(!snap.is_running);
        assert_eq!(snap.completed_sessions, 0);
        assert_eq!(s.formatted_time(), "25:00");
        assert_eq!(s.driver(), TickDriver::Idle);
    }

    #[test]
    fn start_pause_start() {
        let mut s = SessionScheduler::default();
        assert!(s.start().is_some());
        assert!(s.is_running());
        assert!(s.start().is_none());

        assert!(s.pause().is_some());
        assert!(!s.is_running());
        assert!(s.pause().is_none());

        assert!(s.start().is_some());
        assert!(s.is_running());
    }

    #[test]
    fn tick_while_paused_is_noop() {
        let mut s = SessionScheduler::default();
        assert!(s.tick().is_none());
        assert_eq!(s.time_left(), 1500);
    }

    #[test]
    fn stale_driver_cannot_tick() {
        let mut s = SessionScheduler::default();
        s.start();
        let first = s.active_driver().unwrap();
        s.pause();
        assert_eq!(s.tick_driver(first), TickOutcome::Stale);

        s.start();
        let second = s.active_driver().unwrap();
        assert_ne!(first, second);
        assert_eq!(s.tick_driver(first), TickOutcome::Stale);
        assert_eq!(s.tick_driver(second), TickOutcome::Ticked { time_left: 1499 });
    }

    #[test]
    fn expiry_moves_to_short_break_and_pauses() {
        let mut s = SessionScheduler::new(short_settings()).unwrap();
        let event = run_to_completion(&mut s);
        match event {
            Event::SessionCompleted {
                session,
                next_session,
                completed_sessions,
                auto_started,
                next_driver,
                ..
            } => {
                assert_eq!(session, SessionType::Work);
                assert_eq!(next_session, SessionType::ShortBreak);
                assert_eq!(completed_sessions, 1);
                assert!(!auto_started);
                assert!(next_driver.is_none());
            }
            other => panic!("Expected SessionCompleted, got {other:?}"),
        }
        assert_eq!(s.time_left(), 60);
        assert!(!s.is_running());
    }

    #[test]
    fn breaks_do_not_count_as_completed_sessions() {
        let mut s = SessionScheduler::new(short_settings()).unwrap();
        run_to_completion(&mut s);
        run_to_completion(&mut s);
        assert_eq!(s.current_session(), SessionType::Work);
        assert_eq!(s.completed_sessions(), 1);
    }

    #[test]
    fn listener_sees_completing_session() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut s = SessionScheduler::new(short_settings()).unwrap();
        let sink = Arc::clone(&seen);
        s.subscribe(move |snap: &TimerSnapshot| sink.lock().unwrap().push(*snap));

        run_to_completion(&mut s);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].current_session, SessionType::Work);
        assert_eq!(seen[0].time_left, 0);
        assert_eq!(seen[0].completed_sessions, 0);
    }

    #[test]
    fn auto_start_breaks_rearms_driver() {
        let mut s = SessionScheduler::new(Settings {
            auto_start_breaks: true,
            ..short_settings()
        })
        .unwrap();
        s.start();
        let first = s.active_driver().unwrap();
        let event = run_to_completion(&mut s);
        let Event::SessionCompleted { next_driver, auto_started, .. } = event else {
            panic!("Expected SessionCompleted");
        };
        assert!(auto_started);
        assert_eq!(next_driver, s.active_driver());
        assert_ne!(next_driver, Some(first));
        assert_eq!(s.current_session(), SessionType::ShortBreak);
        assert!(s.is_running());
        assert_eq!(s.time_left(), 60);
    }

    #[test]
    fn auto_start_work_does_not_apply_to_breaks() {
        let mut s = SessionScheduler::new(Settings {
            auto_start_work: true,
            ..short_settings()
        })
        .unwrap();
        run_to_completion(&mut s);
        assert_eq!(s.current_session(), SessionType::ShortBreak);
        assert!(!s.is_running());

        run_to_completion(&mut s);
        assert_eq!(s.current_session(), SessionType::Work);
        assert!(s.is_running());
    }

    #[test]
    fn reset_clears_progress() {
        let mut s = SessionScheduler::new(short_settings()).unwrap();
        run_to_completion(&mut s);
        s.start();
        s.tick();
        s.reset();
        assert_eq!(
            s.snapshot(),
            TimerSnapshot {
                current_session: SessionType::Work,
                time_left: 60,
                is_running: false,
                completed_sessions: 0,
            }
        );
    }

    #[test]
    fn invalid_settings_leave_scheduler_untouched() {
        let mut s = SessionScheduler::default();
        s.start();
        s.tick();
        let before = s.snapshot();
        let bad = Settings {
            work_duration: 0,
            ..Settings::default()
        };
        assert!(s.update_settings(bad).is_err());
        assert_eq!(s.snapshot(), before);
        assert_eq!(s.settings(), &Settings::default());
    }

    #[test]
    fn next_session_is_pure() {
        let settings = Settings::default();
        assert_eq!(
            next_session(SessionType::Work, 3, &settings),
            Transition {
                next: SessionType::LongBreak,
                completed_sessions: 4
            }
        );
        assert_eq!(
            next_session(SessionType::LongBreak, 4, &settings),
            Transition {
                next: SessionType::Work,
                completed_sessions: 4
            }
        );
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let mut s = SessionScheduler::new(short_settings()).unwrap();
        assert_eq!(s.progress(), 0.0);
        s.start();
        for _ in 0..30 {
            s.tick();
        }
        assert!((s.progress() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn format_time_pads_both_fields() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(1500), "25:00");
        assert_eq!(format_time(100 * 60 + 9), "100:09");
    }
}
