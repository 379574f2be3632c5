//! Timer service: the single authoritative host for a [`SessionScheduler`].
//!
//! The scheduler never reads the clock. The service owns it behind a mutex,
//! drives it from one tokio task per armed driver, and exposes the query and
//! command surface front ends talk to. Every operation and every tick holds
//! the scheduler lock for its whole duration, so ticks never interleave with
//! each other or with commands.
//!
//! ```text
//! start() ──arms DriverId──> spawn tick task ──interval──> tick_driver(id)
//!                                     ^                         │
//!                                     └── auto-continued id ────┘
//! pause()/reset()/update_settings() ──disarm + abort──> task exits
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::protocol::{Command, Response, StateReport};
use crate::timer::{
    DriverId, ListenerId, SessionEndListener, SessionScheduler, SessionType, Settings, TickOutcome,
    TimerSnapshot,
};

/// Default countdown cadence.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

const EVENT_CHANNEL_CAPACITY: usize = 64;

struct Shared {
    scheduler: Mutex<SessionScheduler>,
    state_tx: watch::Sender<TimerSnapshot>,
    events_tx: broadcast::Sender<Event>,
    /// Last session that ran out and has not been acknowledged yet.
    completed: Mutex<Option<SessionType>>,
}

impl Shared {
    fn lock_scheduler(&self) -> MutexGuard<'_, SessionScheduler> {
        self.scheduler.lock().unwrap_or_else(|poisoned| {
            warn!("scheduler lock poisoned by a panicking listener; recovering");
            poisoned.into_inner()
        })
    }

    fn lock_completed(&self) -> MutexGuard<'_, Option<SessionType>> {
        self.completed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish_state(&self, scheduler: &SessionScheduler) {
        self.state_tx.send_replace(scheduler.snapshot());
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }
}

/// Owns a scheduler and drives its countdown on the tokio runtime it was
/// created in.
///
/// Commands take the task lock before the scheduler lock; the tick task
/// only ever takes the scheduler lock.
pub struct TimerService {
    shared: Arc<Shared>,
    runtime: Handle,
    tick_period: Duration,
    /// Handle of the task currently driving ticks, if one was spawned.
    tick_task: Mutex<Option<JoinHandle<()>>>,
}

impl TimerService {
    /// Create a service with a one-second tick.
    ///
    /// # Errors
    ///
    /// Returns an error if `settings` are invalid or if called outside a
    /// tokio runtime.
    pub fn new(settings: Settings) -> Result<Self> {
        Self::with_tick_period(settings, TICK_PERIOD)
    }

    /// Create a service whose tick task fires every `tick_period`.
    ///
    /// # Errors
    ///
    /// Same as [`TimerService::new`], plus a zero `tick_period`.
    pub fn with_tick_period(settings: Settings, tick_period: Duration) -> Result<Self> {
        if tick_period.is_zero() {
            return Err(CoreError::Custom("tick period must be non-zero".into()));
        }
        let runtime = Handle::try_current()
            .map_err(|e| CoreError::Custom(format!("timer service needs a tokio runtime: {e}")))?;
        let scheduler = SessionScheduler::new(settings)?;
        let (state_tx, _) = watch::channel(scheduler.snapshot());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            shared: Arc::new(Shared {
                scheduler: Mutex::new(scheduler),
                state_tx,
                events_tx,
                completed: Mutex::new(None),
            }),
            runtime,
            tick_period,
            tick_task: Mutex::new(None),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> TimerSnapshot {
        self.shared.lock_scheduler().snapshot()
    }

    pub fn formatted_time(&self) -> String {
        self.shared.lock_scheduler().formatted_time()
    }

    pub fn settings(&self) -> Settings {
        *self.shared.lock_scheduler().settings()
    }

    /// Full state report as served to front ends.
    pub fn report(&self) -> StateReport {
        let scheduler = self.shared.lock_scheduler();
        StateReport {
            state: scheduler.snapshot(),
            formatted_time: scheduler.formatted_time(),
            completed_session: *self.shared.lock_completed(),
            settings: *scheduler.settings(),
        }
    }

    /// Receiver that always holds the latest snapshot.
    pub fn watch(&self) -> watch::Receiver<TimerSnapshot> {
        self.shared.state_tx.subscribe()
    }

    /// Stream of every event produced from now on.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.shared.events_tx.subscribe()
    }

    /// Last session that ran out, if not yet acknowledged.
    pub fn completed_session(&self) -> Option<SessionType> {
        *self.shared.lock_completed()
    }

    /// Acknowledge and return the last session that ran out.
    pub fn take_completed(&self) -> Option<SessionType> {
        self.shared.lock_completed().take()
    }

    /// Whether a tick task is currently alive.
    pub fn has_tick_task(&self) -> bool {
        self.lock_task()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // ── Listeners ────────────────────────────────────────────────────

    /// Register a session-end listener. It runs on the tick task while the
    /// scheduler lock is held, so it must not call back into the service.
    pub fn subscribe<L>(&self, listener: L) -> ListenerId
    where
        L: SessionEndListener + 'static,
    {
        self.shared.lock_scheduler().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.lock_scheduler().unsubscribe(id)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the countdown. No-op if it is already running.
    pub fn start(&self) -> Option<Event> {
        let mut task = self.lock_task();
        let event = {
            let mut scheduler = self.shared.lock_scheduler();
            let event = scheduler.start();
            self.shared.publish_state(&scheduler);
            event
        };
        if let Some(Event::SessionStarted { driver, .. }) = &event {
            self.spawn_driver(&mut task, *driver);
        }
        if let Some(event) = &event {
            self.shared.emit(event.clone());
        }
        event
    }

    /// Pause the countdown. No-op if it is not running.
    pub fn pause(&self) -> Option<Event> {
        let mut task = self.lock_task();
        let event = {
            let mut scheduler = self.shared.lock_scheduler();
            let event = scheduler.pause();
            self.shared.publish_state(&scheduler);
            event
        };
        abort_driver(&mut task);
        if let Some(event) = &event {
            self.shared.emit(event.clone());
        }
        event
    }

    pub fn reset(&self) -> Event {
        let mut task = self.lock_task();
        let event = {
            let mut scheduler = self.shared.lock_scheduler();
            let event = scheduler.reset();
            self.shared.publish_state(&scheduler);
            event
        };
        abort_driver(&mut task);
        self.shared.lock_completed().take();
        self.shared.emit(event.clone());
        event
    }

    /// Replace the settings and reset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `settings` are invalid; the
    /// running countdown is left alone in that case.
    pub fn update_settings(&self, settings: Settings) -> Result<Event> {
        let mut task = self.lock_task();
        let event = {
            let mut scheduler = self.shared.lock_scheduler();
            let event = scheduler.update_settings(settings)?;
            self.shared.publish_state(&scheduler);
            event
        };
        abort_driver(&mut task);
        self.shared.lock_completed().take();
        self.shared.emit(event.clone());
        Ok(event)
    }

    /// Handle one protocol command.
    pub fn dispatch(&self, command: Command) -> Response {
        debug!(?command, "dispatch");
        match command {
            Command::GetState => Response::State(self.report()),
            Command::Start => {
                self.start();
                Response::ok()
            }
            Command::Pause => {
                self.pause();
                Response::ok()
            }
            Command::Reset => {
                self.reset();
                Response::ok()
            }
            Command::UpdateSettings { settings } => match self.update_settings(settings) {
                Ok(_) => Response::ok(),
                Err(e) => Response::error(e.to_string()),
            },
            Command::ClearSessionCompleted => {
                self.take_completed();
                Response::ok()
            }
        }
    }

    /// Pause and stop the tick task.
    pub fn shutdown(&self) {
        self.pause();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.tick_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn spawn_driver(&self, task: &mut Option<JoinHandle<()>>, driver: DriverId) {
        let shared = Arc::clone(&self.shared);
        let handle = self.runtime.spawn(drive(shared, driver, self.tick_period));
        if let Some(previous) = task.replace(handle) {
            previous.abort();
        }
    }
}

fn abort_driver(task: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = task.take() {
        handle.abort();
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        abort_driver(&mut self.lock_task());
    }
}

impl std::fmt::Debug for TimerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerService")
            .field("tick_period", &self.tick_period)
            .field("state", &self.snapshot())
            .finish()
    }
}

/// Tick loop for one driver. Follows auto-continued drivers and exits once
/// its driver has been disarmed.
async fn drive(shared: Arc<Shared>, mut driver: DriverId, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    debug!(?driver, "tick task started");

    loop {
        interval.tick().await;
        let outcome = {
            let mut scheduler = shared.lock_scheduler();
            let outcome = scheduler.tick_driver(driver);
            if outcome != TickOutcome::Stale {
                shared.publish_state(&scheduler);
            }
            outcome
        };

        match outcome {
            TickOutcome::Ticked { .. } => {}
            TickOutcome::Stale => {
                debug!(?driver, "tick task stopped: driver disarmed");
                return;
            }
            TickOutcome::Completed(event) => {
                let next = match &event {
                    Event::SessionCompleted {
                        session,
                        next_driver,
                        ..
                    } => {
                        *shared.lock_completed() = Some(*session);
                        *next_driver
                    }
                    _ => None,
                };
                shared.emit(event);
                match next {
                    Some(next) => driver = next,
                    None => {
                        debug!(?driver, "tick task stopped: session completed");
                        return;
                    }
                }
            }
        }
    }
}
