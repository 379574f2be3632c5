mod listener;
mod scheduler;
mod session;
mod settings;

pub use listener::{ListenerId, SessionEndListener};
pub use scheduler::{
    format_time, next_session, DriverId, SessionScheduler, TickDriver, TickOutcome, TimerSnapshot,
    Transition,
};
pub use session::SessionType;
pub use settings::{Settings, MAX_DURATION_MIN};
