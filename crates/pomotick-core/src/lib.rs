//! # Pomotick Core Library
//!
//! This library provides the core logic for the Pomotick work/break timer.
//! The CLI binary is a thin front end over the same types.
//!
//! ## Architecture
//!
//! - **Session Scheduler**: A tick-driven state machine that requires the
//!   caller to invoke `tick()` once per elapsed second
//! - **Timer Service**: The single authoritative host that owns a scheduler,
//!   drives its ticks on tokio and answers state queries
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionScheduler`]: Core session state machine
//! - [`TimerService`]: Tick driver and command/query interface
//! - [`Config`]: Application configuration management

pub mod timer;
pub mod events;
pub mod service;
pub mod protocol;
pub mod storage;
pub mod error;

pub use timer::{SessionScheduler, SessionType, Settings, TimerSnapshot};
pub use service::TimerService;
pub use protocol::{Command, Response};
pub use storage::Config;
pub use events::Event;
pub use error::{CoreError, ConfigError, ValidationError};
