use std::time::Duration;

use clap::Args;
use pomotick_core::protocol::Command;
use pomotick_core::timer::format_time;
use pomotick_core::{Config, Event, TimerService, TimerSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::SettingsArgs;
use crate::notify::Notifier;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
    /// Start the first session immediately
    #[arg(long)]
    pub start: bool,
    /// Tick period in milliseconds
    #[arg(long, default_value_t = 1000, hide = true)]
    pub tick_ms: u64,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let settings = args.settings.resolve(config.timer)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_loop(config, settings, args.start, args.tick_ms))
}

async fn run_loop(
    config: Config,
    settings: pomotick_core::Settings,
    start: bool,
    tick_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = TimerService::with_tick_period(settings, Duration::from_millis(tick_ms))?;
    service.subscribe(Notifier::new(config.notifications.clone()));

    let mut events = service.events();
    let mut state = service.watch();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let status_every = config.display.status_interval_secs;

    eprintln!(
        "pomotick: {} {} -- commands: start, pause, reset, status, ack, quit",
        service.snapshot().current_session,
        service.formatted_time()
    );
    if start {
        service.start();
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if matches!(line, "quit" | "exit" | "q") {
                    break;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        let response = service.dispatch(command);
                        println!("{}", serde_json::to_string(&response)?);
                    }
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            event = events.recv() => match event {
                Ok(event) => render_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *state.borrow_and_update();
                let session_secs = service.settings().duration_secs(snapshot.current_session);
                if should_print_status(&snapshot, status_every, session_secs) {
                    eprintln!("{}", status_line(&snapshot));
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
        }
    }

    service.shutdown();
    Ok(())
}

fn render_event(event: &Event) {
    match event {
        Event::SessionStarted {
            session, time_left, ..
        } => eprintln!("> {session} started ({})", format_time(*time_left)),
        Event::SessionPaused {
            session, time_left, ..
        } => eprintln!("|| {session} paused at {}", format_time(*time_left)),
        Event::TimerReset { .. } => eprintln!("<< reset"),
        Event::SettingsUpdated { .. } => eprintln!("settings updated"),
        Event::SessionCompleted {
            session,
            next_session,
            auto_started,
            ..
        } => {
            let how = if *auto_started { "started" } else { "ready" };
            eprintln!("* {session} done -> {next_session} {how}");
        }
        Event::StateSnapshot { .. } => {}
    }
}

fn should_print_status(snapshot: &TimerSnapshot, every: u32, session_secs: u32) -> bool {
    every > 0
        && snapshot.is_running
        && snapshot.time_left > 0
        && snapshot.time_left < session_secs
        && snapshot.time_left % every == 0
}

fn status_line(snapshot: &TimerSnapshot) -> String {
    format!(
        "  {} {} (completed: {})",
        snapshot.current_session,
        snapshot.formatted_time(),
        snapshot.completed_sessions
    )
}
