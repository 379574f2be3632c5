use clap::Args;
use pomotick_core::timer::format_time;
use pomotick_core::{Config, Event, SessionScheduler, SessionType};
use serde::Serialize;

use super::SettingsArgs;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
    /// Number of sessions (work and break) to run through
    #[arg(long, default_value_t = 8)]
    pub sessions: u32,
    /// Print the transitions as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Step {
    index: u32,
    session: SessionType,
    duration: String,
    next_session: SessionType,
    completed_sessions: u32,
    elapsed_secs: u64,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let settings = args.settings.resolve(config.timer)?;
    let steps = simulate(SessionScheduler::new(settings)?, args.sessions);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }
    for step in &steps {
        println!(
            "#{:<3} {:<11} {:>6}  -> {:<11} completed: {}",
            step.index,
            step.session.label(),
            step.duration,
            step.next_session.label(),
            step.completed_sessions
        );
    }
    Ok(())
}

/// Tick through `sessions` sessions, starting each one by hand when
/// auto-continuation did not.
fn simulate(mut scheduler: SessionScheduler, sessions: u32) -> Vec<Step> {
    let mut steps = Vec::with_capacity(sessions as usize);
    let mut elapsed_secs = 0u64;

    for index in 1..=sessions {
        let session = scheduler.current_session();
        let duration = format_time(scheduler.time_left());
        scheduler.start();
        loop {
            elapsed_secs += 1;
            if let Some(Event::SessionCompleted {
                next_session,
                completed_sessions,
                ..
            }) = scheduler.tick()
            {
                steps.push(Step {
                    index,
                    session,
                    duration,
                    next_session,
                    completed_sessions,
                    elapsed_secs,
                });
                break;
            }
        }
    }
    steps
}
