pub mod config;
pub mod run;
pub mod simulate;

use clap::Args;
use pomotick_core::Settings;

/// Per-invocation overrides of the configured timer settings.
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Work session length in minutes
    #[arg(long)]
    pub work: Option<u32>,
    /// Short break length in minutes
    #[arg(long)]
    pub short_break: Option<u32>,
    /// Long break length in minutes
    #[arg(long)]
    pub long_break: Option<u32>,
    /// Work sessions between long breaks
    #[arg(long)]
    pub long_break_every: Option<u32>,
    /// Start breaks automatically
    #[arg(long)]
    pub auto_breaks: bool,
    /// Start work sessions automatically
    #[arg(long)]
    pub auto_work: bool,
}

impl SettingsArgs {
    /// Apply the overrides on top of `base` and validate the result.
    pub fn resolve(&self, base: Settings) -> Result<Settings, pomotick_core::ValidationError> {
        let settings = Settings {
            work_duration: self.work.unwrap_or(base.work_duration),
            short_break_duration: self.short_break.unwrap_or(base.short_break_duration),
            long_break_duration: self.long_break.unwrap_or(base.long_break_duration),
            sessions_before_long_break: self
                .long_break_every
                .unwrap_or(base.sessions_before_long_break),
            auto_start_breaks: base.auto_start_breaks || self.auto_breaks,
            auto_start_work: base.auto_start_work || self.auto_work,
        };
        settings.validate()?;
        Ok(settings)
    }
}
