//! Subscriber setup and the runtime switch behind the "Logging" checkbox.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, Registry};

/// Environment variable holding the log level (`error` .. `trace`).
const LOG_ENV: &str = "TYPESHELF_LOG";

/// Level the switch falls back to while logging is disabled.
const QUIET: LevelFilter = LevelFilter::WARN;

/// Level requested through the environment, `info` when unset or invalid.
pub fn level_from_env(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO)
}

/// Level in effect for the given switch position.
pub fn effective_level(base: LevelFilter, enabled: bool) -> LevelFilter {
    if enabled { base } else { base.min(QUIET) }
}

/// Handle that raises or lowers the global level while the app runs.
#[derive(Clone)]
pub struct LogSwitch {
    handle: reload::Handle<LevelFilter, Registry>,
    base: LevelFilter,
}

impl std::fmt::Debug for LogSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSwitch").field("base", &self.base).finish()
    }
}

impl LogSwitch {
    pub fn set_enabled(&self, enabled: bool) -> Result<(), reload::Error> {
        self.handle.reload(effective_level(self.base, enabled))
    }
}

/// Install the global subscriber. Returns `None` if one was already set.
pub fn init() -> Option<LogSwitch> {
    let base = level_from_env(std::env::var(LOG_ENV).ok().as_deref());
    let (filter, handle) = reload::Layer::new(base);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .ok()?;
    Some(LogSwitch { handle, base })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_env() {
        assert_eq!(level_from_env(None), LevelFilter::INFO);
        assert_eq!(level_from_env(Some(" debug ")), LevelFilter::DEBUG);
        assert_eq!(level_from_env(Some("loud")), LevelFilter::INFO);
    }

    #[test]
    fn test_disabled_caps_at_warn() {
        assert_eq!(effective_level(LevelFilter::INFO, true), LevelFilter::INFO);
        assert_eq!(effective_level(LevelFilter::INFO, false), LevelFilter::WARN);
        assert_eq!(effective_level(LevelFilter::TRACE, false), LevelFilter::WARN);
        // a stricter base stays as strict
        assert_eq!(effective_level(LevelFilter::ERROR, false), LevelFilter::ERROR);
    }
}
