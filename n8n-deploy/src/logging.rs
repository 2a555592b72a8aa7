//! Logging infrastructure for n8n-deploy.
//!
//! Library code reports resolution and composition steps through the `log`
//! facade. Nothing is printed unless an embedding program installs a logger;
//! the CLI installs the stderr [`Logger`] defined here.
//!
//! Lines carry the level and, at verbose level, the module that emitted them:
//!
//! ```text
//! WARN: tunnel access without a tunnel section, using a provisional tunnel
//! DEBUG [config::loader]: using configuration file /srv/infra/system.yaml
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;

/// Environment variable selecting the log level when no CLI flag is given.
pub const LOG_MODE_ENV: &str = "N8N_DEPLOY_LOG_MODE";

/// Module path prefix stripped from record targets.
const CRATE_TARGET: &str = "n8n_deploy::";

/// Output verbosity, ordered from least (Quiet) to most (Verbose) verbose.
///
/// # Examples
///
/// ```
/// use n8n_deploy::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert_eq!("VERBOSE".parse::<LogLevel>().unwrap(), LogLevel::Verbose);
/// assert!("loud".parse::<LogLevel>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Nothing is printed.
    Quiet,
    /// Errors and warnings.
    #[default]
    Normal,
    /// Everything down to debug records, tagged with their module.
    Verbose,
}

impl LogLevel {
    /// Lowercase name, as accepted by [`LOG_MODE_ENV`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Normal => "normal",
            Self::Verbose => "verbose",
        }
    }

    /// The most detailed `log` level shown at this verbosity.
    #[must_use]
    pub const fn filter(self) -> log::LevelFilter {
        match self {
            Self::Quiet => log::LevelFilter::Off,
            Self::Normal => log::LevelFilter::Warn,
            Self::Verbose => log::LevelFilter::Debug,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Quiet, Self::Normal, Self::Verbose]
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid log level: {s}"))
    }
}

/// Stderr backend for the `log` facade.
///
/// # Examples
///
/// ```
/// use n8n_deploy::{LogLevel, Logger};
///
/// let logger = Logger::new(LogLevel::Verbose);
/// let line = logger.format_line(log::Level::Debug, "n8n_deploy::compose::driver", "built network");
/// assert_eq!(line.as_deref(), Some("DEBUG [compose::driver]: built network"));
///
/// let normal = Logger::new(LogLevel::Normal);
/// assert!(normal.format_line(log::Level::Info, "n8n_deploy", "hidden").is_none());
/// ```
#[derive(Debug, Default)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Creates a logger printing records at or above `level`.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Returns the current log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Render one record, or `None` if it is filtered out.
    #[must_use]
    pub fn format_line(
        &self,
        level: log::Level,
        target: &str,
        message: impl fmt::Display,
    ) -> Option<String> {
        if level > self.level.filter() {
            return None;
        }
        let tag = match level {
            log::Level::Trace => "DEBUG",
            other => other.as_str(),
        };
        if self.level < LogLevel::Verbose {
            return Some(format!("{tag}: {message}"));
        }
        let scope = target.strip_prefix(CRATE_TARGET).unwrap_or(target);
        Some(format!("{tag} [{scope}]: {message}"))
    }

    /// Install this logger as the global `log` backend.
    ///
    /// A second installation in the same process is ignored.
    pub fn install(self) {
        let filter = self.level.filter();
        if log::set_boxed_logger(Box::new(self)).is_ok() {
            log::set_max_level(filter);
        }
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.level.filter()
    }

    fn log(&self, record: &log::Record<'_>) {
        if let Some(line) = self.format_line(record.level(), record.target(), record.args()) {
            eprintln!("{line}");
        }
    }

    fn flush(&self) {}
}

/// Pick the logger for the given CLI flags.
///
/// `verbose` wins over `quiet`. Without either flag, [`LOG_MODE_ENV`] is
/// consulted; an unset or unrecognized value means [`LogLevel::Normal`].
///
/// # Examples
///
/// ```
/// use n8n_deploy::{init_logger, LogLevel};
///
/// let logger = init_logger(true, false);
/// assert_eq!(logger.level(), LogLevel::Verbose);
/// ```
#[must_use]
pub fn init_logger(verbose: bool, quiet: bool) -> Logger {
    let level = if verbose {
        LogLevel::Verbose
    } else if quiet {
        LogLevel::Quiet
    } else {
        env::var(LOG_MODE_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    };
    Logger::new(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log};
    use serial_test::serial;

    fn with_log_mode<F: FnOnce()>(value: Option<&str>, f: F) {
        let saved = env::var(LOG_MODE_ENV).ok();
        match value {
            Some(v) => env::set_var(LOG_MODE_ENV, v),
            None => env::remove_var(LOG_MODE_ENV),
        }
        f();
        match saved {
            Some(v) => env::set_var(LOG_MODE_ENV, v),
            None => env::remove_var(LOG_MODE_ENV),
        }
    }

    #[test]
    fn test_level_names_round_trip() {
        for level in [LogLevel::Quiet, LogLevel::Normal, LogLevel::Verbose] {
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
        assert_eq!(" Normal ".parse::<LogLevel>().unwrap(), LogLevel::Normal);
        assert!("".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_normal_lines_have_no_scope() {
        let logger = Logger::default();
        assert_eq!(
            logger.format_line(Level::Warn, "n8n_deploy::config::loader", "provisional tunnel"),
            Some("WARN: provisional tunnel".to_string())
        );
        assert!(logger.format_line(Level::Debug, "n8n_deploy", "x").is_none());
    }

    #[test]
    fn test_verbose_lines_name_module() {
        let logger = Logger::new(LogLevel::Verbose);
        assert_eq!(
            logger.format_line(Level::Info, "n8n_deploy::compose::plan", "3 resources"),
            Some("INFO [compose::plan]: 3 resources".to_string())
        );
        // foreign targets are kept whole
        assert_eq!(
            logger.format_line(Level::Error, "other_crate", "boom"),
            Some("ERROR [other_crate]: boom".to_string())
        );
        // trace is above the verbose filter
        assert!(logger.format_line(Level::Trace, "n8n_deploy", "x").is_none());
    }

    #[test]
    fn test_quiet_drops_everything() {
        let quiet = Logger::new(LogLevel::Quiet);
        let error = log::Metadata::builder().level(Level::Error).build();
        assert!(!quiet.enabled(&error));
        assert!(quiet.format_line(Level::Error, "n8n_deploy", "x").is_none());
    }

    #[test]
    fn test_init_logger_flags() {
        assert_eq!(init_logger(true, true).level(), LogLevel::Verbose);
        assert_eq!(init_logger(false, true).level(), LogLevel::Quiet);
    }

    #[test]
    #[serial]
    fn test_init_logger_from_env() {
        with_log_mode(None, || {
            assert_eq!(init_logger(false, false).level(), LogLevel::Normal);
        });
        with_log_mode(Some("verbose"), || {
            assert_eq!(init_logger(false, false).level(), LogLevel::Verbose);
        });
        with_log_mode(Some("chatty"), || {
            assert_eq!(init_logger(false, false).level(), LogLevel::Normal);
        });
    }

    #[test]
    #[serial]
    fn test_cli_flag_beats_env() {
        with_log_mode(Some("quiet"), || {
            assert_eq!(init_logger(true, false).level(), LogLevel::Verbose);
        });
    }
}
