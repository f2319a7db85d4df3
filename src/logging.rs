//! Logger setup and log levels changed at runtime.
//!
//! Records are written by [`env_logger`], configured with `RUST_LOG` (default
//! `info`). The `log` command then changes the global level, or the level of
//! one target: a module path prefix such as `bracket_bot::challonge` or
//! `matrix_sdk`. Nothing more verbose than what `RUST_LOG` enabled at start-up
//! is ever printed.

use std::sync::{PoisonError, RwLock};

use env_logger::Env;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Levels set at runtime for a target and its submodules.
static TARGET_LEVELS: RwLock<Vec<(String, LevelFilter)>> = RwLock::new(Vec::new());

/// [`env_logger`] logger also honouring [`TARGET_LEVELS`].
struct TargetLogger {
    inner: env_logger::Logger,
}

impl Log for TargetLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        target_allows(metadata) && self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if target_allows(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Installs the global logger.
pub fn init() -> Result<(), SetLoggerError> {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    let inner = env_logger::Builder::from_env(env).build();
    let max_level = inner.filter();

    log::set_boxed_logger(Box::new(TargetLogger { inner }))?;
    log::set_max_level(max_level);
    Ok(())
}

/// Sets the level of `target`, or the global level when there is no target.
///
/// # Arguments
///
/// * `level` - New level
/// * `target` - Module path prefix, e.g. `matrix_sdk`
///
/// # Examples
///
/// ```no_run
/// // only warnings and errors from the Matrix SDK
/// set_level(LevelFilter::Warn, Some("matrix_sdk"));
/// ```
pub fn set_level(level: LevelFilter, target: Option<&str>) {
    let Some(target) = target else {
        log::set_max_level(level);
        return;
    };

    let mut levels = TARGET_LEVELS.write().unwrap_or_else(PoisonError::into_inner);
    levels.retain(|(prefix, _)| prefix != target);
    levels.push((target.to_string(), level));
}

/// Level set at runtime for `target`, from the longest matching prefix.
pub fn target_level(target: &str) -> Option<LevelFilter> {
    let levels = TARGET_LEVELS.read().unwrap_or_else(PoisonError::into_inner);
    levels
        .iter()
        .filter(|(prefix, _)| is_under(target, prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, level)| *level)
}

/// Returns `true` if `target` is `prefix` or one of its submodules.
fn is_under(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

fn target_allows(metadata: &Metadata) -> bool {
    target_level(metadata.target()).is_none_or(|level| metadata.level() <= level)
}

#[cfg(test)]
pub(crate) mod tests {
    use log::Level;
    use serial_test::serial;

    use super::*;

    pub(crate) fn clear_target_levels() {
        TARGET_LEVELS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn metadata(target: &str, level: Level) -> Metadata<'_> {
        Metadata::builder().target(target).level(level).build()
    }

    #[test]
    fn test_is_under() {
        assert!(is_under("matrix_sdk", "matrix_sdk"));
        assert!(is_under("matrix_sdk::sync", "matrix_sdk"));
        assert!(!is_under("matrix_sdk_base", "matrix_sdk"));
        assert!(!is_under("bracket_bot", "bracket_bot::challonge"));
    }

    #[test]
    #[serial]
    fn test_longest_prefix_wins() {
        clear_target_levels();
        set_level(LevelFilter::Warn, Some("bracket_bot"));
        set_level(LevelFilter::Debug, Some("bracket_bot::challonge"));

        assert_eq!(target_level("bracket_bot::bot"), Some(LevelFilter::Warn));
        assert_eq!(
            target_level("bracket_bot::challonge::requester"),
            Some(LevelFilter::Debug)
        );
        assert_eq!(target_level("matrix_sdk"), None);

        clear_target_levels();
    }

    #[test]
    #[serial]
    fn test_setting_a_target_again_replaces_its_level() {
        clear_target_levels();
        set_level(LevelFilter::Off, Some("matrix_sdk"));
        set_level(LevelFilter::Error, Some("matrix_sdk"));

        assert_eq!(target_level("matrix_sdk::sync"), Some(LevelFilter::Error));

        clear_target_levels();
    }

    #[test]
    #[serial]
    fn test_target_level_filters_records() {
        clear_target_levels();
        set_level(LevelFilter::Warn, Some("matrix_sdk"));

        assert!(!target_allows(&metadata("matrix_sdk::sync", Level::Info)));
        assert!(target_allows(&metadata("matrix_sdk::sync", Level::Error)));
        assert!(target_allows(&metadata("bracket_bot::bot", Level::Info)));

        clear_target_levels();
    }
}
