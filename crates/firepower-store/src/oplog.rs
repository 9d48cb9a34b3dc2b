//! Structured logging around store operations.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::StoreConfig;
use crate::error::StoreResult;

pub(crate) struct OpLog<'a> {
    config: &'a StoreConfig,
    operation: &'static str,
    path: String,
    is_write: bool,
    /// Per-call request for the `info` event.
    announce: bool,
    started: Instant,
}

impl<'a> OpLog<'a> {
    /// A read, announced at `info` only when `log` is set.
    pub(crate) fn read(config: &'a StoreConfig, operation: &'static str, path: impl ToString, log: bool) -> Self {
        Self::start(config, operation, path, false, log)
    }

    /// A write, announced at `info` when `log` is set and the config allows it.
    pub(crate) fn write(config: &'a StoreConfig, operation: &'static str, path: impl ToString, log: bool) -> Self {
        Self::start(config, operation, path, true, log && config.log_writes)
    }

    fn start(
        config: &'a StoreConfig,
        operation: &'static str,
        path: impl ToString,
        is_write: bool,
        announce: bool,
    ) -> Self {
        Self {
            config,
            operation,
            path: path.to_string(),
            is_write,
            announce,
            started: Instant::now(),
        }
    }

    /// Log the outcome and hand the result back.
    ///
    /// Failures and slow operations are always logged.
    pub(crate) fn finish<T>(self, result: StoreResult<T>) -> StoreResult<T> {
        let elapsed = self.started.elapsed();
        let duration_ms = elapsed.as_millis() as u64;
        let (path, operation, is_write) = (self.path.as_str(), self.operation, self.is_write);

        match &result {
            Err(e) => {
                error!(path, operation, is_write, duration_ms, error = %e, "store operation failed");
            }
            Ok(_) if elapsed >= self.config.slow_operation_threshold() => {
                warn!(path, operation, is_write, duration_ms, "slow store operation");
            }
            Ok(_) if self.announce && is_write => {
                info!(path, operation, is_write, duration_ms, "store write");
            }
            Ok(_) if self.announce => {
                info!(path, operation, is_write, duration_ms, "store read");
            }
            Ok(_) if !is_write && self.config.log_reads => {
                debug!(path, operation, is_write, duration_ms, "store read");
            }
            Ok(_) => {}
        }
        result
    }
}


#[cfg(test)]
mod tests {
    use super::capture::logged_by;
    use super::*;
    use crate::error::StoreError;

    fn info_lines(lines: &[String]) -> Vec<&String> {
        lines.iter().filter(|l| l.contains(" INFO ")).collect()
    }

    #[test]
    fn writes_announce_unless_quiet() {
        let config = StoreConfig::default();
        let out = logged_by(|| {
            OpLog::write(&config, "set_doc", "users/a", true).finish(Ok(())).unwrap();
            OpLog::write(&config, "set_doc", "users/b", false).finish(Ok(())).unwrap();
        });
        let lines = out.lines();
        let info = info_lines(&lines);
        assert_eq!(info.len(), 1);
        assert!(info[0].contains("store write"));
        assert!(info[0].contains("users/a"));
    }

    #[test]
    fn config_can_silence_writes() {
        let config = StoreConfig {
            log_writes: false,
            ..StoreConfig::default()
        };
        let out = logged_by(|| {
            OpLog::write(&config, "delete_doc", "users/a", true).finish(Ok(())).unwrap();
        });
        assert!(info_lines(&out.lines()).is_empty());
    }

    #[test]
    fn reads_announce_only_on_request() {
        let config = StoreConfig::default();
        let out = logged_by(|| {
            OpLog::read(&config, "get_doc", "users/a", false).finish(Ok(())).unwrap();
            OpLog::read(&config, "get_doc", "users/b", true).finish(Ok(())).unwrap();
        });
        let lines = out.lines();
        let info = info_lines(&lines);
        assert_eq!(info.len(), 1);
        assert!(info[0].contains("store read"));
        assert!(info[0].contains("users/b"));
    }

    #[test]
    fn failures_are_logged_even_when_quiet() {
        let config = StoreConfig::default();
        let out = logged_by(|| {
            let result: StoreResult<()> = Err(StoreError::NotFound("users/a".into()));
            assert!(OpLog::write(&config, "update_doc", "users/a", false).finish(result).is_err());
        });
        let lines = out.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ERROR"));
        assert!(lines[0].contains("store operation failed"));
    }
}
