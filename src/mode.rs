//! Execution mode of the shell and the staged mode switch.

use crate::errors::{Result, ShellError};
use std::fmt;
use std::str::FromStr;

/// How external commands are launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Wait for every command to exit before starting the next one.
    #[default]
    Sequential,
    /// Launch commands in the background and keep reading input.
    Parallel,
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecMode::Sequential => f.write_str("Sequential"),
            ExecMode::Parallel => f.write_str("Parallel"),
        }
    }
}

impl FromStr for ExecMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sequential" | "s" => Ok(ExecMode::Sequential),
            "parallel" | "p" => Ok(ExecMode::Parallel),
            other => Err(format!(
                "unrecognized mode `{other}`, expected sequential|s|parallel|p"
            )),
        }
    }
}

/// Current mode plus the mode requested by the `mode` built-in.
///
/// A request only takes effect at [`ModeController::commit`], which the shell
/// loop calls once per input cycle after dispatching and reaping.
#[derive(Debug, Clone, Default)]
pub struct ModeController {
    current: ExecMode,
    pending: ExecMode,
}

impl ModeController {
    pub fn new(initial: ExecMode) -> Self {
        Self {
            current: initial,
            pending: initial,
        }
    }

    pub fn current(&self) -> ExecMode {
        self.current
    }

    pub fn pending(&self) -> ExecMode {
        self.pending
    }

    /// Stage `mode` to become current at the next commit.
    pub fn request(&mut self, mode: ExecMode) {
        self.pending = mode;
    }

    /// Drop any staged request.
    pub fn cancel_request(&mut self) {
        self.pending = self.current;
    }

    /// Make the staged mode current, unless background processes are live.
    ///
    /// A rejected request is dropped, not deferred. Returns `true` when the
    /// current mode changed.
    pub fn commit(&mut self, live_jobs: usize) -> Result<bool> {
        if self.pending == self.current {
            return Ok(false);
        }
        if live_jobs > 0 {
            let requested = self.pending;
            self.cancel_request();
            tracing::debug!(%requested, live_jobs, "mode change rejected");
            return Err(ShellError::BlockedModeChange {
                requested,
                live: live_jobs,
            });
        }
        tracing::info!(from = %self.current, to = %self.pending, "mode changed");
        self.current = self.pending;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_names() {
        assert_eq!("sequential".parse::<ExecMode>(), Ok(ExecMode::Sequential));
        assert_eq!("s".parse::<ExecMode>(), Ok(ExecMode::Sequential));
        assert_eq!("parallel".parse::<ExecMode>(), Ok(ExecMode::Parallel));
        assert_eq!("p".parse::<ExecMode>(), Ok(ExecMode::Parallel));
        assert!("Parallel".parse::<ExecMode>().is_err());
        assert!("".parse::<ExecMode>().is_err());
    }

    #[test]
    fn request_takes_effect_only_on_commit() {
        let mut mode = ModeController::default();
        mode.request(ExecMode::Parallel);
        assert_eq!(mode.current(), ExecMode::Sequential);
        assert_eq!(mode.pending(), ExecMode::Parallel);

        assert!(mode.commit(0).unwrap());
        assert_eq!(mode.current(), ExecMode::Parallel);
        assert!(!mode.commit(0).unwrap());
    }

    #[test]
    fn commit_is_rejected_while_jobs_are_live() {
        let mut mode = ModeController::new(ExecMode::Parallel);
        mode.request(ExecMode::Sequential);

        let err = mode.commit(1).unwrap_err();
        assert!(matches!(
            err,
            ShellError::BlockedModeChange {
                requested: ExecMode::Sequential,
                live: 1
            }
        ));
        // the request is dropped, not deferred
        assert_eq!(mode.current(), ExecMode::Parallel);
        assert_eq!(mode.pending(), ExecMode::Parallel);
        assert!(!mode.commit(0).unwrap());
    }

    #[test]
    fn same_mode_request_commits_even_with_live_jobs() {
        let mut mode = ModeController::new(ExecMode::Parallel);
        mode.request(ExecMode::Parallel);
        assert!(!mode.commit(3).unwrap());
    }

    #[test]
    fn cancel_request_restores_current() {
        let mut mode = ModeController::default();
        mode.request(ExecMode::Parallel);
        mode.cancel_request();
        assert_eq!(mode.pending(), ExecMode::Sequential);
    }
}
