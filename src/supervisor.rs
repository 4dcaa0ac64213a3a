//! Tracking of background processes.
//!
//! The supervisor owns the [`Child`] handle of every process launched in
//! parallel mode until it is reaped. All operations are non-blocking except a
//! sequential launch, which waits for exactly the child it started.

use crate::errors::{Result, ShellError};
use crate::external::{ExternalCommand, exit_code};
use crate::mode::ExecMode;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::fmt;
use std::process::{Child, ExitStatus};

/// Whether a background process is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Paused,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => f.write_str("running"),
            JobState::Paused => f.write_str("paused"),
        }
    }
}

/// Snapshot of one live background process, as reported by `jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub pid: u32,
    pub name: String,
    pub state: JobState,
}

/// A background process that has exited and been removed from the table.
#[derive(Debug)]
pub struct FinishedJob {
    pub pid: u32,
    pub name: String,
    /// `None` when the exit could not be observed (the wait itself failed).
    pub status: Option<ExitStatus>,
}

impl fmt::Display for FinishedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process {} ({}) has finished.", self.pid, self.name)
    }
}

/// Result of a successful launch.
#[derive(Debug)]
pub struct LaunchOutcome {
    pub pid: u32,
    /// Exit status for a sequential launch, `None` for a background one.
    pub status: Option<ExitStatus>,
}

struct BackgroundJob {
    child: Child,
    name: String,
    state: JobState,
}

impl BackgroundJob {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn status(&self) -> JobStatus {
        JobStatus {
            pid: self.pid(),
            name: self.name.clone(),
            state: self.state,
        }
    }
}

/// Table of live background processes, in registration order.
#[derive(Default)]
pub struct ProcessSupervisor {
    jobs: Vec<BackgroundJob>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live background processes.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Start `command`.
    ///
    /// In sequential mode this blocks until that exact child exits. In
    /// parallel mode the child is registered and the call returns at once.
    pub fn launch(&mut self, command: ExternalCommand, mode: ExecMode) -> Result<LaunchOutcome> {
        let name = command.display_name();
        let mut child = command.spawn()?;
        let pid = child.id();
        tracing::debug!(pid, %name, %mode, "launched");

        match mode {
            ExecMode::Sequential => {
                let status = child.wait()?;
                tracing::debug!(pid, %name, code = exit_code(status), "foreground process exited");
                Ok(LaunchOutcome {
                    pid,
                    status: Some(status),
                })
            }
            ExecMode::Parallel => {
                debug_assert!(self.position(pid).is_none(), "pid {pid} registered twice");
                self.jobs.push(BackgroundJob {
                    child,
                    name,
                    state: JobState::Running,
                });
                Ok(LaunchOutcome { pid, status: None })
            }
        }
    }

    /// Remove and return the first background process that has exited.
    ///
    /// Never blocks. Call repeatedly until it returns `None` to observe every
    /// process that finished since the last pass; see [`Self::drain_finished`].
    pub fn reap_one(&mut self) -> Option<FinishedJob> {
        let (index, status) = self.jobs.iter_mut().enumerate().find_map(|(index, job)| {
            match job.child.try_wait() {
                Ok(Some(status)) => Some((index, Some(status))),
                Ok(None) => None,
                Err(e) => {
                    // The child can no longer be waited on; drop it rather than
                    // keep a record that would never be reaped.
                    tracing::warn!(pid = job.pid(), error = %e, "failed to poll process");
                    Some((index, None))
                }
            }
        })?;

        let job = self.jobs.remove(index);
        let finished = FinishedJob {
            pid: job.pid(),
            name: job.name,
            status,
        };
        tracing::info!(
            pid = finished.pid,
            name = %finished.name,
            code = finished.status.map(exit_code),
            "background process finished"
        );
        Some(finished)
    }

    /// Reap every background process that has already exited.
    pub fn drain_finished(&mut self) -> Vec<FinishedJob> {
        std::iter::from_fn(|| self.reap_one()).collect()
    }

    /// Suspend the process `pid` and mark it paused.
    pub fn pause(&mut self, pid: u32) -> Result<()> {
        self.signal(pid, Signal::SIGSTOP, JobState::Paused)
    }

    /// Continue the process `pid` and mark it running.
    pub fn resume(&mut self, pid: u32) -> Result<()> {
        self.signal(pid, Signal::SIGCONT, JobState::Running)
    }

    /// Live background processes in registration order.
    pub fn list(&self) -> Vec<JobStatus> {
        self.jobs.iter().map(BackgroundJob::status).collect()
    }

    fn position(&self, pid: u32) -> Option<usize> {
        self.jobs.iter().position(|job| job.pid() == pid)
    }

    /// Deliver `sig` to `pid` and record `state` on its table entry.
    ///
    /// The signal is attempted even when `pid` is not in the table, but only
    /// for pids that address a single process: 0 and values outside the
    /// positive `pid_t` range would target process groups.
    fn signal(&mut self, pid: u32, sig: Signal, state: JobState) -> Result<()> {
        match i32::try_from(pid) {
            Ok(raw) if raw > 0 => {
                if let Err(errno) = signal::kill(Pid::from_raw(raw), sig) {
                    tracing::debug!(pid, signal = ?sig, %errno, "signal delivery failed");
                }
            }
            _ => tracing::debug!(pid, "refusing to signal a process group"),
        }

        let index = self.position(pid).ok_or(ShellError::NoSuchJob(pid))?;
        self.jobs[index].state = state;
        tracing::info!(pid, %state, "job state changed");
        Ok(())
    }
}
