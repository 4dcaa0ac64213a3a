//! Errors reported by the shell while processing a command.
//!
//! None of these are fatal to the interactive loop: the loop prints them on
//! its error stream and moves on to the next queued command. Only [`ShellError::Io`]
//! on the shell's own streams escapes [`crate::Interpreter::run`].

use crate::mode::ExecMode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    /// A built-in was called with arguments it does not accept.
    #[error("{command}: {message}")]
    UnrecognizedArgument { command: String, message: String },

    /// `pause`/`resume` named a pid that is not a live background process.
    #[error("No background process with pid {0}")]
    NoSuchJob(u32),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Cannot execute: {command} ({source})")]
    ExecFailure {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot exit: {live} background process(es) still running")]
    BlockedExit { live: usize },

    #[error("Cannot switch to {requested} mode: {live} background process(es) still running")]
    BlockedModeChange { requested: ExecMode, live: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShellError>;
