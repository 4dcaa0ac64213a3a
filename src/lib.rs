//! A small interactive shell with sequential and parallel execution modes.
//!
//! Lines are split on `;` into commands. In sequential mode each external
//! command runs to completion before the next one starts; in parallel mode
//! commands are started in the background and supervised: they can be listed
//! (`jobs`), suspended (`pause <pid>`) and continued (`resume <pid>`), and are
//! reaped without ever blocking the input loop. Switching modes or exiting is
//! refused while background processes are still running.
//!
//! The main entry point is [`Interpreter`], driven by any [`InputSource`].

mod builtin;
pub mod command;
pub mod config;
pub mod errors;
pub mod external;
pub mod input;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod logging;
pub mod mode;
pub mod state;
pub mod supervisor;

pub use config::ShellConfig;
pub use errors::ShellError;
pub use input::{InputEvent, InputSource, PolledLines, StdinSource};
pub use interpreter::{CycleOutcome, DEFAULT_POLL_INTERVAL, DEFAULT_PROMPT, Interpreter};
pub use io_adapters::{MemWriter, ScriptedInput};
pub use mode::ExecMode;
