use crate::command::{Argv, CommandFactory, CommandQueue};
use crate::config::ShellConfig;
use crate::errors::ShellError;
use crate::external::{ExternalCommand, exit_code};
use crate::input::{InputEvent, InputSource};
use crate::lexer;
use crate::mode::{ExecMode, ModeController};
use crate::state::ShellState;
use anyhow::Context;
use std::io::{self, Write};
use std::time::Duration;

/// Prompt printed whenever the shell is ready for a new line.
pub const DEFAULT_PROMPT: &str = "lleh$ ";

/// Upper bound on a single wait for input.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate, see [`crate::builtin`].
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// What the loop should do after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Continue,
    Exit,
}

/// The interactive shell: reads lines, runs the commands on them and
/// supervises whatever it started in the background.
///
/// Each call to [`Interpreter::run_cycle`] performs one full round:
/// 1. wait (bounded) for a line and split it into queued commands;
/// 2. run every queued command, built-ins in-process, anything else as a child
///    process in the current mode;
/// 3. reap finished background processes;
/// 4. honour a pending exit, unless background processes are still live;
/// 5. commit a pending mode switch, under the same condition.
///
/// Example
/// ```
/// use lleh::{Interpreter, ScriptedInput, ShellConfig};
/// let mut sh = Interpreter::new(ShellConfig::default(), Box::new(ScriptedInput::new(["mode"])));
/// sh.run().unwrap();
/// ```
pub struct Interpreter {
    state: ShellState,
    commands: Vec<Box<dyn CommandFactory>>,
    input: Box<dyn InputSource>,
    queue: CommandQueue,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
    prompt: String,
    poll_interval: Duration,
    prompt_pending: bool,
    prompt_on_screen: bool,
    input_closed: bool,
    eof_exit_reported: bool,
}

impl Interpreter {
    /// Create a shell in sequential mode with the built-ins `exit`, `mode`,
    /// `jobs`, `pause` and `resume`, writing to the process's stdout/stderr.
    pub fn new(config: ShellConfig, input: Box<dyn InputSource>) -> Self {
        use crate::builtin::*;
        Self {
            state: ShellState::new(config, ExecMode::default()),
            commands: vec![
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Mode>::default()),
                Box::new(Factory::<Jobs>::default()),
                Box::new(Factory::<Pause>::default()),
                Box::new(Factory::<Resume>::default()),
            ],
            input,
            queue: CommandQueue::new(),
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
            prompt: DEFAULT_PROMPT.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            prompt_pending: true,
            prompt_on_screen: false,
            input_closed: false,
            eof_exit_reported: false,
        }
    }

    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.state.mode = ModeController::new(mode);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Redirect the shell's own output; children still inherit the real stdio.
    pub fn with_output(mut self, stdout: Box<dyn Write>, stderr: Box<dyn Write>) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Run cycles until the shell exits.
    ///
    /// Command failures are reported and never end the loop; only a failure of
    /// the shell's own input or output streams is returned.
    pub fn run(&mut self) -> anyhow::Result<()> {
        while self.run_cycle()? == CycleOutcome::Continue {}
        self.stdout.flush()?;
        Ok(())
    }

    /// Perform one read, dispatch, reap and commit round.
    pub fn run_cycle(&mut self) -> anyhow::Result<CycleOutcome> {
        self.read_input().context("failed to read input")?;
        self.dispatch_queue()?;
        self.reap()?;
        if self.arbitrate_exit()? {
            tracing::info!("exiting");
            return Ok(CycleOutcome::Exit);
        }
        self.commit_mode()?;
        Ok(CycleOutcome::Continue)
    }

    fn read_input(&mut self) -> io::Result<()> {
        if self.input_closed {
            // nothing more to read; keep the reap cadence of a real poll
            std::thread::sleep(self.poll_interval);
            return Ok(());
        }

        if self.prompt_pending {
            write!(self.stdout, "{}", self.prompt)?;
            self.stdout.flush()?;
            self.prompt_pending = false;
            self.prompt_on_screen = true;
        }

        match self.input.poll_line(self.poll_interval)? {
            InputEvent::Line(line) => {
                tracing::trace!(%line, "read line");
                self.queue.append(lexer::split_into_commands(&line));
                self.prompt_pending = true;
                self.prompt_on_screen = false;
            }
            InputEvent::Eof => {
                tracing::debug!("end of input");
                self.input_closed = true;
                self.state.exit_requested = true;
                if self.prompt_on_screen {
                    writeln!(self.stdout)?;
                    self.prompt_on_screen = false;
                }
            }
            InputEvent::Timeout => {}
        }
        Ok(())
    }

    fn dispatch_queue(&mut self) -> io::Result<()> {
        while let Some(argv) = self.queue.pop() {
            tracing::debug!(command = %argv, "dispatching");
            if let Err(err) = self.execute(argv) {
                self.report(err)?;
            }
        }
        Ok(())
    }

    /// Run one command: a built-in if one claims the name, otherwise an
    /// external program launched in the current (committed) mode.
    fn execute(&mut self, argv: Argv) -> Result<(), ShellError> {
        let args: Vec<&str> = argv.args().iter().map(String::as_str).collect();
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(argv.program(), &args) {
                return cmd.execute(&mut self.state, &mut *self.stdout);
            }
        }

        let command = ExternalCommand::resolve(argv, &self.state.search_paths)?;
        // anything we printed must reach the terminal before the child's output
        self.stdout.flush()?;
        let mode = self.state.mode.current();
        let outcome = self.state.jobs.launch(command, mode)?;
        if let Some(status) = outcome.status {
            tracing::debug!(pid = outcome.pid, code = exit_code(status), "command finished");
        }
        Ok(())
    }

    fn reap(&mut self) -> io::Result<()> {
        while let Some(finished) = self.state.jobs.reap_one() {
            if self.prompt_on_screen {
                writeln!(self.stdout)?;
                self.prompt_on_screen = false;
            }
            writeln!(self.stdout, "{finished}")?;
            self.prompt_pending = true;
        }
        self.stdout.flush()
    }

    /// Returns `true` when the shell should terminate now.
    fn arbitrate_exit(&mut self) -> io::Result<bool> {
        if self.input_closed {
            self.state.exit_requested = true;
        }
        if !self.state.exit_requested {
            return Ok(false);
        }

        let live = self.state.jobs.len();
        if live == 0 {
            return Ok(true);
        }

        self.state.exit_requested = false;
        tracing::debug!(live, "exit refused");
        if self.input_closed {
            // retried every cycle until the jobs are gone; say so only once
            if self.eof_exit_reported {
                return Ok(false);
            }
            self.eof_exit_reported = true;
        }
        self.report(ShellError::BlockedExit { live })?;
        Ok(false)
    }

    fn commit_mode(&mut self) -> io::Result<()> {
        let live = self.state.jobs.len();
        if let Err(err) = self.state.mode.commit(live) {
            self.report(err)?;
        }
        Ok(())
    }

    /// Print a command failure on the error stream.
    ///
    /// I/O errors are not command failures and are handed back to the caller.
    fn report(&mut self, err: ShellError) -> io::Result<()> {
        match err {
            ShellError::Io(e) => Err(e),
            err => {
                tracing::debug!(error = %err, "command failed");
                writeln!(self.stderr, "{err}")?;
                self.stderr.flush()
            }
        }
    }
}
