use crate::command::{CommandFactory, ExecutableCommand};
use crate::errors::{Result, ShellError};
use crate::interpreter::Factory;
use crate::mode::ExecMode;
use crate::state::ShellState;
use argh::{EarlyExit, FromArgs};
use std::io::Write;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "jobs" or "mode".
    fn name() -> &'static str;

    /// Executes the command against the shell state, writing any report to `stdout`.
    fn execute(self, state: &mut ShellState, stdout: &mut dyn Write) -> Result<()>;

    /// Called instead of [`BuiltinCommand::execute`] when the arguments don't parse.
    fn reject(_state: &mut ShellState) {}
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, state: &mut ShellState, stdout: &mut dyn Write) -> Result<()> {
        <T as BuiltinCommand>::execute(*self, state, stdout)
    }
}

/// Outcome of argh refusing the arguments: either `--help` text or a parse error.
struct InvalidArgs {
    command: &'static str,
    output: String,
    is_error: bool,
    reject: fn(&mut ShellState),
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, state: &mut ShellState, stdout: &mut dyn Write) -> Result<()> {
        if !self.is_error {
            stdout.write_all(self.output.as_bytes())?;
            return Ok(());
        }
        (self.reject)(state);
        Err(ShellError::UnrecognizedArgument {
            command: self.command.to_string(),
            message: self.output.trim().to_string(),
        })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        let cmd: Box<dyn ExecutableCommand> = match T::from_args(&[name], args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                command: T::name(),
                output,
                is_error: status.is_err(),
                reject: T::reject,
            }),
        };
        Some(cmd)
    }
}

#[derive(FromArgs)]
/// Exit the shell once no background process is running.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, state: &mut ShellState, _stdout: &mut dyn Write) -> Result<()> {
        state.exit_requested = true;
        Ok(())
    }
}

#[derive(FromArgs)]
/// Show the execution mode, or switch it once the current line is done.
pub struct Mode {
    #[argh(positional)]
    /// sequential (s) or parallel (p); omit to print the current mode.
    pub mode: Option<ExecMode>,
}

impl BuiltinCommand for Mode {
    fn name() -> &'static str {
        "mode"
    }

    fn execute(self, state: &mut ShellState, stdout: &mut dyn Write) -> Result<()> {
        match self.mode {
            None => writeln!(stdout, "Mode: {}", state.mode.current())?,
            Some(mode) => state.mode.request(mode),
        }
        Ok(())
    }

    fn reject(state: &mut ShellState) {
        state.mode.cancel_request();
    }
}

#[derive(FromArgs)]
/// List background processes and whether they are running or paused.
pub struct Jobs {}

impl BuiltinCommand for Jobs {
    fn name() -> &'static str {
        "jobs"
    }

    fn execute(self, state: &mut ShellState, stdout: &mut dyn Write) -> Result<()> {
        let jobs = state.jobs.list();
        if jobs.is_empty() {
            writeln!(stdout, "No background processes.")?;
        }
        for job in jobs {
            writeln!(stdout, "{:>7}  {:<19}  {}", job.pid, job.name, job.state)?;
        }
        Ok(())
    }
}

#[derive(FromArgs)]
/// Suspend a background process.
pub struct Pause {
    #[argh(positional)]
    /// process id as shown by `jobs`.
    pub pid: u32,
}

impl BuiltinCommand for Pause {
    fn name() -> &'static str {
        "pause"
    }

    fn execute(self, state: &mut ShellState, _stdout: &mut dyn Write) -> Result<()> {
        state.jobs.pause(self.pid)
    }
}

#[derive(FromArgs)]
/// Continue a paused background process.
pub struct Resume {
    #[argh(positional)]
    /// process id as shown by `jobs`.
    pub pid: u32,
}

impl BuiltinCommand for Resume {
    fn name() -> &'static str {
        "resume"
    }

    fn execute(self, state: &mut ShellState, _stdout: &mut dyn Write) -> Result<()> {
        state.jobs.resume(self.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Argv;
    use crate::external::ExternalCommand;
    use crate::supervisor::JobState;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    /// Run `line` as a builtin handled by factory `F`, returning stdout and the result.
    fn run<F: BuiltinCommand + 'static>(state: &mut ShellState, line: &str) -> (String, Result<()>) {
        let words: Vec<&str> = line.split_whitespace().collect();
        let cmd = Factory::<F>::default()
            .try_create(words[0], &words[1..])
            .expect("factory should accept its own name");
        let mut out = Vec::new();
        let res = cmd.execute(state, &mut out);
        (String::from_utf8(out).unwrap(), res)
    }

    fn launch_sleep(state: &mut ShellState, seconds: &str) -> u32 {
        let argv = Argv::new(vec!["sleep".to_string(), seconds.to_string()]).unwrap();
        let paths = vec![PathBuf::from("/bin"), PathBuf::from("/usr/bin")];
        let cmd = ExternalCommand::resolve(argv, &paths).unwrap();
        state.jobs.launch(cmd, ExecMode::Parallel).unwrap().pid
    }

    fn wait_for_jobs(state: &mut ShellState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !state.jobs.is_empty() && Instant::now() < deadline {
            state.jobs.drain_finished();
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn factory_ignores_other_names() {
        assert!(Factory::<Jobs>::default().try_create("job", &[]).is_none());
        assert!(Factory::<Mode>::default().try_create("ls", &["-l"]).is_none());
    }

    #[test]
    fn exit_sets_request() {
        let mut state = ShellState::default();
        let (out, res) = run::<Exit>(&mut state, "exit");
        assert!(res.is_ok());
        assert!(out.is_empty());
        assert!(state.exit_requested);
    }

    #[test]
    fn exit_rejects_arguments() {
        let mut state = ShellState::default();
        let (_, res) = run::<Exit>(&mut state, "exit now");
        assert!(matches!(res, Err(ShellError::UnrecognizedArgument { ref command, .. }) if command == "exit"));
        assert!(!state.exit_requested);
    }

    #[test]
    fn mode_without_argument_reports_current() {
        let mut state = ShellState::default();
        let (out, res) = run::<Mode>(&mut state, "mode");
        assert!(res.is_ok());
        assert_eq!(out, "Mode: Sequential\n");
        assert_eq!(state.mode.pending(), ExecMode::Sequential);
    }

    #[test]
    fn mode_stages_request() {
        let mut state = ShellState::default();
        let (_, res) = run::<Mode>(&mut state, "mode p");
        assert!(res.is_ok());
        assert_eq!(state.mode.current(), ExecMode::Sequential);
        assert_eq!(state.mode.pending(), ExecMode::Parallel);

        let (_, res) = run::<Mode>(&mut state, "mode sequential");
        assert!(res.is_ok());
        assert_eq!(state.mode.pending(), ExecMode::Sequential);
    }

    #[test]
    fn mode_bad_argument_cancels_pending_request() {
        let mut state = ShellState::default();
        run::<Mode>(&mut state, "mode parallel").1.unwrap();

        let (_, res) = run::<Mode>(&mut state, "mode fast");
        assert!(matches!(res, Err(ShellError::UnrecognizedArgument { .. })));
        assert_eq!(state.mode.pending(), ExecMode::Sequential);

        run::<Mode>(&mut state, "mode p").1.unwrap();
        let (_, res) = run::<Mode>(&mut state, "mode p s");
        assert!(matches!(res, Err(ShellError::UnrecognizedArgument { .. })));
        assert_eq!(state.mode.pending(), ExecMode::Sequential);
    }

    #[test]
    fn help_is_printed_not_an_error() {
        let mut state = ShellState::default();
        let (out, res) = run::<Mode>(&mut state, "mode --help");
        assert!(res.is_ok());
        assert!(out.contains("Usage: mode"));
    }

    #[test]
    fn jobs_reports_empty_table() {
        let mut state = ShellState::default();
        let (out, res) = run::<Jobs>(&mut state, "jobs");
        assert!(res.is_ok());
        assert_eq!(out, "No background processes.\n");
    }

    #[test]
    fn pause_resume_and_jobs() {
        let mut state = ShellState::default();
        let pid = launch_sleep(&mut state, "0.3");

        let (out, _) = run::<Jobs>(&mut state, "jobs");
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains(&pid.to_string()));
        assert!(out.trim_end().ends_with("running"));

        run::<Pause>(&mut state, &format!("pause {pid}")).1.unwrap();
        let (out, _) = run::<Jobs>(&mut state, "jobs");
        assert!(out.trim_end().ends_with("paused"));

        run::<Resume>(&mut state, &format!("resume {pid}")).1.unwrap();
        assert_eq!(state.jobs.list()[0].state, JobState::Running);

        wait_for_jobs(&mut state);
        assert!(state.jobs.is_empty());
    }

    #[test]
    fn pause_requires_a_numeric_pid() {
        let mut state = ShellState::default();
        let (_, res) = run::<Pause>(&mut state, "pause");
        assert!(matches!(res, Err(ShellError::UnrecognizedArgument { ref command, .. }) if command == "pause"));
        let (_, res) = run::<Resume>(&mut state, "resume abc");
        assert!(matches!(res, Err(ShellError::UnrecognizedArgument { .. })));
    }

    #[test]
    fn pause_unknown_pid_leaves_jobs_unchanged() {
        let mut state = ShellState::default();
        launch_sleep(&mut state, "0.2");
        let before = state.jobs.list();

        let (_, res) = run::<Pause>(&mut state, &format!("pause {}", i32::MAX));
        assert!(matches!(res, Err(ShellError::NoSuchJob(_))));
        assert_eq!(state.jobs.list(), before);

        wait_for_jobs(&mut state);
    }
}
