use crate::command::Argv;
use crate::errors::{Result, ShellError};
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus};

/// Longest display name kept for a background process.
pub const MAX_DISPLAY_NAME_LEN: usize = 19;

/// A command that is not a builtin, already resolved to an executable.
#[derive(Debug)]
pub struct ExternalCommand {
    path: PathBuf,
    argv: Argv,
}

impl ExternalCommand {
    /// Resolve `argv`'s program against `search_paths`.
    ///
    /// Fails with [`ShellError::CommandNotFound`] naming the attempted command.
    pub fn resolve(argv: Argv, search_paths: &[PathBuf]) -> Result<Self> {
        match find_command_path(argv.program(), search_paths) {
            Some(path) => Ok(Self { path, argv }),
            None => Err(ShellError::CommandNotFound(argv.program().to_string())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn argv(&self) -> &Argv {
        &self.argv
    }

    /// Basename of the resolved executable, cut to [`MAX_DISPLAY_NAME_LEN`] chars.
    pub fn display_name(&self) -> String {
        let base = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_else(|| self.path.to_string_lossy());
        base.chars().take(MAX_DISPLAY_NAME_LEN).collect()
    }

    /// Start the program. The child inherits the shell's stdio.
    ///
    /// If the program cannot be executed no child is left behind; the error
    /// names the full command line.
    pub fn spawn(self) -> Result<Child> {
        std::process::Command::new(&self.path)
            .args(self.argv.args())
            .spawn()
            .map_err(|source| ShellError::ExecFailure {
                command: self.argv.to_string(),
                source,
            })
    }
}

/// Shell-style exit code for a finished process: the exit status, or 128 + signal.
#[cfg(unix)]
pub fn exit_code(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(code) = exit_status.code() {
        code
    } else if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
pub fn exit_code(exit_status: ExitStatus) -> i32 {
    exit_status.code().unwrap_or(-1)
}

/// Resolve a command name to an executable.
///
/// Behavior:
/// - `name` itself is tried first, as typed: an absolute path, a path with
///   separators, or a file in the current directory (returned as `./name`).
/// - Otherwise each directory of `search_paths` is tried in order and the
///   first `<dir>/<name>` that is executable wins.
/// - Empty name, or no candidate anywhere: `None`.
///
/// Only regular files with an execute bit count, so a directory or a plain
/// data file with a matching name does not shadow a real program.
pub fn find_command_path(name: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let direct = Path::new(name);
    if is_executable(direct) {
        tracing::trace!(candidate = %direct.display(), "resolved as typed");
        // a bare name would be looked up in $PATH again at spawn time
        if !name.contains('/') {
            return Some(Path::new(".").join(name));
        }
        return Some(direct.to_path_buf());
    }

    search_paths
        .iter()
        .map(|dir| dir.join(name))
        .inspect(|candidate| tracing::trace!(candidate = %candidate.display(), "probing"))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
