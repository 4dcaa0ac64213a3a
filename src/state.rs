use crate::config::ShellConfig;
use crate::mode::{ExecMode, ModeController};
use crate::supervisor::ProcessSupervisor;
use std::path::PathBuf;

/// Everything the shell loop and its built-ins mutate between cycles.
///
/// - `search_paths`: directories searched for external programs, fixed at startup.
/// - `mode`: current and requested execution mode.
/// - `jobs`: live background processes.
/// - `exit_requested`: set by `exit` or end of input, cleared when the exit is refused.
pub struct ShellState {
    pub search_paths: Vec<PathBuf>,
    pub mode: ModeController,
    pub jobs: ProcessSupervisor,
    pub exit_requested: bool,
}

impl ShellState {
    pub fn new(config: ShellConfig, initial_mode: ExecMode) -> Self {
        Self {
            search_paths: config.search_paths,
            mode: ModeController::new(initial_mode),
            jobs: ProcessSupervisor::new(),
            exit_requested: false,
        }
    }
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new(ShellConfig::default(), ExecMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_in_requested_mode() {
        let config = ShellConfig {
            search_paths: vec![PathBuf::from("/bin")],
        };
        let state = ShellState::new(config, ExecMode::Parallel);
        assert_eq!(state.search_paths, [PathBuf::from("/bin")]);
        assert_eq!(state.mode.current(), ExecMode::Parallel);
        assert!(state.jobs.is_empty());
        assert!(!state.exit_requested);
    }
}
