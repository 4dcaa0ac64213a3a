use crate::errors::Result;
use crate::state::ShellState;
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;

/// Argument vector of one command: program name followed by its arguments.
///
/// Never empty. The program name is whatever the user typed; resolution to a
/// concrete executable happens in [`crate::external`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argv(Vec<String>);

impl Argv {
    /// Wrap a token list, or `None` when there is nothing to run.
    pub fn new(tokens: Vec<String>) -> Option<Self> {
        if tokens.is_empty() {
            None
        } else {
            Some(Self(tokens))
        }
    }

    pub fn program(&self) -> &str {
        &self.0[0]
    }

    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for Argv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

/// FIFO of commands parsed from one input line.
///
/// Filled by [`crate::lexer::split_into_commands`] and drained completely by the
/// shell loop before it asks for more input.
#[derive(Debug, Default)]
pub struct CommandQueue {
    entries: VecDeque<Argv>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tokenized command. Empty token lists are silently dropped.
    pub fn push(&mut self, tokens: Vec<String>) {
        if let Some(argv) = Argv::new(tokens) {
            self.entries.push_back(argv);
        }
    }

    pub fn pop(&mut self) -> Option<Argv> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move every entry of `other` to the back of this queue.
    pub fn append(&mut self, other: CommandQueue) {
        self.entries.extend(other.entries);
    }
}

impl IntoIterator for CommandQueue {
    type Item = Argv;
    type IntoIter = std::collections::vec_deque::IntoIter<Argv>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Object-safe trait for anything the shell runs in-process.
///
/// Implemented by built-ins via a blanket impl in [`crate::builtin`].
pub trait ExecutableCommand {
    /// Executes the command against the shell state.
    ///
    /// Normal output goes to `stdout`; failures are returned and reported by
    /// the caller.
    fn execute(self: Box<Self>, state: &mut ShellState, stdout: &mut dyn Write) -> Result<()>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_owned).collect()
    }

    #[test]
    fn argv_rejects_empty_token_list() {
        assert!(Argv::new(Vec::new()).is_none());
    }

    #[test]
    fn argv_splits_program_and_args() {
        let argv = Argv::new(words("sleep 10")).unwrap();
        assert_eq!(argv.program(), "sleep");
        assert_eq!(argv.args(), ["10".to_string()]);
        assert_eq!(argv.to_string(), "sleep 10");
    }

    #[test]
    fn queue_is_fifo_and_skips_empty_commands() {
        let mut queue = CommandQueue::new();
        queue.push(words("echo a"));
        queue.push(Vec::new());
        queue.push(words("echo b"));
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.pop().unwrap().to_string(), "echo a");
        assert_eq!(queue.pop().unwrap().to_string(), "echo b");
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn append_keeps_order() {
        let mut first = CommandQueue::new();
        first.push(words("a"));
        let mut second = CommandQueue::new();
        second.push(words("b"));
        second.push(words("c"));

        first.append(second);
        let order: Vec<String> = first.into_iter().map(|a| a.to_string()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }
}
