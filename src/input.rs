//! Line input with a bounded wait.
//!
//! The shell loop must never block on input indefinitely, otherwise finished
//! background processes would only be noticed when the user types something.

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::AsFd;
use std::time::Duration;

/// Longest input line kept, in bytes. Longer lines are cut at a char boundary.
pub const MAX_LINE_LEN: usize = 4096;

const READ_CHUNK: usize = 4096;

/// What one poll of the input produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A full line, without its trailing newline.
    Line(String),
    /// The input is closed and will produce nothing more.
    Eof,
    /// Nothing arrived within the timeout.
    Timeout,
}

/// Source of command lines for the shell loop.
pub trait InputSource {
    /// Wait at most `timeout` for a line.
    fn poll_line(&mut self, timeout: Duration) -> io::Result<InputEvent>;
}

/// Reads lines from a file descriptor without ever blocking past the timeout.
///
/// Each poll performs at most one `read`. Bytes without a newline yet are kept
/// until the rest of the line arrives, so a partial line costs one poll
/// interval instead of stalling the caller.
pub struct PolledLines<R> {
    reader: R,
    pending: Vec<u8>,
    closed: bool,
}

/// Lines from the process's standard input.
pub type StdinSource = PolledLines<File>;

impl StdinSource {
    /// Reads from a duplicate of fd 0, bypassing std's stdin buffer so that
    /// `poll` sees every byte that is still unread.
    pub fn new() -> io::Result<Self> {
        let fd = io::stdin().as_fd().try_clone_to_owned()?;
        Ok(PolledLines::from_reader(File::from(fd)))
    }
}

impl<R: Read + AsFd> PolledLines<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::new(),
            closed: false,
        }
    }

    /// Whether the descriptor has data (or has hung up) within `timeout`.
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
        let mut fds = [PollFd::new(self.reader.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::from(millis)) {
            Ok(0) => Ok(false),
            Ok(_) => Ok(true),
            Err(Errno::EINTR) => Ok(false),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }

    /// A complete line from the pending bytes, or the unterminated rest once
    /// the input is closed.
    fn take_buffered(&mut self) -> Option<InputEvent> {
        if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            return Some(InputEvent::Line(decode_line(&line)));
        }
        if !self.closed {
            return None;
        }
        if self.pending.is_empty() {
            return Some(InputEvent::Eof);
        }
        let rest = std::mem::take(&mut self.pending);
        Some(InputEvent::Line(decode_line(&rest)))
    }
}

impl<R: Read + AsFd> InputSource for PolledLines<R> {
    fn poll_line(&mut self, timeout: Duration) -> io::Result<InputEvent> {
        if let Some(event) = self.take_buffered() {
            return Ok(event);
        }
        if !self.wait_readable(timeout)? {
            return Ok(InputEvent::Timeout);
        }

        let mut chunk = [0u8; READ_CHUNK];
        match self.reader.read(&mut chunk) {
            Ok(0) => self.closed = true,
            Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
        Ok(self.take_buffered().unwrap_or(InputEvent::Timeout))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = line {
        tracing::warn!("input line is not valid UTF-8, invalid bytes replaced");
    }
    clip_line(line.into_owned())
}

/// Strip the line ending and enforce [`MAX_LINE_LEN`].
pub(crate) fn clip_line(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    if line.len() > MAX_LINE_LEN {
        let mut cut = MAX_LINE_LEN;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        tracing::warn!(len = line.len(), max = MAX_LINE_LEN, "input line truncated");
        line.truncate(cut);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::Shutdown;
    use std::os::unix::net::UnixStream;

    const TICK: Duration = Duration::from_millis(50);

    fn pipe() -> (UnixStream, PolledLines<UnixStream>) {
        let (writer, reader) = UnixStream::pair().expect("socket pair");
        (writer, PolledLines::from_reader(reader))
    }

    /// Poll until something other than a timeout shows up.
    fn next_event(source: &mut PolledLines<UnixStream>) -> InputEvent {
        for _ in 0..40 {
            match source.poll_line(TICK).expect("poll input") {
                InputEvent::Timeout => continue,
                event => return event,
            }
        }
        panic!("no input event within the deadline");
    }

    #[test]
    fn nothing_written_times_out() {
        let (_writer, mut source) = pipe();
        assert_eq!(source.poll_line(TICK).unwrap(), InputEvent::Timeout);
    }

    #[test]
    fn partial_line_waits_for_its_newline() {
        let (mut writer, mut source) = pipe();
        writer.write_all(b"jobs").unwrap();

        assert_eq!(source.poll_line(TICK).unwrap(), InputEvent::Timeout);
        assert_eq!(source.poll_line(TICK).unwrap(), InputEvent::Timeout);

        writer.write_all(b" -x\n").unwrap();
        assert_eq!(next_event(&mut source), InputEvent::Line("jobs -x".into()));
    }

    #[test]
    fn several_lines_in_one_read_come_out_one_by_one() {
        let (mut writer, mut source) = pipe();
        writer.write_all(b"mode p\r\njobs\n").unwrap();

        assert_eq!(next_event(&mut source), InputEvent::Line("mode p".into()));
        // already buffered, no poll needed
        assert_eq!(
            source.poll_line(Duration::ZERO).unwrap(),
            InputEvent::Line("jobs".into())
        );
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let (mut writer, mut source) = pipe();
        writer.write_all(b"\xff\njobs\n").unwrap();

        assert_eq!(next_event(&mut source), InputEvent::Line("\u{FFFD}".into()));
        assert_eq!(next_event(&mut source), InputEvent::Line("jobs".into()));
    }

    #[test]
    fn last_line_without_newline_precedes_eof() {
        let (mut writer, mut source) = pipe();
        writer.write_all(b"exit").unwrap();
        writer.shutdown(Shutdown::Write).unwrap();

        assert_eq!(next_event(&mut source), InputEvent::Line("exit".into()));
        assert_eq!(next_event(&mut source), InputEvent::Eof);
        assert_eq!(source.poll_line(TICK).unwrap(), InputEvent::Eof);
    }

    #[test]
    fn clip_strips_line_endings() {
        assert_eq!(clip_line("ls -l\n".to_string()), "ls -l");
        assert_eq!(clip_line("ls -l\r\n".to_string()), "ls -l");
        assert_eq!(clip_line("no newline".to_string()), "no newline");
    }

    #[test]
    fn clip_keeps_lines_up_to_the_limit() {
        let line = "a".repeat(MAX_LINE_LEN);
        assert_eq!(clip_line(format!("{line}\n")), line);
    }

    #[test]
    fn clip_truncates_on_char_boundary() {
        // 'é' is two bytes, so the limit falls inside a char
        let line = format!("a{}", "é".repeat(MAX_LINE_LEN));
        let clipped = clip_line(line);
        assert!(clipped.len() <= MAX_LINE_LEN);
        assert!(clipped.len() >= MAX_LINE_LEN - 1);
        assert!(clipped.starts_with('a'));
    }
}
