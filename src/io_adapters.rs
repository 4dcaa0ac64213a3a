use crate::input::{InputEvent, InputSource};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{Result as IoResult, Write};
use std::rc::Rc;
use std::time::Duration;

/// Memory-backed input for driving the shell without a terminal.
///
/// Replays queued events in order. Once they run out it reports end of input,
/// like a closed pipe.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    events: VecDeque<InputEvent>,
}

impl ScriptedInput {
    /// Create a ScriptedInput that will hand out `lines` one per poll.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: lines
                .into_iter()
                .map(|line| InputEvent::Line(line.into()))
                .collect(),
        }
    }

    /// Queue a line.
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.events.push_back(InputEvent::Line(line.into()));
        self
    }

    /// Queue `count` polls on which nothing arrives.
    pub fn idle(mut self, count: usize) -> Self {
        self.events.extend(std::iter::repeat_n(InputEvent::Timeout, count));
        self
    }
}

impl InputSource for ScriptedInput {
    /// An idle poll sleeps for the whole timeout, as a real quiet terminal would.
    fn poll_line(&mut self, timeout: Duration) -> IoResult<InputEvent> {
        let event = self.events.pop_front().unwrap_or(InputEvent::Eof);
        if event == InputEvent::Timeout {
            std::thread::sleep(timeout);
        }
        Ok(event)
    }
}

/// Memory-backed writer for capturing the shell's output.
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    /// Public constructor.
    pub fn new() -> Self {
        Self {
            buf: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(handle: &Rc<RefCell<Vec<u8>>>) -> String {
        String::from_utf8_lossy(&handle.borrow()).into_owned()
    }
}

impl Default for MemWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
