//! Lexical analysis of one input line.
//!
//! The grammar is deliberately flat: a line is a list of `;`-separated
//! segments, a segment is a list of whitespace-separated words. There is no
//! quoting or escaping. A `#` starts a comment that runs to the end of the line.

use crate::command::CommandQueue;

/// Characters that stop scanning of a line altogether.
const LINE_TERMINATORS: [char; 3] = ['#', '\n', '\0'];

/// Separator between commands on one line.
const COMMAND_SEPARATOR: char = ';';

/// Splits a segment into whitespace-delimited words.
///
/// Anything from the first `#` onwards is a comment and is not tokenized.
///
/// # Arguments
/// * `segment` - Text of a single command, without the `;` separators.
///
/// # Returns
/// The words in order. Empty for a blank or comment-only segment; never
/// contains an empty string.
pub fn tokenize(segment: &str) -> Vec<String> {
    let code = match segment.find('#') {
        Some(comment) => &segment[..comment],
        None => segment,
    };
    code.split_whitespace().map(str::to_owned).collect()
}

/// Splits a full input line into queued commands.
///
/// Scanning stops at the first `#`, newline or NUL. Each `;`-delimited segment
/// before that point is tokenized on its own; segments without any word are
/// dropped, so `";;"` yields an empty queue.
pub fn split_into_commands(line: &str) -> CommandQueue {
    let end = line.find(LINE_TERMINATORS).unwrap_or(line.len());

    let mut queue = CommandQueue::new();
    for segment in line[..end].split(COMMAND_SEPARATOR) {
        queue.push(tokenize(segment));
    }
    queue
}
