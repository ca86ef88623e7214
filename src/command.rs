use crate::error::ShellError;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Signal terminations are reported as `128 + signal`, the way POSIX shells do.
pub type ExitCode = i32;

/// One of the two output streams a command can write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Line-oriented destination for everything a builtin (or the interpreter
/// itself) wants to show the user.
///
/// Builtins never touch the process streams directly; they are handed a sink
/// which decides whether a line lands on the console or in a redirection file.
pub trait OutputSink {
    /// Write `line` followed by a newline to `stream`.
    fn write_line(&mut self, stream: Stream, line: &str) -> Result<(), ShellError>;
}

