//! A small interactive command interpreter.
//!
//! One input line at a time is split into words (honoring single quotes,
//! double quotes and backslash escapes), stripped of its output redirections
//! (`>`, `1>`, `>>`, `1>>`, `2>`, `2>>`), and dispatched either to an
//! in-process builtin (`echo`, `exit`, `type`, `pwd`, `cd`) or to an external
//! program found by path or through `PATH`.
//!
//! The main entry point is [`Interpreter`]. Builtins write through the
//! [`OutputSink`] abstraction, so the same command can print to the console,
//! to a redirection file, or into a [`CapturedOutput`] for inspection.

mod builtin;
pub mod command;
pub mod env;
pub mod error;
mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod state;

pub use builtin::{Builtin, Session};
pub use command::{ExitCode, OutputSink, Stream};
pub use env::Environment;
pub use error::ShellError;
pub use external::ExternalCommand;
pub use interpreter::{Interpreter, PROMPT};
pub use io_adapters::{CapturedOutput, ConsoleSink, RedirectSink};
pub use parser::{ParsedCommand, RedirectTarget, RedirectionSpec};
pub use resolver::PathResolver;
pub use state::ShellState;
