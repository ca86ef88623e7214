//! Error values produced while running a single command line.
//!
//! None of these are fatal to the shell: the interpreter turns each one into a
//! one-line message on the appropriate stream and reads the next line.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure raised by an output sink or by the external command executor.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Neither a builtin nor an executable reachable by path or `PATH`.
    #[error("{0}: command not found")]
    CommandNotFound(String),

    /// A redirection target could not be created, opened or written.
    #[error("{}: {source}", .path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The child process could not be started.
    #[error("{name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Waiting for the child process failed.
    #[error("{name}: wait failed: {source}")]
    Wait {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Writing to the shell's own stdout or stderr failed.
    #[error("write error: {0}")]
    Output(#[from] io::Error),
}
