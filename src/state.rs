use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Mutable, session-wide state of the shell.
///
/// `current_dir` is the emulated working directory: `cd` rewrites it, `pwd`
/// prints it, and child processes are started inside it. The process-level
/// working directory is never changed.
#[derive(Debug, Clone)]
pub struct ShellState {
    current_dir: PathBuf,
    /// Set by `exit`; the read loop stops as soon as it observes it.
    pub should_exit: bool,
}

impl ShellState {
    /// Start in `dir`, which must be absolute.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            current_dir: dir.into(),
            should_exit: false,
        }
    }

    /// Start in the directory the process was launched from.
    pub fn from_process() -> Self {
        Self::new(stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("/")))
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Callers must have verified that `dir` exists, is a directory and is
    /// readable.
    pub fn set_current_dir(&mut self, dir: PathBuf) {
        self.current_dir = dir;
    }

    /// Resolve `path` against the current directory unless it is absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.current_dir.join(path)
        }
    }
}
