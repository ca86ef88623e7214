//! Turning a word list into a command: redirection extraction and the
//! resulting [`ParsedCommand`].

use crate::command::Stream;
use crate::error::ShellError;
use crate::lexer;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// A file one output stream is rerouted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub path: PathBuf,
    /// `>>`-style: keep existing content and write at the end.
    pub append: bool,
}

impl RedirectTarget {
    pub fn new(path: impl Into<PathBuf>, append: bool) -> Self {
        Self {
            path: path.into(),
            append,
        }
    }

    /// Open for writing at the end of the file, creating it if needed.
    ///
    /// Truncation is done once by [`RedirectionSpec::materialize`]; every
    /// later open, from a builtin or for a child process, appends.
    pub fn open_for_append(&self) -> Result<File, ShellError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.error(source))
    }

    fn create(&self) -> Result<(), ShellError> {
        let mut options = OpenOptions::new();
        options.create(true);
        if self.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        options.open(&self.path).map(drop).map_err(|source| self.error(source))
    }

    fn error(&self, source: io::Error) -> ShellError {
        ShellError::Redirect {
            path: self.path.clone(),
            source,
        }
    }
}

/// Where stdout and stderr go for one command. Empty means both inherited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionSpec {
    pub stdout: Option<RedirectTarget>,
    pub stderr: Option<RedirectTarget>,
}

impl RedirectionSpec {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }

    pub fn target(&self, stream: Stream) -> Option<&RedirectTarget> {
        match stream {
            Stream::Stdout => self.stdout.as_ref(),
            Stream::Stderr => self.stderr.as_ref(),
        }
    }

    /// Record a target; a later operator for the same stream wins.
    fn set(&mut self, stream: Stream, target: RedirectTarget) {
        match stream {
            Stream::Stdout => self.stdout = Some(target),
            Stream::Stderr => self.stderr = Some(target),
        }
    }

    /// Create every declared target before the command runs.
    ///
    /// Relative paths are resolved against `base` (the shell's current
    /// directory) and rewritten in place. Truncating targets are emptied,
    /// appending ones are only created. A target that cannot be created is
    /// removed from the spec, so that stream falls back to the inherited
    /// one; the failures are returned for the caller to report.
    pub fn materialize(&mut self, base: &Path) -> Vec<ShellError> {
        let mut errors = Vec::new();
        for slot in [&mut self.stdout, &mut self.stderr] {
            let Some(target) = slot.as_mut() else {
                continue;
            };
            if target.path.is_relative() {
                target.path = base.join(&target.path);
            }
            if let Err(err) = target.create() {
                tracing::warn!(path = %target.path.display(), "cannot create redirection target");
                errors.push(err);
                *slot = None;
            }
        }
        errors
    }
}

/// Map an operator word to the stream it redirects and its append flag.
fn redirect_operator(word: &str) -> Option<(Stream, bool)> {
    match word {
        ">" | "1>" => Some((Stream::Stdout, false)),
        ">>" | "1>>" => Some((Stream::Stdout, true)),
        "2>" => Some((Stream::Stderr, false)),
        "2>>" => Some((Stream::Stderr, true)),
        _ => None,
    }
}

/// Pull redirection operators and their filenames out of `words`.
///
/// Every other word passes through in its original order. An operator with
/// nothing after it is kept as an ordinary word.
pub fn extract(words: Vec<String>) -> (Vec<String>, RedirectionSpec) {
    let mut remaining = Vec::with_capacity(words.len());
    let mut spec = RedirectionSpec::default();
    let mut iter = words.into_iter();

    while let Some(word) = iter.next() {
        let Some((stream, append)) = redirect_operator(&word) else {
            remaining.push(word);
            continue;
        };
        match iter.next() {
            Some(path) => spec.set(stream, RedirectTarget::new(path, append)),
            None => remaining.push(word),
        }
    }

    (remaining, spec)
}

/// A fully parsed input line: command name, arguments and redirections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    name: String,
    args: Vec<String>,
    redirection: RedirectionSpec,
}

impl ParsedCommand {
    /// Tokenize `line` and split off its redirections.
    ///
    /// A line with no words left after extraction has an empty name.
    pub fn parse(line: &str) -> Self {
        let (words, redirection) = extract(lexer::tokenize(line));
        let mut words = words.into_iter();
        Self {
            name: words.next().unwrap_or_default(),
            args: words.collect(),
            redirection,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn redirection(&self) -> &RedirectionSpec {
        &self.redirection
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Arguments joined with single spaces, the form builtins receive.
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }

    pub fn into_parts(self) -> (String, Vec<String>, RedirectionSpec) {
        (self.name, self.args, self.redirection)
    }
}
