use crate::command::{OutputSink, Stream};
use crate::env::Environment;
use crate::error::ShellError;
use crate::resolver::PathResolver;
use crate::state::ShellState;
use std::fs;
use std::path::Path;

/// Everything a builtin may read or change while it runs.
pub struct Session<'a> {
    pub state: &'a mut ShellState,
    pub env: &'a Environment,
    pub resolver: &'a PathResolver,
}

/// Commands implemented inside the shell process.
///
/// Each builtin receives its arguments already joined with single spaces and
/// writes its output line by line through an [`OutputSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Echo,
    Exit,
    Type,
    Pwd,
    Cd,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::Echo,
        Builtin::Exit,
        Builtin::Type,
        Builtin::Pwd,
        Builtin::Cd,
    ];

    /// Canonical name of the command, e.g. "echo" or "cd".
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Echo => "echo",
            Builtin::Exit => "exit",
            Builtin::Type => "type",
            Builtin::Pwd => "pwd",
            Builtin::Cd => "cd",
        }
    }

    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub fn execute(
        self,
        args: &str,
        session: Session<'_>,
        sink: &mut dyn OutputSink,
    ) -> Result<(), ShellError> {
        match self {
            Builtin::Echo => sink.write_line(Stream::Stdout, args),
            Builtin::Exit => {
                session.state.should_exit = true;
                Ok(())
            }
            Builtin::Type => type_of(args, session.resolver, sink),
            Builtin::Pwd => {
                let dir = session.state.current_dir().display().to_string();
                sink.write_line(Stream::Stdout, &dir)
            }
            Builtin::Cd => cd(args, session.state, session.env, sink),
        }
    }
}

fn type_of(
    name: &str,
    resolver: &PathResolver,
    sink: &mut dyn OutputSink,
) -> Result<(), ShellError> {
    if name.is_empty() {
        return Ok(());
    }
    if Builtin::lookup(name).is_some() {
        return sink.write_line(Stream::Stdout, &format!("{name} is a shell builtin"));
    }
    match resolver.find(name) {
        Some(path) => sink.write_line(Stream::Stdout, &format!("{name} is {}", path.display())),
        None => sink.write_line(Stream::Stderr, &format!("{name}: not found")),
    }
}

fn cd(
    args: &str,
    state: &mut ShellState,
    env: &Environment,
    sink: &mut dyn OutputSink,
) -> Result<(), ShellError> {
    let raw = args.trim();
    let home = env.get_var("HOME").filter(|home| !home.is_empty());

    let (target, shown) = match raw {
        "" => match home {
            Some(home) => (state.resolve(home), home),
            None => return Ok(()),
        },
        "~" => match home {
            Some(home) => (state.resolve(home), "~"),
            None => return sink.write_line(Stream::Stderr, "cd: ~: HOME not set"),
        },
        _ => (state.resolve(raw), raw),
    };

    // Canonicalization fails for missing paths; keep the joined path then.
    let target = fs::canonicalize(&target).unwrap_or(target);

    if let Some(reason) = unusable_directory(&target) {
        return sink.write_line(Stream::Stderr, &format!("cd: {shown}: {reason}"));
    }

    tracing::debug!(from = %state.current_dir().display(), to = %target.display(), "cd");
    state.set_current_dir(target);
    Ok(())
}

/// Why `path` cannot become the current directory, checked in the order a
/// shell reports it.
fn unusable_directory(path: &Path) -> Option<&'static str> {
    let Ok(meta) = fs::metadata(path) else {
        return Some("No such file or directory");
    };
    if !meta.is_dir() {
        return Some("Not a directory");
    }
    if fs::read_dir(path).is_err() {
        return Some("Permission denied");
    }
    None
}
