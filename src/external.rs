use crate::command::{ExitCode, OutputSink, Stream};
use crate::env::Environment;
use crate::error::ShellError;
use crate::parser::{RedirectTarget, RedirectionSpec};
use crate::resolver::{PathResolver, has_separator, is_executable};
use crate::state::ShellState;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

/// A program outside the shell, located and ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    /// The name as the user typed it; becomes `argv[0]`.
    name: String,
    /// Resolved location of the executable image.
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalCommand {
    /// Locate `name` the way a shell does.
    ///
    /// - A name containing a path separator is taken as a path: absolute as
    ///   is, relative against the shell's current directory. It must be an
    ///   executable regular file.
    /// - Any other name is searched in `PATH`; the first hit wins.
    pub fn resolve(
        name: &str,
        args: Vec<String>,
        state: &ShellState,
        resolver: &PathResolver,
    ) -> Result<Self, ShellError> {
        let program = if has_separator(name) {
            Some(state.resolve(name)).filter(|path| is_executable(path))
        } else {
            resolver.find(name)
        };
        match program {
            Some(program) => Ok(Self {
                name: name.to_string(),
                program,
                args,
            }),
            None => Err(ShellError::CommandNotFound(name.to_string())),
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Run the program to completion inside the shell's current directory.
    ///
    /// Stdout and stderr go to their redirection targets when set, each
    /// independently, and are inherited from the shell otherwise. A target
    /// that cannot be reopened is reported on `errors` and its stream is
    /// inherited instead; the program still runs.
    pub fn execute(
        self,
        redirection: &RedirectionSpec,
        state: &ShellState,
        env: &Environment,
        errors: &mut dyn OutputSink,
    ) -> Result<ExitCode, ShellError> {
        let mut cmd = Command::new(&self.program);
        set_argv0(&mut cmd, &self.name);
        cmd.args(&self.args)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(state.current_dir())
            .stdout(stdio_for(redirection.stdout.as_ref(), errors))
            .stderr(stdio_for(redirection.stderr.as_ref(), errors));

        tracing::debug!(name = %self.name, program = %self.program.display(), args = ?self.args, "spawning");
        let mut child = cmd.spawn().map_err(|source| ShellError::Spawn {
            name: self.name.clone(),
            source,
        })?;
        let exit_status = child.wait().map_err(|source| ShellError::Wait {
            name: self.name.clone(),
            source,
        })?;

        let code = match exit_status.code() {
            Some(x) => x,
            None => terminated_by_signal(exit_status),
        };
        tracing::debug!(name = %self.name, code, "child exited");
        Ok(code)
    }
}

fn stdio_for(target: Option<&RedirectTarget>, errors: &mut dyn OutputSink) -> Stdio {
    let Some(target) = target else {
        return Stdio::inherit();
    };
    match target.open_for_append() {
        Ok(file) => Stdio::from(file),
        Err(err) => {
            tracing::warn!(path = %target.path.display(), "redirection target unavailable, inheriting stream");
            if let Err(write_err) = errors.write_line(Stream::Stderr, &err.to_string()) {
                tracing::trace!(error = %write_err, "cannot report redirection failure");
            }
            Stdio::inherit()
        }
    }
}

#[cfg(unix)]
fn set_argv0(cmd: &mut Command, name: &str) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(name);
}

#[cfg(not(unix))]
fn set_argv0(_cmd: &mut Command, _name: &str) {}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}
