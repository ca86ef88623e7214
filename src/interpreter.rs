use crate::builtin::{Builtin, Session};
use crate::command::{ExitCode, OutputSink, Stream};
use crate::env::Environment;
use crate::error::ShellError;
use crate::external::ExternalCommand;
use crate::io_adapters::{ConsoleSink, RedirectSink};
use crate::parser::{ParsedCommand, RedirectionSpec};
use crate::resolver::PathResolver;
use crate::state::ShellState;
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::Path;

/// The prompt printed before every line.
pub const PROMPT: &str = "$ ";

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// It owns the session state (current directory, exit flag), the injected
/// environment and the `PATH` resolver built from it, and threads them
/// through every command it runs.
///
/// Example
/// ```
/// use tidesh::{CapturedOutput, Interpreter};
/// let mut sh = Interpreter::default();
/// let mut out = CapturedOutput::new();
/// sh.handle_with("echo hello   'big   world'", &mut out);
/// assert_eq!(out.stdout(), "hello big   world\n");
/// ```
pub struct Interpreter {
    env: Environment,
    state: ShellState,
    resolver: PathResolver,
}

impl Interpreter {
    /// Create an interpreter over an explicit environment and starting state.
    pub fn new(env: Environment, state: ShellState) -> Self {
        let resolver = PathResolver::from_env(&env);
        Self {
            env,
            state,
            resolver,
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Whether `exit` has been run.
    pub fn should_exit(&self) -> bool {
        self.state.should_exit
    }

    /// Run one input line against the process's own stdout and stderr.
    pub fn handle(&mut self, line: &str) {
        self.handle_with(line, &mut ConsoleSink);
    }

    /// Run one input line, using `console` as the inherited streams.
    ///
    /// Every failure is reported as a single line and swallowed; the shell
    /// always continues with the next line. Child processes write to the
    /// real process streams unless redirected, regardless of `console`.
    pub fn handle_with(&mut self, line: &str, console: &mut dyn OutputSink) {
        let (name, args, mut redirection) = ParsedCommand::parse(line).into_parts();
        tracing::debug!(%name, ?args, ?redirection, "parsed line");

        for err in redirection.materialize(self.state.current_dir()) {
            report(console, &err);
        }

        if name.is_empty() {
            return;
        }

        let mut sink = RedirectSink::new(&redirection, console);
        let result = match Builtin::lookup(&name) {
            Some(builtin) => {
                tracing::debug!(builtin = builtin.name(), "running builtin");
                let session = Session {
                    state: &mut self.state,
                    env: &self.env,
                    resolver: &self.resolver,
                };
                builtin.execute(&args.join(" "), session, &mut sink)
            }
            None => self
                .run_external(&name, args, &redirection, &mut sink)
                .map(drop),
        };

        if let Err(err) = result {
            tracing::debug!(error = %err, "command failed");
            report(&mut sink, &err);
        }
    }

    fn run_external(
        &self,
        name: &str,
        args: Vec<String>,
        redirection: &RedirectionSpec,
        sink: &mut dyn OutputSink,
    ) -> Result<ExitCode, ShellError> {
        ExternalCommand::resolve(name, args, &self.state, &self.resolver)?.execute(
            redirection,
            &self.state,
            &self.env,
            sink,
        )
    }

    /// Read-Eval-Print Loop over an interactive line editor.
    ///
    /// Returns when input ends or after `exit`. `history`, when given, is
    /// loaded before the first prompt and saved on the way out.
    pub fn repl(&mut self, history: Option<&Path>) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new().context("cannot initialize line editor")?;
        if let Some(path) = history {
            if let Err(err) = rl.load_history(path) {
                tracing::debug!(path = %path.display(), error = %err, "no history loaded");
            }
        }

        while !self.state.should_exit {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    self.handle(&line);
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err).context("cannot read input line"),
            }
        }

        // Exit status stays 0 even when history cannot be written.
        if let Some(path) = history {
            if let Err(err) = rl.save_history(path) {
                tracing::warn!(path = %path.display(), error = %err, "cannot save history");
            }
        }
        Ok(())
    }
}

impl Default for Interpreter {
    /// An interpreter over the process environment, started in the process's
    /// current directory.
    fn default() -> Self {
        Self::new(Environment::from_process(), ShellState::from_process())
    }
}

/// Report `err` on the stderr stream of `sink`, falling back to the process
/// stderr if even that fails.
fn report(sink: &mut dyn OutputSink, err: &ShellError) {
    if let Err(write_err) = sink.write_line(Stream::Stderr, &err.to_string()) {
        tracing::warn!(error = %write_err, "cannot report error");
        // Last resort: nowhere left to report a failure of the process stderr.
        if let Err(console_err) = ConsoleSink.write_line(Stream::Stderr, &err.to_string()) {
            tracing::trace!(error = %console_err, "stderr unavailable");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::CapturedOutput;
    use std::fs;

    fn interpreter_in(dir: &Path) -> Interpreter {
        let env = Environment::from_vars([("PATH", "/bin:/usr/bin")]);
        Interpreter::new(env, ShellState::new(fs::canonicalize(dir).unwrap()))
    }

    fn run(sh: &mut Interpreter, line: &str) -> CapturedOutput {
        let mut out = CapturedOutput::new();
        sh.handle_with(line, &mut out);
        out
    }

    #[test]
    fn echo_preserves_quoted_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        let out = run(&mut sh, "echo \"hello   world\" foo");

        assert_eq!(out.stdout(), "hello   world foo\n");
        assert_eq!(out.stderr(), "");
    }

    #[test]
    fn blank_line_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        assert!(run(&mut sh, "").is_empty());
        assert!(run(&mut sh, "   \t").is_empty());
    }

    #[test]
    fn type_scenarios() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        assert_eq!(run(&mut sh, "type cd").stdout(), "cd is a shell builtin\n");

        let out = run(&mut sh, "type zzzznotreal");
        assert_eq!(out.stdout(), "");
        assert_eq!(out.stderr(), "zzzznotreal: not found\n");

        #[cfg(unix)]
        {
            let out = run(&mut sh, "type sh");
            assert!(out.stdout().starts_with("sh is /"), "{}", out.stdout());
        }
    }

    #[test]
    fn unknown_command_creates_target_and_reports_on_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        let out = run(&mut sh, "nonexistent_cmd_xyz arg1 > out.txt");

        assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "");
        assert_eq!(out.stdout(), "");
        assert_eq!(out.stderr(), "nonexistent_cmd_xyz: command not found\n");
        assert!(!sh.should_exit());
    }

    #[test]
    fn not_found_honors_stderr_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        let out = run(&mut sh, "nonexistent_cmd_xyz 2> err.txt");

        assert!(out.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("err.txt")).unwrap(),
            "nonexistent_cmd_xyz: command not found\n"
        );
    }

    #[test]
    fn builtin_output_is_redirected() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        run(&mut sh, "echo first > log.txt");
        run(&mut sh, "echo second 1>> log.txt");
        let out = run(&mut sh, "type nothing_here_xyz 2>> log.txt");

        assert!(out.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("log.txt")).unwrap(),
            "first\nsecond\nnothing_here_xyz: not found\n"
        );

        run(&mut sh, "echo fresh > log.txt");
        assert_eq!(
            fs::read_to_string(dir.path().join("log.txt")).unwrap(),
            "fresh\n"
        );
    }

    #[test]
    fn silent_command_still_creates_targets() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "kept\n").unwrap();
        let mut sh = interpreter_in(dir.path());

        run(&mut sh, "cd . > empty.txt 2>> keep.txt");

        assert_eq!(fs::read_to_string(dir.path().join("empty.txt")).unwrap(), "");
        assert_eq!(
            fs::read_to_string(dir.path().join("keep.txt")).unwrap(),
            "kept\n"
        );
    }

    #[test]
    fn unopenable_target_is_reported_and_command_still_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        let out = run(&mut sh, "echo still here > missing/out.txt");

        assert_eq!(out.stdout(), "still here\n");
        assert!(out.stderr().contains("missing/out.txt"), "{}", out.stderr());
    }

    #[test]
    fn cd_parent_twice_then_pwd() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let mut sh = interpreter_in(dir.path());

        run(&mut sh, "cd a/b");
        run(&mut sh, "cd ..");
        run(&mut sh, "cd ..");

        assert_eq!(run(&mut sh, "pwd").stdout(), format!("{}\n", root.display()));
    }

    #[test]
    fn failed_cd_leaves_pwd_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        let mut sh = interpreter_in(dir.path());

        let out = run(&mut sh, "cd nowhere");

        assert_eq!(out.stderr(), "cd: nowhere: No such file or directory\n");
        assert_eq!(run(&mut sh, "pwd").stdout(), format!("{}\n", root.display()));
    }

    #[test]
    fn redirect_paths_follow_emulated_cwd() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let mut sh = interpreter_in(dir.path());

        run(&mut sh, "cd sub");
        run(&mut sh, "echo inside > note.txt");

        assert_eq!(
            fs::read_to_string(dir.path().join("sub/note.txt")).unwrap(),
            "inside\n"
        );
    }

    #[test]
    fn exit_sets_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        let out = run(&mut sh, "exit 1");

        assert!(out.is_empty());
        assert!(sh.should_exit());
    }

    #[test]
    #[cfg(unix)]
    fn external_command_with_quoted_args_and_redirection() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        let out = run(
            &mut sh,
            r#"sh -c 'printf "%s|" "$@"; echo' argv0 "a  b" c\ d > out.txt"#,
        );

        assert!(out.is_empty(), "{:?}", out.lines());
        assert_eq!(
            fs::read_to_string(dir.path().join("out.txt")).unwrap(),
            "a  b|c d|\n"
        );
    }

    #[test]
    #[cfg(unix)]
    fn external_command_runs_in_emulated_cwd() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("work")).unwrap();
        let work = fs::canonicalize(dir.path().join("work")).unwrap();
        let mut sh = interpreter_in(dir.path());

        run(&mut sh, "cd work");
        run(&mut sh, "sh -c 'pwd -P' > where.txt");

        assert_eq!(
            fs::read_to_string(work.join("where.txt")).unwrap(),
            format!("{}\n", work.display())
        );
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn external_argv0_is_typed_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        let out = run(&mut sh, "cat /proc/self/cmdline > c.txt");

        assert!(out.is_empty(), "{:?}", out.lines());
        let cmdline = fs::read(dir.path().join("c.txt")).unwrap();
        assert!(cmdline.starts_with(b"cat\0"), "{cmdline:?}");
    }
}
