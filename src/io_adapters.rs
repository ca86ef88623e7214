use crate::command::{OutputSink, Stream};
use crate::error::ShellError;
use crate::parser::RedirectionSpec;
use std::io::{self, Write};

/// The shell's inherited stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn write_line(&mut self, stream: Stream, line: &str) -> Result<(), ShellError> {
        match stream {
            Stream::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{line}")?;
                out.flush()?;
            }
            Stream::Stderr => {
                let mut err = io::stderr().lock();
                writeln!(err, "{line}")?;
                err.flush()?;
            }
        }
        Ok(())
    }
}

/// Routes each line to its redirection target when one is set, otherwise to
/// the wrapped fallback sink.
///
/// Each write opens the target, writes a single line and closes it again, so
/// no handle outlives the call.
pub struct RedirectSink<'a, S: OutputSink + ?Sized> {
    redirection: &'a RedirectionSpec,
    fallback: &'a mut S,
}

impl<'a, S: OutputSink + ?Sized> RedirectSink<'a, S> {
    pub fn new(redirection: &'a RedirectionSpec, fallback: &'a mut S) -> Self {
        Self {
            redirection,
            fallback,
        }
    }
}

impl<S: OutputSink + ?Sized> OutputSink for RedirectSink<'_, S> {
    /// On a target failure the line still reaches the fallback stream and the
    /// failure is returned for the caller to report.
    fn write_line(&mut self, stream: Stream, line: &str) -> Result<(), ShellError> {
        let Some(target) = self.redirection.target(stream) else {
            return self.fallback.write_line(stream, line);
        };
        let written = target.open_for_append().and_then(|mut file| {
            writeln!(file, "{line}").map_err(|source| ShellError::Redirect {
                path: target.path.clone(),
                source,
            })
        });
        if let Err(err) = written {
            tracing::warn!(error = %err, "redirected write failed, using inherited stream");
            self.fallback.write_line(stream, line)?;
            return Err(err);
        }
        Ok(())
    }
}

/// Memory-backed sink that records every line together with its stream.
#[derive(Debug, Default, Clone)]
pub struct CapturedOutput {
    lines: Vec<(Stream, String)>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[(Stream, String)] {
        &self.lines
    }

    /// Everything written to `stream`, one `\n`-terminated line per write.
    pub fn text(&self, stream: Stream) -> String {
        self.lines
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, line)| format!("{line}\n"))
            .collect()
    }

    pub fn stdout(&self) -> String {
        self.text(Stream::Stdout)
    }

    pub fn stderr(&self) -> String {
        self.text(Stream::Stderr)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl OutputSink for CapturedOutput {
    fn write_line(&mut self, stream: Stream, line: &str) -> Result<(), ShellError> {
        self.lines.push((stream, line.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RedirectTarget;
    use std::fs;

    #[test]
    fn captured_output_separates_streams() {
        let mut out = CapturedOutput::new();
        out.write_line(Stream::Stdout, "one").unwrap();
        out.write_line(Stream::Stderr, "oops").unwrap();
        out.write_line(Stream::Stdout, "two").unwrap();

        assert_eq!(out.stdout(), "one\ntwo\n");
        assert_eq!(out.stderr(), "oops\n");
        assert_eq!(out.lines().len(), 3);
    }

    #[test]
    fn redirect_sink_without_targets_uses_fallback() {
        let spec = RedirectionSpec::default();
        let mut console = CapturedOutput::new();
        let mut sink = RedirectSink::new(&spec, &mut console);

        sink.write_line(Stream::Stdout, "hello").unwrap();
        sink.write_line(Stream::Stderr, "bad").unwrap();

        assert_eq!(console.stdout(), "hello\n");
        assert_eq!(console.stderr(), "bad\n");
    }

    #[test]
    fn redirect_sink_writes_to_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.txt");
        let spec = RedirectionSpec {
            stdout: Some(RedirectTarget::new(&out_path, false)),
            stderr: None,
        };
        let mut console = CapturedOutput::new();
        let mut sink = RedirectSink::new(&spec, &mut console);

        sink.write_line(Stream::Stdout, "first").unwrap();
        sink.write_line(Stream::Stdout, "second").unwrap();
        sink.write_line(Stream::Stderr, "to console").unwrap();

        assert_eq!(fs::read_to_string(&out_path).unwrap(), "first\nsecond\n");
        assert_eq!(console.stdout(), "");
        assert_eq!(console.stderr(), "to console\n");
    }

    #[test]
    fn redirect_sink_falls_back_when_target_unopenable() {
        let dir = tempfile::tempdir().unwrap();
        let spec = RedirectionSpec {
            stdout: None,
            stderr: Some(RedirectTarget::new(dir.path().join("nope/err.txt"), true)),
        };
        let mut console = CapturedOutput::new();
        let mut sink = RedirectSink::new(&spec, &mut console);

        let res = sink.write_line(Stream::Stderr, "lost?");

        assert!(matches!(res, Err(ShellError::Redirect { .. })));
        assert_eq!(console.stderr(), "lost?\n");
    }
}
