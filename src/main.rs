use anyhow::Result;
use argh::FromArgs;
use std::path::PathBuf;
use tidesh::Interpreter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `TIDESH_LOG=tidesh=debug`.
const LOG_ENV: &str = "TIDESH_LOG";

#[derive(FromArgs)]
/// A small interactive shell with builtins, PATH lookup and output redirection.
struct Args {
    #[argh(option, short = 'c')]
    /// run a single command line and exit instead of prompting.
    command: Option<String>,

    #[argh(option)]
    /// file to load line-editing history from and save it to on exit.
    history: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut shell = Interpreter::default();
    match args.command {
        Some(line) => shell.handle(&line),
        None => shell.repl(args.history.as_deref())?,
    }
    Ok(())
}
