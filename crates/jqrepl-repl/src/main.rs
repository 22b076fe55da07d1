//! jqrepl CLI entry point.
//!
//! Usage:
//!   jqrepl                     # REPL over `null` (or piped stdin)
//!   jqrepl data.json           # REPL over a JSON file
//!   curl ... | jqrepl          # REPL over piped JSON; keys come from the tty
//!   jqrepl -n                  # REPL over `null`, ignoring stdin

use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use jqrepl_repl::ReplConfig;
use jqrepl_types::Jv;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var); stdout carries results
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Where the initial input value comes from.
#[derive(Debug, PartialEq)]
enum InputSource {
    Null,
    File(PathBuf),
    Stdin,
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Version,
    Repl(InputSource),
}

fn parse_args(args: &[String], stdin_is_tty: bool) -> Result<Command> {
    let mut null_input = false;
    let mut file: Option<PathBuf> = None;

    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--null-input" | "-n" => null_input = true,
            "-" => file = None,
            unknown if unknown.starts_with('-') => {
                bail!("Unknown option: {unknown}\nRun 'jqrepl --help' for usage.")
            }
            path => {
                if file.is_some() {
                    bail!("Only one input file is supported");
                }
                file = Some(PathBuf::from(path));
            }
        }
    }

    let source = match (null_input, file) {
        (true, _) => InputSource::Null,
        (false, Some(path)) => InputSource::File(path),
        (false, None) if !stdin_is_tty => InputSource::Stdin,
        (false, None) => InputSource::Null,
    };
    Ok(Command::Repl(source))
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();

    match parse_args(&args, io::stdin().is_terminal())? {
        Command::Help => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Command::Version => {
            println!("jqrepl {} ({} {} {})",
                     env!("CARGO_PKG_VERSION"),
                     env!("JQREPL_GIT_HASH"),
                     env!("JQREPL_BUILD_DATE"),
                     env!("JQREPL_BUILD_PROFILE"));
            Ok(ExitCode::SUCCESS)
        }

        Command::Repl(source) => {
            let input = load(source)?;
            jqrepl_repl::run(ReplConfig::interactive(), input)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load(source: InputSource) -> Result<Jv> {
    match source {
        InputSource::Null => Ok(Jv::null()),
        InputSource::File(path) => jqrepl_repl::load_input(&path),
        InputSource::Stdin => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            jqrepl_repl::parse_input(&text)
        }
    }
}

fn print_help() {
    println!(r#"jqrepl v{}: interactive jq

Usage:
  jqrepl [OPTIONS] [FILE]

Input is read from FILE, or from stdin when it is not a terminal.
Empty input is null.

Options:
  -n, --null-input             Use null as input, ignoring stdin
  -h, --help                   Show this help
  -V, --version                Show version

Environment:
  JQ_COLORS                    Output colours, as for jq
  RUST_LOG                     Log filter (logs go to stderr)

Examples:
  jqrepl data.json             # Explore a file
  curl -s $URL | jqrepl        # Explore an API response
"#, env!("CARGO_PKG_VERSION"));
}
