//! jqrepl: an interactive jq filter playground.
//!
//! Each line typed at the prompt is a jq program. It runs against the
//! current input value, and results stream to stdout as they are produced.
//! It handles:
//! - Meta-commands: `/help`, `/quit`, `/input`, `/set`, `/load`, `/compact`
//! - Program runs via an engine [`Session`]
//! - Ctrl-C cancellation of a running program
//! - Command history via rustyline

pub mod config;
pub mod format;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rustyline::config::{Behavior, Config};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tokio::runtime::Runtime;

use jqrepl_kernel::{Run, RunEvent, Session};
use jqrepl_types::{Jv, PrintFlags};

pub use config::ReplConfig;

/// What the caller should do after a line is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Exit,
}

/// Counts from one program run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub outputs: usize,
    pub errors: usize,
    pub cancelled: bool,
    /// The run ignored cancellation and was left behind.
    pub abandoned: bool,
}

/// What a Ctrl-C during a run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Cancelled,
    Abandon,
}

/// First interrupt cancels the run; a repeat gives up on it.
fn interrupt(run: &mut Run) -> Interrupt {
    if run.is_cancelled() {
        Interrupt::Abandon
    } else {
        run.cancel();
        Interrupt::Cancelled
    }
}

/// REPL state: the engine session, the current input, and the counter.
pub struct Repl {
    session: Session,
    runtime: Runtime,
    input: Jv,
    counter: usize,
    config: ReplConfig,
}

impl Repl {
    /// Create a REPL with default (plain) settings.
    pub fn new(input: Jv) -> Result<Self> {
        Self::with_config(ReplConfig::default(), input)
    }

    pub fn with_config(config: ReplConfig, input: Jv) -> Result<Self> {
        let session = Session::open(config.session.clone()).context("Failed to open engine session")?;
        let runtime = Runtime::new().context("Failed to create tokio runtime")?;

        Ok(Self {
            session,
            runtime,
            input,
            counter: 1,
            config,
        })
    }

    /// The value programs run against.
    pub fn input(&self) -> &Jv {
        &self.input
    }

    pub fn set_input(&mut self, input: Jv) {
        self.input = input;
    }

    /// Number of the next program to run.
    pub fn counter(&self) -> usize {
        self.counter
    }

    pub fn prompt(&self) -> String {
        format::prompt(self.counter, self.config.prompt_colour)
    }

    /// Process one line: a meta-command, a program, or nothing.
    pub fn process_line(
        &mut self,
        line: &str,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> Result<LineOutcome> {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return Ok(LineOutcome::Continue);
        }

        if trimmed.starts_with('/') {
            return self.handle_meta_command(trimmed, out);
        }

        self.run_program(trimmed, out, err)?;
        Ok(LineOutcome::Continue)
    }

    /// Run `program` against the current input, streaming results.
    ///
    /// The input handle is shared with the run, so the REPL keeps its copy
    /// for the next program.
    pub fn run_program(
        &mut self,
        program: &str,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> Result<RunStats> {
        self.counter += 1;

        let mut run = self.session.start(program);
        run.send_input(self.input.clone());

        let config = &self.config;
        let colour = config.colour();

        let stats = self.runtime.block_on(async {
            let mut stats = RunStats::default();
            loop {
                // The token is only checked between results, so a step that
                // never yields ignores the first Ctrl-C; the second one stops
                // waiting for it.
                let event = tokio::select! {
                    event = run.next_event() => event,
                    _ = tokio::signal::ctrl_c(), if config.handle_ctrl_c => {
                        match interrupt(&mut run) {
                            Interrupt::Cancelled => {
                                tracing::debug!(program, "cancelling run on interrupt");
                                stats.cancelled = true;
                                continue;
                            }
                            Interrupt::Abandon => {
                                tracing::warn!(program, "run ignored cancellation, abandoning it");
                                stats.abandoned = true;
                                break;
                            }
                        }
                    }
                };

                match event {
                    Some(RunEvent::Output(jv)) => {
                        stats.outputs += 1;
                        writeln!(out, "{}", format::format_output(&jv, config.flags, &config.palette))?;
                    }
                    Some(RunEvent::Error(e)) => {
                        stats.errors += 1;
                        writeln!(err, "{}", format::format_error(&e, colour))?;
                    }
                    None => break,
                }
            }
            out.flush()?;
            if stats.cancelled {
                writeln!(err, "^C")?;
            }
            Ok::<_, anyhow::Error>(stats)
        })?;

        if stats.abandoned {
            drop(run);
            self.restart_session()?;
            writeln!(err, "Run abandoned; engine restarted")?;
        }
        Ok(stats)
    }

    /// Replace the engine session, leaving the old engine thread to finish
    /// on its own.
    pub fn restart_session(&mut self) -> Result<()> {
        let fresh = Session::open(self.config.session.clone()).context("Failed to open engine session")?;
        std::mem::replace(&mut self.session, fresh).abandon();
        Ok(())
    }

    /// Handle a meta-command (starts with /).
    fn handle_meta_command(&mut self, cmd: &str, out: &mut impl Write) -> Result<LineOutcome> {
        let (command, arg) = match cmd.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (cmd, ""),
        };

        match command {
            "/quit" | "/q" | "/exit" => return Ok(LineOutcome::Exit),
            "/help" | "/h" | "/?" => writeln!(out, "{}", HELP_TEXT)?,
            "/input" => {
                let rendered = format::format_output(&self.input, self.config.flags, &self.config.palette);
                writeln!(out, "{}", rendered)?;
            }
            "/set" if arg.is_empty() => writeln!(out, "Usage: /set <json>")?,
            "/set" => match Jv::parse(arg) {
                Ok(jv) => {
                    self.input = jv;
                    writeln!(out, "Input replaced")?;
                }
                Err(e) => writeln!(out, "Invalid JSON: {}", e)?,
            },
            "/load" if arg.is_empty() => writeln!(out, "Usage: /load <path>")?,
            "/load" => match load_input(Path::new(arg)) {
                Ok(jv) => {
                    self.input = jv;
                    writeln!(out, "Input loaded from {}", arg)?;
                }
                Err(e) => writeln!(out, "{:#}", e)?,
            },
            "/compact" => {
                self.config.flags.toggle(PrintFlags::PRETTY);
                let mode = if self.config.flags.contains(PrintFlags::PRETTY) { "OFF" } else { "ON" };
                writeln!(out, "Compact output: {}", mode)?;
            }
            _ => writeln!(
                out,
                "Unknown command: {}\nType /help for available commands.",
                command
            )?,
        }
        Ok(LineOutcome::Continue)
    }
}

const HELP_TEXT: &str = r#"jqrepl: interactive jq

Type a jq program to run it against the current input.

Meta Commands:
  /help, /?         Show this help
  /quit, /q         Exit the REPL
  /input            Show the current input
  /set <json>       Replace the input with a JSON value
  /load <path>      Replace the input with the contents of a JSON file
  /compact          Toggle compact output

Keys:
  Ctrl-C            Cancel the running program (press again to abandon it)
  Ctrl-D            Exit

Examples:
  .                 # Show the input
  .items[] | .name  # Stream each name
  map(select(.ok))  # Filter an array
"#;

/// Parse input text as one JSON value. Blank text is `null`.
pub fn parse_input(text: &str) -> Result<Jv> {
    if text.trim().is_empty() {
        return Ok(Jv::null());
    }
    Jv::parse(text).context("Input is not valid JSON")
}

/// Read a JSON file as the input value.
pub fn load_input(path: &Path) -> Result<Jv> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input: {}", path.display()))?;
    parse_input(&text).with_context(|| format!("Failed to parse input: {}", path.display()))
}

/// Save REPL history to disk.
fn save_history(rl: &mut Editor<(), DefaultHistory>, history_path: &Option<PathBuf>) {
    if let Some(path) = history_path {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create history directory: {}", e);
            }
        }
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("Failed to save history: {}", e);
        }
    }
}

/// Run the REPL until end of input or `/quit`.
pub fn run(config: ReplConfig, input: Jv) -> Result<()> {
    println!("jqrepl v{}", env!("CARGO_PKG_VERSION"));
    println!("Type /help for commands, /quit to exit.");

    // Read from the terminal even when stdin carries the input document
    let editor_config = Config::builder().behavior(Behavior::PreferTerm).build();
    let mut rl: Editor<(), DefaultHistory> =
        Editor::with_config(editor_config).context("Failed to create editor")?;

    let history_path = config.history_path.clone();
    if let Some(ref path) = history_path {
        if let Err(e) = rl.load_history(path) {
            // Only log if it's not a "file not found" error (expected on first run)
            let is_not_found = matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound);
            if !is_not_found {
                tracing::warn!("Failed to load history: {}", e);
            }
        }
    }

    let mut repl = Repl::with_config(config, input)?;
    println!();

    let result = loop {
        match rl.readline(&repl.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("Failed to add history entry: {}", e);
                    }
                }

                match repl.process_line(&line, &mut io::stdout().lock(), &mut io::stderr().lock()) {
                    Ok(LineOutcome::Continue) => {}
                    Ok(LineOutcome::Exit) => break Ok(()),
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break Ok(());
            }
            Err(err) => break Err(err).context("Line editor failed"),
        }
    };

    save_history(&mut rl, &history_path);
    result
}
