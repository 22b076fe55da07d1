//! Integration tests for the jqrepl REPL.
//!
//! These tests feed lines through a REPL and check what lands on the
//! output and error streams.

use std::io::Write as _;

use jqrepl_repl::{LineOutcome, Repl, ReplConfig};
use jqrepl_types::{Jv, PrintFlags};
use rstest::rstest;

/// Output and error text from a batch of lines.
struct Transcript {
    out: String,
    err: String,
    exited: bool,
}

/// Run lines through a fresh REPL over `input`.
fn run_lines(config: ReplConfig, input: &str, lines: &[&str]) -> (Repl, Transcript) {
    let input = Jv::parse(input).expect("valid json");
    let mut repl = Repl::with_config(config, input).expect("Failed to create REPL");
    let mut out = Vec::new();
    let mut err = Vec::new();
    let mut exited = false;

    for line in lines {
        match repl.process_line(line, &mut out, &mut err).expect("line processed") {
            LineOutcome::Continue => {}
            LineOutcome::Exit => {
                exited = true;
                break;
            }
        }
    }

    let transcript = Transcript {
        out: String::from_utf8(out).expect("utf-8 output"),
        err: String::from_utf8(err).expect("utf-8 errors"),
        exited,
    };
    (repl, transcript)
}

fn compact() -> ReplConfig {
    ReplConfig::default().with_flags(PrintFlags::empty())
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn test_outputs_stream_one_per_line() {
    let (_, t) = run_lines(compact(), "[1,2,3]", &[".[]"]);
    assert_eq!(t.out, "1\n2\n3\n");
    assert_eq!(t.err, "");
}

#[test]
fn test_pretty_output_by_default() {
    let (_, t) = run_lines(ReplConfig::default(), r#"{"a":[1]}"#, &["."]);
    assert_eq!(t.out, "{\n \"a\": [\n  1\n ]\n}\n");
}

#[rstest]
#[case(". / 2", "4", "2\n")]
#[case(".name", r#"{"name":"jq"}"#, "\"jq\"\n")]
#[case("[.[] | select(. > 1)]", "[1,2,3]", "[2,3]\n")]
#[case("to_entries | map(.key)", r#"{"b":1,"a":2}"#, "[\"b\",\"a\"]\n")]
#[case("1e1000", "null", "1.7976931348623157e+308\n")]
fn test_program_output(#[case] program: &str, #[case] input: &str, #[case] expected: &str) {
    let (_, t) = run_lines(compact(), input, &[program]);
    assert_eq!(t.out, expected);
    assert_eq!(t.err, "");
}

#[test]
fn test_compile_error_goes_to_err() {
    let (repl, t) = run_lines(compact(), "null", &[".[[["]);
    assert_eq!(t.out, "");
    assert!(t.err.starts_with("compile error:"), "got: {}", t.err);
    assert_eq!(t.err.lines().count(), 1);
    // A failed program still uses a number
    assert_eq!(repl.counter(), 2);
}

#[test]
fn test_runtime_error_is_red_with_colour() {
    let config = ReplConfig::default().with_flags(PrintFlags::COLOUR);
    let (_, t) = run_lines(config, "null", &[r#"error("boom")"#]);
    assert_eq!(t.err, "\x1b[0;31mboom\x1b[0m\n");
    assert_eq!(t.out, "");
}

#[test]
fn test_coloured_string_output() {
    let config = ReplConfig::default().with_flags(PrintFlags::COLOUR);
    let (_, t) = run_lines(config, r#""test""#, &["."]);
    assert_eq!(t.out, "\x1b[0;32m\"test\"\x1b[0m\n");
}

#[test]
fn test_input_survives_runs() {
    let (repl, t) = run_lines(compact(), r#"{"n":1}"#, &[".n", ".n + 1", "."]);
    assert_eq!(t.out, "1\n2\n{\"n\":1}\n");
    assert_eq!(repl.input().share_count(), 1);
}

#[test]
fn test_run_program_counts() {
    let mut repl = Repl::new(Jv::parse("[1,2]").expect("valid json")).expect("repl");
    let mut out = Vec::new();
    let mut err = Vec::new();
    let stats = repl
        .run_program(r#".[], error("x")"#, &mut out, &mut err)
        .expect("run completes");

    assert_eq!(String::from_utf8(out).expect("utf-8"), "1\n2\n");
    assert_eq!(String::from_utf8(err).expect("utf-8"), "x\n");
    assert_eq!(stats.outputs, 2);
    assert_eq!(stats.errors, 1);
    assert!(!stats.cancelled);
}

// ============================================================================
// Counter and prompt
// ============================================================================

#[test]
fn test_empty_lines_do_not_count() {
    let (repl, _) = run_lines(compact(), "null", &["", "   ", "."]);
    assert_eq!(repl.counter(), 2);
    assert_eq!(repl.prompt(), "  2 » ");
}

#[test]
fn test_meta_commands_do_not_count() {
    let (repl, _) = run_lines(compact(), "null", &["/help", "/input"]);
    assert_eq!(repl.counter(), 1);
}

// ============================================================================
// Meta-commands
// ============================================================================

#[rstest]
#[case("/quit")]
#[case("/q")]
#[case("/exit")]
fn test_quit_exits(#[case] line: &str) {
    let (_, t) = run_lines(compact(), "null", &[line, ".[]"]);
    assert!(t.exited);
    assert_eq!(t.err, "");
}

#[test]
fn test_help_lists_commands() {
    let (_, t) = run_lines(compact(), "null", &["/help"]);
    for cmd in ["/quit", "/input", "/set", "/load", "/compact"] {
        assert!(t.out.contains(cmd), "help is missing {cmd}");
    }
}

#[test]
fn test_set_replaces_input() {
    let (repl, t) = run_lines(compact(), "null", &[r#"/set {"x": 5}"#, ".x"]);
    assert!(t.out.ends_with("5\n"), "got: {}", t.out);
    assert_eq!(repl.input().get("x").expect("object"), Some(Jv::number(5.0)));
}

#[test]
fn test_set_rejects_bad_json() {
    let (repl, t) = run_lines(compact(), "7", &["/set {oops"]);
    assert!(t.out.contains("Invalid JSON"));
    assert_eq!(repl.input(), &Jv::number(7.0));
}

#[test]
fn test_load_reads_file() {
    let path = std::env::temp_dir().join(format!("jqrepl-load-{}.json", std::process::id()));
    let mut file = std::fs::File::create(&path).expect("create temp file");
    writeln!(file, r#"{{"loaded": true}}"#).expect("write temp file");
    drop(file);

    let load = format!("/load {}", path.display());
    let (_, t) = run_lines(compact(), "null", &[load.as_str(), ".loaded"]);
    let _ = std::fs::remove_file(&path);

    assert!(t.out.ends_with("true\n"), "got: {}", t.out);
}

#[test]
fn test_load_missing_file_keeps_input() {
    let (repl, t) = run_lines(compact(), "1", &["/load /no/such/file.json"]);
    assert!(t.out.contains("/no/such/file.json"));
    assert_eq!(repl.input(), &Jv::number(1.0));
}

#[test]
fn test_compact_toggles() {
    let (_, t) = run_lines(ReplConfig::default(), "[1]", &["/compact", ".", "/compact", "."]);
    assert!(t.out.contains("Compact output: ON\n[1]\n"));
    assert!(t.out.contains("Compact output: OFF\n[\n 1\n]\n"));
}

#[test]
fn test_unknown_command_hints() {
    let (_, t) = run_lines(compact(), "null", &["/frobnicate"]);
    assert!(t.out.contains("Unknown command: /frobnicate"));
    assert!(t.out.contains("/help"));
}
