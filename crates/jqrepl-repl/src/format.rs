//! Rendering for the REPL: output values, run errors, and the prompt.
//!
//! Values go through [`Jv::dump_with`]; everything else here is the thin
//! layer of ANSI decoration around it.

use jqrepl_kernel::RunError;
use jqrepl_types::{Jv, Palette, PrintFlags};

const RED: &str = "\x1b[0;31m";
const CYAN: &str = "\x1b[0;36m";
const RESET: &str = "\x1b[0m";

/// Render one output value.
pub fn format_output(jv: &Jv, flags: PrintFlags, palette: &Palette) -> String {
    jv.dump_with(flags, palette)
}

/// Render a run error, red when `colour` is set.
pub fn format_error(err: &RunError, colour: bool) -> String {
    if colour {
        format!("{RED}{err}{RESET}")
    } else {
        err.to_string()
    }
}

/// The prompt for program number `counter`, e.g. `  3 » `.
pub fn prompt(counter: usize, colour: bool) -> String {
    if colour {
        format!("{CYAN}{counter:3} »{RESET} ")
    } else {
        format!("{counter:3} » ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_pads_counter() {
        assert_eq!(prompt(1, false), "  1 » ");
        assert_eq!(prompt(1234, false), "1234 » ");
        assert_eq!(prompt(7, true), "\x1b[0;36m  7 »\x1b[0m ");
    }

    #[test]
    fn error_colour() {
        let err = RunError::Evaluation("boom".into());
        assert_eq!(format_error(&err, false), "boom");
        assert_eq!(format_error(&err, true), "\x1b[0;31mboom\x1b[0m");
    }

    #[test]
    fn compile_error_is_prefixed() {
        let err = RunError::Compile("expected term".into());
        assert_eq!(format_error(&err, false), "compile error: expected term");
    }

    #[test]
    fn output_uses_flags() {
        let jv = Jv::from_pairs([("a", Jv::number(1.0))]);
        let palette = Palette::default();
        assert_eq!(format_output(&jv, PrintFlags::empty(), &palette), r#"{"a":1}"#);
        assert_eq!(format_output(&jv, PrintFlags::PRETTY, &palette), "{\n  \"a\": 1\n}");
        assert_eq!(
            format_output(&jv, PrintFlags::PRETTY | PrintFlags::SPACE1, &palette),
            "{\n \"a\": 1\n}"
        );
    }
}
