//! Textual rendering of values.
//!
//! Output is valid JSON for every valid value. `COLOUR` wraps each value in
//! an ANSI SGR prefix and a reset suffix; the layout of escapes matches
//! jq's so terminal output looks the same as `jq -C`.
//!
//! ```text
//!   "test"   →  ESC[0;32m "test" ESC[0m
//!   [1]      →  ESC[1;39m [ ESC[0;39m 1 ESC[0m ESC[1;39m ESC[1;39m ] ESC[0m
//! ```

use std::fmt::Write as _;

use bitflags::bitflags;

use crate::error::{JvError, JvResult};
use crate::value::{Jv, Kind, Node};

bitflags! {
    /// Rendering options for [`Jv::dump`]. The empty set is compact JSON.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PrintFlags: u32 {
        /// One element per line, indented by nesting depth.
        const PRETTY = 1 << 0;
        /// Escape everything outside ASCII as `\uXXXX`.
        const ASCII = 1 << 1;
        /// Wrap values in ANSI colour escapes.
        const COLOUR = 1 << 2;
        /// Emit object keys in sorted order.
        const SORTED = 1 << 3;
        /// Indent with tabs (implies nothing without PRETTY).
        const TAB = 1 << 4;
        /// Indent by one space.
        const SPACE1 = 1 << 5;
        /// Indent by two spaces (the default width).
        const SPACE2 = 1 << 6;
    }
}

impl PrintFlags {
    fn indent_unit(self) -> &'static str {
        if self.contains(PrintFlags::TAB) {
            "\t"
        } else if self.contains(PrintFlags::SPACE1) {
            " "
        } else {
            "  "
        }
    }
}

const ESC: &str = "\x1b[";
const RESET: &str = "\x1b[0m";

/// Maximum length of one SGR sequence in a colour spec.
const MAX_SGR_LEN: usize = 16;

/// Colour escapes per kind, plus the colour for object keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    null: String,
    false_: String,
    true_: String,
    number: String,
    string: String,
    array: String,
    object: String,
    field: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            null: sgr("1;30"),
            false_: sgr("0;39"),
            true_: sgr("0;39"),
            number: sgr("0;39"),
            string: sgr("0;32"),
            array: sgr("1;39"),
            object: sgr("1;39"),
            field: sgr("34;1"),
        }
    }
}

fn sgr(code: &str) -> String {
    format!("{ESC}{code}m")
}

impl Palette {
    /// Parse a `JQ_COLORS`-style spec.
    ///
    /// The spec is a `:`-separated list of SGR sequences in the order
    /// null, false, true, numbers, strings, arrays, objects, object keys.
    /// Omitted trailing fields keep their default colour.
    pub fn parse(spec: &str) -> JvResult<Self> {
        let mut palette = Palette::default();
        let fields = spec.split(':').collect::<Vec<_>>();
        if fields.len() > 8 {
            return Err(JvError::Palette(format!("too many fields in {spec:?}")));
        }

        let slots = [
            &mut palette.null,
            &mut palette.false_,
            &mut palette.true_,
            &mut palette.number,
            &mut palette.string,
            &mut palette.array,
            &mut palette.object,
            &mut palette.field,
        ];
        for (slot, field) in slots.into_iter().zip(fields) {
            if field.len() > MAX_SGR_LEN {
                return Err(JvError::Palette(format!("sequence too long: {field:?}")));
            }
            if !field.chars().all(|c| c.is_ascii_digit() || c == ';') {
                return Err(JvError::Palette(format!("not an SGR sequence: {field:?}")));
            }
            *slot = sgr(field);
        }
        Ok(palette)
    }

    fn for_kind(&self, kind: Kind) -> Option<&str> {
        match kind {
            Kind::Invalid => None,
            Kind::Null => Some(&self.null),
            Kind::False => Some(&self.false_),
            Kind::True => Some(&self.true_),
            Kind::Number => Some(&self.number),
            Kind::String => Some(&self.string),
            Kind::Array => Some(&self.array),
            Kind::Object => Some(&self.object),
        }
    }
}

impl Jv {
    /// Render with the default palette.
    pub fn dump(&self, flags: PrintFlags) -> String {
        self.dump_with(flags, &Palette::default())
    }

    /// Render with an explicit palette (only consulted with `COLOUR`).
    pub fn dump_with(&self, flags: PrintFlags, palette: &Palette) -> String {
        let mut dumper = Dumper {
            flags,
            palette,
            out: String::new(),
        };
        dumper.value(self, 0);
        dumper.out
    }
}

struct Dumper<'a> {
    flags: PrintFlags,
    palette: &'a Palette,
    out: String,
}

impl Dumper<'_> {
    fn pretty(&self) -> bool {
        self.flags.contains(PrintFlags::PRETTY)
    }

    fn newline(&mut self, level: usize) {
        if self.pretty() {
            self.out.push('\n');
            let unit = self.flags.indent_unit();
            for _ in 0..level {
                self.out.push_str(unit);
            }
        }
    }

    fn push_opt(&mut self, s: Option<&str>) {
        if let Some(s) = s {
            self.out.push_str(s);
        }
    }

    fn value(&mut self, jv: &Jv, level: usize) {
        let palette = self.palette;
        let colour = if self.flags.contains(PrintFlags::COLOUR) {
            palette.for_kind(jv.kind())
        } else {
            None
        };
        self.push_opt(colour);

        match jv.node() {
            Node::Invalid(None) => self.out.push_str("<invalid>"),
            Node::Invalid(Some(msg)) => {
                self.out.push_str("<invalid:");
                self.out.push_str(&msg.dump(PrintFlags::empty()));
                self.out.push('>');
            }
            Node::Null => self.out.push_str("null"),
            Node::False => self.out.push_str("false"),
            Node::True => self.out.push_str("true"),
            Node::Number(n) => self.out.push_str(&format_number(*n)),
            Node::String(s) => self.string(s),
            Node::Array(items) if items.is_empty() => self.out.push_str("[]"),
            Node::Array(items) => {
                self.out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.newline(level + 1);
                    self.value(item, level + 1);
                    self.push_opt(colour);
                }
                self.newline(level);
                self.push_opt(colour);
                self.out.push(']');
            }
            Node::Object(map) if map.is_empty() => self.out.push_str("{}"),
            Node::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                if self.flags.contains(PrintFlags::SORTED) {
                    entries.sort_by(|a, b| a.0.cmp(b.0));
                }

                self.out.push('{');
                for (i, (key, value)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        self.out.push(',');
                    }
                    self.newline(level + 1);
                    if colour.is_some() {
                        self.out.push_str(RESET);
                        self.out.push_str(&palette.field);
                    }
                    self.string(key);
                    if colour.is_some() {
                        self.out.push_str(RESET);
                    }
                    self.push_opt(colour);
                    self.out.push(':');
                    if self.pretty() {
                        self.out.push(' ');
                    }
                    if colour.is_some() {
                        self.out.push_str(RESET);
                    }
                    self.value(value, level + 1);
                    self.push_opt(colour);
                }
                self.newline(level);
                self.push_opt(colour);
                self.out.push('}');
            }
        }

        if colour.is_some() {
            self.out.push_str(RESET);
        }
    }

    fn string(&mut self, s: &str) {
        let ascii = self.flags.contains(PrintFlags::ASCII);
        self.out.push('"');
        for c in s.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\t' => self.out.push_str("\\t"),
                '\r' => self.out.push_str("\\r"),
                '\u{8}' => self.out.push_str("\\b"),
                '\u{c}' => self.out.push_str("\\f"),
                c if (c as u32) < 0x20 || c == '\u{7f}' => {
                    let _ = write!(self.out, "\\u{:04x}", c as u32);
                }
                c if ascii && !c.is_ascii() => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        let _ = write!(self.out, "\\u{unit:04x}");
                    }
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

/// Format a number the way jq prints it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "null".to_string();
    }
    if n.is_infinite() {
        let max = "1.7976931348623157e+308";
        return if n > 0.0 { max.to_string() } else { format!("-{max}") };
    }

    let abs = n.abs();
    if n.fract() == 0.0 && abs < 1e17 {
        if n == 0.0 && n.is_sign_negative() {
            return "-0".to_string();
        }
        return format!("{}", n as i64);
    }
    if abs >= 1e17 || abs < 1e-5 {
        let s = format!("{n:e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        };
    }
    format!("{n}")
}
