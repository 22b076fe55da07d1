//! jq engine backed by jaq (pure Rust jq implementation).
//!
//! Programs are parsed and compiled against jaq's standard library and
//! JSON definitions. jaq values are `Rc`-based and never leave the engine
//! thread: inputs are converted from `Jv` on the way in and every result is
//! converted back to `Jv` before it is handed to the session.

use std::ops::ControlFlow;
use std::rc::Rc;

use jaq_core::{compile, load, Ctx, RcIter};
use jaq_json::Val;
use jqrepl_types::{Jv, View};

use crate::engine::{Engine, Next};

/// A compiled jaq filter.
pub type Filter = jaq_core::Filter<jaq_core::Native<Val>>;

/// Native jq engine using jaq.
#[derive(Debug, Default)]
pub struct JaqEngine;

impl JaqEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for JaqEngine {
    type Program = Filter;

    fn compile(&mut self, text: &str) -> Result<Filter, String> {
        compile_filter(text)
    }

    fn execute(
        &self,
        program: &Filter,
        input: Jv,
        emit: &mut dyn FnMut(Next) -> ControlFlow<()>,
    ) {
        // `input`/`inputs` read from an empty stream
        let inputs: RcIter<_> = RcIter::new(Box::new(core::iter::empty()));
        let ctx = Ctx::new(Vec::new(), &inputs);

        for result in program.run((ctx, jv_to_val(&input))) {
            match result {
                Ok(val) => {
                    if emit(Next::Value(val_to_jv(&val))).is_break() {
                        return;
                    }
                }
                Err(e) => {
                    // jaq filters such as `error/1` keep yielding after an
                    // error and expect the consumer to stop there
                    let message = val_to_jv(&e.into_val());
                    let _ = emit(Next::Invalid(Jv::invalid_with_message(message)));
                    return;
                }
            }
        }
    }
}

/// Byte offset of `part` within `code`, when `part` borrows from it.
fn offset_in(code: &str, part: &str) -> Option<usize> {
    let offset = part.as_ptr().addr().checked_sub(code.as_ptr().addr())?;
    (offset <= code.len()).then_some(offset)
}

fn expected_at(code: &str, expected: &str, found: &str) -> String {
    match offset_in(code, found) {
        Some(offset) if offset < code.len() => format!("expected {expected} at position {}", offset + 1),
        _ => format!("expected {expected} at end of input"),
    }
}

/// Parse and compile a jq filter expression.
///
/// Syntax errors carry the 1-based position of the offending token.
pub fn compile_filter(code: &str) -> Result<Filter, String> {
    let arena = load::Arena::default();
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));

    let modules = loader.load(&arena, load::File { path: (), code }).map_err(|errs| {
        let mut msgs = Vec::new();
        for (_, e) in errs {
            match e {
                load::Error::Io(io_errs) => msgs.extend(io_errs.into_iter().map(|(_, msg)| msg)),
                load::Error::Lex(lex_errs) => msgs.extend(
                    lex_errs
                        .into_iter()
                        .map(|(expected, found)| expected_at(code, expected.as_str(), found)),
                ),
                load::Error::Parse(parse_errs) => msgs.extend(
                    parse_errs
                        .into_iter()
                        .map(|(expected, found)| expected_at(code, expected.as_str(), found)),
                ),
            }
        }
        format!("syntax error: {}", msgs.join(", "))
    })?;

    let compiler = compile::Compiler::default().with_funs(jaq_std::funs().chain(jaq_json::funs()));
    compiler.compile(modules).map_err(|errs| {
        errs.into_iter()
            .flat_map(|(_, undefined)| undefined)
            .map(|(name, kind)| format!("undefined {} {}", kind.as_str(), name))
            .collect::<Vec<_>>()
            .join(", ")
    })
}

/// Largest integer magnitude passed to jaq as an exact integer.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Convert a `Jv` into a jaq value.
///
/// Invalid values have no jaq counterpart and become `null`.
pub fn jv_to_val(jv: &Jv) -> Val {
    match jv.view() {
        View::Invalid(_) | View::Null => Val::Null,
        View::Bool(b) => Val::Bool(b),
        View::Number(n) => {
            if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT {
                Val::Int(n as isize)
            } else {
                Val::Float(n)
            }
        }
        View::String(s) => Val::Str(Rc::new(s.to_string())),
        View::Array(items) => Val::Arr(Rc::new(items.iter().map(jv_to_val).collect())),
        View::Object(map) => {
            Val::obj(map.iter().map(|(k, v)| (Rc::new(k.clone()), jv_to_val(v))).collect())
        }
    }
}

/// Convert a jaq value into a `Jv`.
pub fn val_to_jv(val: &Val) -> Jv {
    match val {
        Val::Null => Jv::null(),
        Val::Bool(b) => Jv::from_bool(*b),
        Val::Int(n) => Jv::number(*n as f64),
        Val::Float(f) => Jv::number(*f),
        Val::Num(s) => Jv::number(s.parse::<f64>().unwrap_or(f64::NAN)),
        Val::Str(s) => Jv::string(s.to_string()),
        Val::Arr(arr) => arr.iter().map(val_to_jv).collect(),
        Val::Obj(obj) => Jv::from_pairs(obj.iter().map(|(k, v)| (k.to_string(), val_to_jv(v)))),
    }
}
