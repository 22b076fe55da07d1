//! The evaluation engine seam.
//!
//! An engine compiles program text and runs a compiled program over one
//! input value, pushing each result to a callback. The callback's
//! `ControlFlow` lets the caller stop evaluation early; returning from
//! `execute` means the engine has no more output.
//!
//! Engines live on the session's engine thread and are never shared, so
//! they do not need to be `Send` or `Sync`.

use std::ops::ControlFlow;

use jqrepl_types::Jv;

/// One result pulled from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Next {
    /// A produced value.
    Value(Jv),
    /// An error, carried as an invalid value with an optional message.
    Invalid(Jv),
}

/// A filter-language engine.
pub trait Engine {
    /// A compiled program.
    type Program;

    /// Compile program text. The error is a human-readable message.
    fn compile(&mut self, text: &str) -> Result<Self::Program, String>;

    /// Run `program` over `input`, calling `emit` for every result in order.
    ///
    /// Stops as soon as `emit` returns `ControlFlow::Break`.
    fn execute(
        &self,
        program: &Self::Program,
        input: Jv,
        emit: &mut dyn FnMut(Next) -> ControlFlow<()>,
    );
}
