//! A single program run: the caller's end of the three channels.
//!
//! ```text
//!   caller                         engine thread
//!   ──────                         ─────────────
//!   send_input(jv) ──oneshot──▶    compile → await input
//!   next_event()   ◀──outputs──    value, value, ...
//!                  ◀──errors───    error, ...
//!   (None)         ◀─ closed ──    end of output
//! ```
//!
//! Outputs and errors are each delivered in engine order; there is no
//! ordering between the two streams. A run ends when both channels close.

use jqrepl_types::Jv;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::RunError;

/// One item received from a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Output(Jv),
    Error(RunError),
}

/// Everything a run produced, collected.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunOutcome {
    pub outputs: Vec<Jv>,
    pub errors: Vec<RunError>,
}

/// Handle to an in-flight program run.
///
/// Dropping the handle abandons the run: the engine notices on its next
/// send and stops.
pub struct Run {
    input: Option<oneshot::Sender<Jv>>,
    outputs: mpsc::Receiver<Jv>,
    errors: mpsc::Receiver<RunError>,
    outputs_closed: bool,
    errors_closed: bool,
    cancel: CancellationToken,
}

impl Run {
    pub(crate) fn new(
        input: oneshot::Sender<Jv>,
        outputs: mpsc::Receiver<Jv>,
        errors: mpsc::Receiver<RunError>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            input: Some(input),
            outputs,
            errors,
            outputs_closed: false,
            errors_closed: false,
            cancel,
        }
    }

    /// Hand the input value to the engine.
    ///
    /// Never blocks. Returns false if input was already sent or closed, or
    /// the run has already ended (for example after a compile error).
    pub fn send_input(&mut self, input: Jv) -> bool {
        match self.input.take() {
            Some(tx) => tx.send(input).is_ok(),
            None => false,
        }
    }

    /// Give up on sending input. A compiled run then ends without output.
    pub fn close_input(&mut self) {
        self.input.take();
    }

    /// Ask the engine to stop before its next result.
    ///
    /// Keep draining with [`Run::next_event`] until it returns `None`; at
    /// most one more item per channel can arrive.
    pub fn cancel(&mut self) {
        self.close_input();
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A token that cancels this run when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Receive the next output or error, whichever is ready first.
    ///
    /// Returns `None` once both channels have closed.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        loop {
            if self.outputs_closed && self.errors_closed {
                return None;
            }
            tokio::select! {
                output = self.outputs.recv(), if !self.outputs_closed => match output {
                    Some(jv) => return Some(RunEvent::Output(jv)),
                    None => self.outputs_closed = true,
                },
                error = self.errors.recv(), if !self.errors_closed => match error {
                    Some(e) => return Some(RunEvent::Error(e)),
                    None => self.errors_closed = true,
                },
            }
        }
    }

    /// Send `input`, then drain the run to completion.
    pub async fn collect(mut self, input: Jv) -> RunOutcome {
        self.send_input(input);
        let mut outcome = RunOutcome::default();
        while let Some(event) = self.next_event().await {
            match event {
                RunEvent::Output(jv) => outcome.outputs.push(jv),
                RunEvent::Error(e) => outcome.errors.push(e),
            }
        }
        outcome
    }
}
