//! The engine session: a dedicated thread that owns the engine.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  Request{program, channels}  ┌───────────────────────────┐
//! │  Session   │ ───────────────────────────▶ │  engine thread            │
//! │  start()   │      (unbounded queue)       │  ┌─────────┐ ┌─────────┐  │
//! │  close()   │                              │  │ Engine  │ │ compile │  │
//! └────────────┘                              │  │         │ │  cache  │  │
//!       │ Run                                 │  └─────────┘ └─────────┘  │
//!       ▼                                     └───────────────────────────┘
//!  input ─▶ / outputs ◀─ / errors ◀─               one run at a time
//! ```
//!
//! Engine state never crosses threads: the engine is built on the engine
//! thread by a `Send` factory, and only `Jv` handles travel over the
//! channels. Runs queue behind each other, so concurrent `start` calls are
//! safe but serialised.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::thread::JoinHandle;

use jqrepl_types::Jv;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::engine::{Engine, Next};
use crate::error::{RunError, SessionError};
use crate::jaq::JaqEngine;
use crate::run::Run;

/// Work item for the engine thread.
struct Request {
    program: String,
    input: oneshot::Receiver<Jv>,
    outputs: mpsc::Sender<Jv>,
    errors: mpsc::Sender<RunError>,
    cancel: CancellationToken,
}

/// An open engine session.
///
/// Closing (or dropping) the session waits for the engine thread to finish
/// every queued run. Finish or drop outstanding [`Run`] handles first: a
/// run still waiting for its input keeps the thread alive.
pub struct Session {
    name: String,
    channel_capacity: usize,
    requests: Option<mpsc::UnboundedSender<Request>>,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    /// Open a session backed by jaq.
    pub fn open(config: SessionConfig) -> Result<Self, SessionError> {
        Self::with_engine(config, JaqEngine::new)
    }

    /// Open a session over any engine. `factory` runs on the engine thread.
    pub fn with_engine<E, F>(config: SessionConfig, factory: F) -> Result<Self, SessionError>
    where
        E: Engine + 'static,
        F: FnOnce() -> E + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let cache_capacity = config.cache_capacity;
        let thread_name = format!("jqrepl-engine-{}", config.name);

        let worker = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || Worker::new(factory(), cache_capacity).serve(rx))?;

        debug!(session = %config.name, "engine session opened");
        Ok(Self {
            name: config.name,
            channel_capacity: config.channel_capacity.max(1),
            requests: Some(tx),
            worker: Some(worker),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start running `program`.
    ///
    /// Compilation happens on the engine thread; a compile failure arrives
    /// as a single [`RunError::Compile`] on the run's error channel.
    pub fn start(&self, program: &str) -> Run {
        let (input_tx, input_rx) = oneshot::channel();
        let (outputs_tx, outputs_rx) = mpsc::channel(self.channel_capacity);
        let (errors_tx, errors_rx) = mpsc::channel(self.channel_capacity);
        let cancel = CancellationToken::new();

        let request = Request {
            program: program.to_string(),
            input: input_rx,
            outputs: outputs_tx,
            errors: errors_tx,
            cancel: cancel.clone(),
        };

        let rejected = match &self.requests {
            Some(tx) => tx.send(request).err().map(|e| e.0),
            None => Some(request),
        };
        if let Some(request) = rejected {
            warn!(session = %self.name, "start on a closed session");
            let _ = request.errors.try_send(RunError::SessionClosed);
        }

        Run::new(input_tx, outputs_rx, errors_rx, cancel)
    }

    /// Close the session, waiting for queued runs to finish.
    pub fn close(mut self) -> Result<(), SessionError> {
        self.shutdown()
    }

    /// Close the session without waiting for the engine thread.
    ///
    /// For an engine stuck in a step that never yields: the thread is
    /// detached and exits once its current run returns.
    pub fn abandon(mut self) {
        self.requests.take();
        if self.worker.take().is_some() {
            warn!(session = %self.name, "abandoning busy engine thread");
        }
    }

    fn shutdown(&mut self) -> Result<(), SessionError> {
        // Dropping the sender ends the engine loop once the queue drains
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            worker.join().map_err(|_| SessionError::Panicked)?;
            debug!(session = %self.name, "engine session closed");
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(session = %self.name, "error closing session: {}", e);
        }
    }
}

/// Compiled programs keyed by source text, oldest evicted first.
struct ProgramCache<P> {
    capacity: usize,
    entries: VecDeque<(String, Rc<P>)>,
}

impl<P> ProgramCache<P> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    fn get(&mut self, text: &str) -> Option<Rc<P>> {
        let pos = self.entries.iter().position(|(k, _)| k == text)?;
        // Most recently used entries live at the back
        let entry = self.entries.remove(pos)?;
        let program = entry.1.clone();
        self.entries.push_back(entry);
        Some(program)
    }

    fn insert(&mut self, text: String, program: Rc<P>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((text, program));
    }
}

struct Worker<E: Engine> {
    engine: E,
    cache: ProgramCache<E::Program>,
}

impl<E: Engine> Worker<E> {
    fn new(engine: E, cache_capacity: usize) -> Self {
        Self {
            engine,
            cache: ProgramCache::new(cache_capacity),
        }
    }

    fn serve(mut self, mut requests: mpsc::UnboundedReceiver<Request>) {
        while let Some(request) = requests.blocking_recv() {
            self.run(request);
        }
    }

    fn compile(&mut self, text: &str) -> Result<Rc<E::Program>, String> {
        if let Some(program) = self.cache.get(text) {
            debug!(program = text, "compile cache hit");
            return Ok(program);
        }
        let program = Rc::new(self.engine.compile(text)?);
        debug!(program = text, "compiled");
        self.cache.insert(text.to_string(), program.clone());
        Ok(program)
    }

    fn run(&mut self, request: Request) {
        let Request { program, input, outputs, errors, cancel } = request;

        let compiled = match self.compile(&program) {
            Ok(compiled) => compiled,
            Err(msg) => {
                debug!(program = %program, error = %msg, "compile failed");
                drop(input);
                let _ = errors.blocking_send(RunError::Compile(msg));
                return;
            }
        };

        let input = match input.blocking_recv() {
            Ok(input) => input,
            Err(_) => {
                debug!(program = %program, "input closed before a value was sent");
                return;
            }
        };

        let mut produced = 0usize;
        let mut failed = 0usize;
        self.engine.execute(&compiled, input, &mut |next| {
            if cancel.is_cancelled() {
                return ControlFlow::Break(());
            }
            let delivered = match next {
                Next::Value(jv) => {
                    produced += 1;
                    outputs.blocking_send(jv).is_ok()
                }
                Next::Invalid(jv) => {
                    failed += 1;
                    errors.blocking_send(RunError::from_invalid(&jv)).is_ok()
                }
            };
            if delivered {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        });

        debug!(
            program = %program,
            outputs = produced,
            errors = failed,
            cancelled = cancel.is_cancelled(),
            "run finished"
        );
        // Dropping the senders closes both channels
    }
}
