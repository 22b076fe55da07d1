//! jqrepl-kernel: the evaluation bridge.
//!
//! This crate provides:
//!
//! - **Engine**: the seam between the bridge and a filter-language engine
//! - **Jaq**: the default engine, built on jaq
//! - **Session**: an engine thread that serialises runs and caches programs
//! - **Run**: the caller's end of one run (input, outputs, errors)
//!
//! ```no_run
//! # async fn demo() -> Result<(), jqrepl_kernel::SessionError> {
//! use jqrepl_kernel::{Session, SessionConfig};
//! use jqrepl_types::Jv;
//!
//! let session = Session::open(SessionConfig::default())?;
//! let outcome = session.start(".[]").collect(Jv::parse("[1,2,3]").unwrap_or_default()).await;
//! assert_eq!(outcome.outputs.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod jaq;
pub mod run;
pub mod session;

pub use config::{SessionConfig, DEFAULT_CACHE_CAPACITY};
pub use engine::{Engine, Next};
pub use error::{RunError, SessionError, INTERNAL_ERROR};
pub use jaq::JaqEngine;
pub use run::{Run, RunEvent, RunOutcome};
pub use session::Session;
