//! Value handle for jqrepl: the `Jv` type, its kinds, and rendering.
//!
//! This crate is a leaf dependency with no async runtime and no engine.
//! Values are shared-ownership handles: clone to share, drop to release.

pub mod dump;
pub mod error;
pub mod value;

pub use dump::{format_number, Palette, PrintFlags};
pub use error::{JvError, JvResult};
pub use value::{Jv, Kind, View};
