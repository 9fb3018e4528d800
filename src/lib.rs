//! `cubeward` incrementally builds and extends a chunked, multi-dimensional
//! array store (a *cube*) by concatenating successively supplied *slice*
//! datasets along one distinguished append dimension.
//!
//! Every append is a crash-safe transaction: either the slice is fully
//! integrated and the cube's metadata stays consistent, or the cube is left
//! exactly as it was before the attempt. A filesystem lock co-located with
//! the cube excludes concurrent writers.
//!
//! The library's entry point is [`process`]; [`Processor`] is the type it
//! delegates to and can be driven directly by callers that want more control
//! over slice iteration.

#[macro_use]
mod error;

pub mod config;
pub mod fsys;
pub mod lock;
pub mod metadata;
pub mod slice;
pub mod store;
pub mod txn;

mod append;
mod cancel;
mod processor;

pub use crate::cancel::CancellationToken;
pub use crate::config::Config;
pub use crate::error::{Error, Kind, Result};
pub use crate::processor::{process, Outcome, Processor};
pub use crate::slice::SliceHandle;

/// Crate version, re-exported for `--version` and for attaching to cube
/// attributes written during CREATE transactions.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
