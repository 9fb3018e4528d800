//! Slice acquisition (§4.4): turns an abstract [`SliceHandle`] into an open
//! [`Dataset`], optionally polling for availability and guaranteeing a
//! user-provided source's `close` runs on every control-flow exit.
//!
//! Grounded on `wral::wral::Wal::load`'s scan-and-open idiom for path-based
//! resolution, and `util::thread::Thread`'s `Drop`-guaranteed cleanup for
//! the scoped-lifetime user-source variant.

mod acquire;
pub mod dataset;
mod persist;

use std::collections::HashMap;

pub use acquire::{acquire, read_dataset, Acquired, SliceSource};
pub use dataset::{Dataset, Variable};
pub use persist::persist_to_temp;

/// One entry from the slice provider: a path, an already-open in-memory
/// dataset, or a user-supplied source with scoped open/close semantics.
pub enum SliceHandle {
    Path {
        uri: String,
        storage_options: HashMap<String, String>,
    },
    Memory(Dataset),
    Source(Box<dyn SliceSource>),
}

impl SliceHandle {
    pub fn path(uri: impl Into<String>) -> SliceHandle {
        SliceHandle::Path {
            uri: uri.into(),
            storage_options: HashMap::new(),
        }
    }
}
