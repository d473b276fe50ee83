//! Data model for handing a suspected leak from a reference watcher to a heap analyzer.
//!
//! A watcher tags every watched object with a [`ReferenceKey`]. When the object
//! survives a forced GC, the heap is dumped to disk and a [`HeapDump`] is built
//! that binds the snapshot path to that key. The analyzer later searches the
//! snapshot for the keyed reference whose key matches exactly, and computes the
//! retention path of its referent.
//!
//! Everything in this crate is plain, immutable data. Construction is the only
//! fallible operation and it never performs I/O.

mod durations;
mod error;
mod excluded_refs;
mod heap_dump;
mod key;
mod wire;

pub use durations::Durations;
pub use error::InvariantError;
pub use excluded_refs::{ExcludedRefs, Exclusion, ExclusionTarget};
pub use heap_dump::{HeapDump, HeapDumpBuilder};
pub use key::ReferenceKey;
pub use wire::{HANDOFF_FORMAT_VERSION, HeapDumpRecord};
