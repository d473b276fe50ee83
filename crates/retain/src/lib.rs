//! Hands suspected-leak heap dumps from a reference watcher to whatever analyzes them.
//!
//! The watcher builds one [`HeapDump`] per object that survived a forced GC and
//! passes it to a [`Listener`]. What happens next is up to the listener:
//!
//! | Listener | Effect |
//! |----------|--------|
//! | [`NONE`] | Drops the descriptor. Use when analysis is disabled. |
//! | [`HandoffListener`] | Writes a `.handoff.json` next to the snapshot for an out-of-process analyzer. |
//! | [`ChannelListener`] | Forwards to a background tokio task (see [`spawn_worker`]). |
//! | [`RecordingListener`] | Keeps every descriptor in memory, for tests. |
//! | [`FnListener`] | Wraps a closure (see [`from_fn`]). |
//!
//! Invocation is fire and forget: `analyze` returns nothing and never fails.
//! Listeners report their own problems through `tracing`.
//!
//! # Configuration
//!
//! [`AnalysisConfig::from_env`] picks a listener from the environment:
//!
//! ```text
//! RETAIN_ANALYSIS=handoff RETAIN_HANDOFF_DIR=/data/leaks ./your-binary
//! ```

mod channel;
mod config;
mod handoff;
mod listener;
mod noop;
mod recording;

pub use channel::{ChannelListener, spawn_worker};
pub use config::{AnalysisConfig, AnalysisMode, ConfigError, HANDOFF_DIR_ENV, MODE_ENV};
pub use handoff::{HANDOFF_SUFFIX, HandoffError, HandoffListener, handoff_path_for, read_handoff, write_handoff};
pub use listener::{FnListener, Listener, from_fn};
pub use noop::{NONE, NoopListener};
pub use recording::RecordingListener;

pub use retain_types::*;
