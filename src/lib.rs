//! config-history: record every state change of watched objects as a git
//! commit.
//!
//! The `config-history` binary wires a watch event stream into a
//! [`HistoryStore`]. This crate exposes the pipeline pieces so they can be
//! embedded or tested on their own.

pub mod commit;
pub mod config;
pub mod error;
pub mod object;
pub mod ref_index;
pub mod snapshot;
pub mod store;
pub mod telemetry;
pub mod watch;
pub mod worktree;

pub use config::HistoryConfig;
pub use object::TrackedObject;
pub use store::{EventHandler, HistoryEntry, HistoryStore, Outcome, Stage};
