//! Game synchronization over the peer link.
//!
//! Provides:
//! - `SyncActor` (via [`spawn`]) - single owner of the `GameSession`
//! - `SyncHandle` - cloneable command side
//! - `SyncEvents` - one-shot notifications for the UI
//! - Two-phase reset and rematch handshakes with timeouts
//! - Delayed computer moves in single-player mode

pub mod actor;
pub mod command;
pub mod config;
pub mod event;

pub use actor::{CONNECTING_PLACEHOLDER, SyncError, SyncEvents, SyncHandle, spawn, spawn_with_rng};
pub use command::Command;
pub use config::SyncConfig;
pub use event::SyncEvent;
