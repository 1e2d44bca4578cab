//! Hamro Ward session state.
//!
//! - [`SessionStore`]: the single source of truth for "am I logged in, and
//!   as whom", persisted through a [`KeyValueStore`] and broadcast to
//!   synchronous observers and async [`watch`](SessionStore::watch) receivers.
//! - [`storage`]: durable key-value backends (in-memory and file).
//! - [`guard`]: navigation gating for admin-only pages.

pub mod guard;
pub mod storage;
pub mod store;

pub use guard::{AccessLevel, GuardDecision, RouteGuard, RouteKind};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{SessionError, SessionPatch, SessionState, SessionStore, Subscription};
