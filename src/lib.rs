//! Selectable locking mechanisms behind one uniform contract.
//!
//! Components that need "some lock around this resource" rarely want to
//! hard-code how the locking works: state confined to one thread wants no
//! locking at all, rarely-contended state wants one re-entrant exclusive
//! region, and read-mostly state wants many concurrent readers with writes
//! committed inline or handed off to a worker thread. This crate lets that
//! choice live in configuration: pick a [`LockKind`], call
//! [`LockKind::create_lock`], and use the result through the one [`Lock`]
//! contract — the call sites never change.
//!
//! The mechanisms:
//!
//! * [`NoOpLock`] — no synchronization; every operation succeeds at once.
//! * [`ExclusiveLock`] — one re-entrant exclusive region; reads and writes
//!   exclude each other alike.
//! * [`ReadWriteLock`], over a [`ReadWriteCoordinator`] — many concurrent
//!   readers, writers served in arrival order and preferred over new
//!   readers, with blocking or scheduled write commits ([`WriteMode`]).
//!
//! Locks here coordinate timing only — they never own the protected data —
//! so every acquire must be paired with exactly one release. The guards and
//! closure helpers do that pairing on every exit path; the raw operations
//! exist for protocols guards cannot express, such as releasing a write
//! hold on another thread.
//!
//! # Example
//!
//! ```rust
//! use lockkit::{Lock, LockKind};
//!
//! # fn main() -> Result<(), lockkit::LockError> {
//! // usually this value comes from the host's configuration
//! let lock = LockKind::ReadSyncWrite.create_lock();
//!
//! let read = lock.read()?;
//! // ... look at the protected resource ...
//! read.unlock();
//!
//! lock.write_with(|| {
//!     // ... mutate the protected resource, alone ...
//! })?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod exclusive;
pub mod kind;
pub mod lock;
pub mod no_op;
pub mod read_write;
pub mod status;

mod bug_message;

pub use error::*;
pub use exclusive::*;
pub use kind::*;
pub use lock::*;
pub use no_op::*;
pub use read_write::*;
pub use status::*;

pub(crate) use bug_message::BUG_MESSAGE;

#[cfg(test)]
mod test_util;
