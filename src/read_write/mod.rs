//! Many-reader/single-writer locking: the admission coordinator, the
//! mode-aware lock built on it, and the scheduled-write worker.

pub use coordinator::*;
pub use lock::*;

pub(crate) use dispatcher::WriteDispatcher;

pub mod coordinator;
pub mod lock;

mod dispatcher;
