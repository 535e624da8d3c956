use thiserror::Error;

/// An error caused by misusing a lock's acquire/release protocol.
///
/// Both variants are programming-contract violations: they are never caused
/// by contention or by the environment, they are not retryable, and they
/// must reach the caller instead of being swallowed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum LockError {
    /// A release was called without a matching earlier acquire on the same
    /// lock instance.
    #[error("lock released without a matching acquire")]
    Imbalanced,
    /// A thread attempted to acquire the write side of a read/write lock
    /// while already holding its read side.
    ///
    /// Upgrades are refused instead of letting the caller deadlock against
    /// itself: the write side cannot open until every reader, including the
    /// caller, has released.
    #[error("read locks cannot be upgraded to write locks")]
    UpgradeNotSupported,
}
