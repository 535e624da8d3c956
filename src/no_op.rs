use crate::{Lock, LockError, LockStatus};

/// A [`Lock`] that performs no synchronization at all.
///
/// Every operation returns immediately and succeeds, no bookkeeping is
/// kept — even a release with no matching acquire succeeds — and no call
/// ever blocks another thread. It satisfies the locking contract for
/// callers that already guarantee exclusivity by other means, such as state
/// confined to a single thread, and do not want to pay for coordination
/// they do not need.
///
/// By selecting this lock the caller takes over responsibility for thread
/// safety: two threads "inside" a `NoOpLock` really do run concurrently.
///
/// # Example
///
/// ```rust
/// use lockkit::{Lock, LockStatus, NoOpLock};
///
/// let lock = NoOpLock::new();
/// lock.acquire_write().unwrap();
/// // no exclusion is in effect and none is recorded
/// assert_eq!(lock.status(), LockStatus::Unlocked);
/// lock.release_write().unwrap();
/// ```
pub struct NoOpLock;

impl NoOpLock {
    /// Creates a new `NoOpLock`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for NoOpLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock for NoOpLock {
    #[inline(always)]
    fn acquire_read(&self) -> Result<(), LockError> {
        Ok(())
    }

    #[inline(always)]
    fn release_read(&self) -> Result<(), LockError> {
        Ok(())
    }

    #[inline(always)]
    fn acquire_write(&self) -> Result<(), LockError> {
        Ok(())
    }

    #[inline(always)]
    fn release_write(&self) -> Result<(), LockError> {
        Ok(())
    }

    #[inline(always)]
    fn status(&self) -> LockStatus {
        LockStatus::Unlocked
    }
}
