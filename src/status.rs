/// A point-in-time snapshot of a lock's admission state.
///
/// Returned by [`Lock::status`](crate::Lock::status). The snapshot is taken
/// under the lock's internal synchronization, but it is stale the moment it
/// is returned: another thread may acquire or release right after. It is
/// meant for diagnostics and tests, not for lock-free protocols.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LockStatus {
    /// No reader or writer currently holds the lock.
    ///
    /// [`NoOpLock`](crate::NoOpLock) always reports this: it keeps no
    /// bookkeeping to report anything else.
    Unlocked,
    /// The lock is held exclusively, by a writer or by the single owner of
    /// an [`ExclusiveLock`](crate::ExclusiveLock) region.
    WriteLocked,
    /// The lock is held in read mode; the value counts the outstanding
    /// read holds across all threads, nested holds included.
    ReadLocked(usize),
}
