use crate::{
    ExclusiveLock, Lock, LockError, LockStatus, NoOpLock, ReadWriteLock, WriteBody, WriteMode,
};

/// Selects, at configuration time, which locking mechanism a component
/// gets, without changing how the lock is used afterwards.
///
/// The four kinds map onto three mechanisms:
///
/// * [`LockKind::None`] — [`NoOpLock`], no synchronization at all;
/// * [`LockKind::Exclusive`] — [`ExclusiveLock`], one re-entrant region;
/// * [`LockKind::ReadAsyncWrite`] — [`ReadWriteLock`] committing writes in
///   [`WriteMode::Scheduled`];
/// * [`LockKind::ReadSyncWrite`] — [`ReadWriteLock`] committing writes in
///   [`WriteMode::Blocking`].
///
/// With the `serde` feature enabled, `LockKind` (de)serializes as a
/// snake_case string (`"none"`, `"exclusive"`, `"read_async_write"`,
/// `"read_sync_write"`), so host applications can carry the choice in
/// their configuration files.
///
/// # Example
///
/// ```rust
/// use lockkit::{Lock, LockKind};
///
/// let lock = LockKind::Exclusive.create_lock();
/// lock.write_with(|| {
///     // ... mutate the protected resource, alone ...
/// }).unwrap();
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LockKind {
    /// No locking: the caller guarantees exclusivity by other means.
    None,
    /// One re-entrant exclusive region; reads exclude reads.
    Exclusive,
    /// Concurrent readers; writes are committed on a worker thread and
    /// [`write_apply`](Lock::write_apply) never blocks the caller.
    ReadAsyncWrite,
    /// Concurrent readers; writes are committed inline and
    /// [`write_apply`](Lock::write_apply) returns once the write is done.
    ReadSyncWrite,
}

impl LockKind {
    /// Every selectable kind, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::None,
        Self::Exclusive,
        Self::ReadAsyncWrite,
        Self::ReadSyncWrite,
    ];

    /// Builds a fresh, independent lock of this kind.
    ///
    /// Nothing is cached or shared: two calls return two locks that do not
    /// exclude each other. Components that must contend on one lock share
    /// the one instance themselves, usually behind an
    /// [`Arc`](std::sync::Arc).
    #[must_use]
    pub fn create_lock(self) -> AnyLock {
        match self {
            Self::None => AnyLock::NoOp(NoOpLock::new()),
            Self::Exclusive => AnyLock::Exclusive(ExclusiveLock::new()),
            Self::ReadAsyncWrite => AnyLock::ReadWrite(ReadWriteLock::new(WriteMode::Scheduled)),
            Self::ReadSyncWrite => AnyLock::ReadWrite(ReadWriteLock::new(WriteMode::Blocking)),
        }
    }
}

/// A lock of any selectable kind.
///
/// The closed set of mechanisms [`LockKind::create_lock`] can produce. The
/// whole [`Lock`] contract dispatches to the wrapped mechanism, including
/// scheduled write commits, which survive the wrapping.
pub enum AnyLock {
    /// See [`NoOpLock`].
    NoOp(NoOpLock),
    /// See [`ExclusiveLock`].
    Exclusive(ExclusiveLock),
    /// See [`ReadWriteLock`].
    ReadWrite(ReadWriteLock),
}

impl Lock for AnyLock {
    #[inline]
    fn acquire_read(&self) -> Result<(), LockError> {
        match self {
            Self::NoOp(lock) => lock.acquire_read(),
            Self::Exclusive(lock) => lock.acquire_read(),
            Self::ReadWrite(lock) => lock.acquire_read(),
        }
    }

    #[inline]
    fn release_read(&self) -> Result<(), LockError> {
        match self {
            Self::NoOp(lock) => lock.release_read(),
            Self::Exclusive(lock) => lock.release_read(),
            Self::ReadWrite(lock) => lock.release_read(),
        }
    }

    #[inline]
    fn acquire_write(&self) -> Result<(), LockError> {
        match self {
            Self::NoOp(lock) => lock.acquire_write(),
            Self::Exclusive(lock) => lock.acquire_write(),
            Self::ReadWrite(lock) => lock.acquire_write(),
        }
    }

    #[inline]
    fn release_write(&self) -> Result<(), LockError> {
        match self {
            Self::NoOp(lock) => lock.release_write(),
            Self::Exclusive(lock) => lock.release_write(),
            Self::ReadWrite(lock) => lock.release_write(),
        }
    }

    #[inline]
    fn status(&self) -> LockStatus {
        match self {
            Self::NoOp(lock) => lock.status(),
            Self::Exclusive(lock) => lock.status(),
            Self::ReadWrite(lock) => lock.status(),
        }
    }

    fn write_apply(&self, body: WriteBody) -> Result<(), LockError> {
        match self {
            Self::NoOp(lock) => lock.write_apply(body),
            Self::Exclusive(lock) => lock.write_apply(body),
            Self::ReadWrite(lock) => lock.write_apply(body),
        }
    }
}
