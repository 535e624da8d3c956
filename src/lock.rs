//! The uniform locking contract shared by every mechanism in this crate and
//! the RAII guards layered on top of it.

use std::marker::PhantomData;

use crate::{LockError, LockStatus};

/// A write operation handed to [`Lock::write_apply`].
///
/// The body is boxed so that scheduled-write locks can move it to their
/// worker thread; inline-write locks simply call it in place.
pub type WriteBody = Box<dyn FnOnce() + Send + 'static>;

/// The uniform contract implemented by every locking mechanism.
///
/// Call sites written against this trait work unchanged whichever mechanism
/// is configured (see [`LockKind`](crate::LockKind)). The contract is four
/// raw operations plus a mode-aware commit:
///
/// * [`acquire_read`](Lock::acquire_read) / [`release_read`](Lock::release_read)
///   bracket a read of the protected resource;
/// * [`acquire_write`](Lock::acquire_write) / [`release_write`](Lock::release_write)
///   bracket a mutation of it;
/// * [`write_apply`](Lock::write_apply) commits a whole write body, inline or
///   on a worker thread depending on the mechanism.
///
/// A lock coordinates timing only — it never owns the protected data — so
/// every acquire must be paired with exactly one release of the same side.
/// Prefer the [`read`](Lock::read)/[`write`](Lock::write) guards or the
/// [`read_with`](Lock::read_with)/[`write_with`](Lock::write_with) helpers,
/// which pair the calls on every exit path; the raw operations exist for
/// protocols guards cannot express, such as handing a write hold to another
/// thread.
///
/// # Example
///
/// ```rust
/// use lockkit::{Lock, LockError, ReadWriteCoordinator};
///
/// fn snapshot<L: Lock>(lock: &L) -> Result<(), LockError> {
///     let read = lock.read()?;
///     // ... look at the protected resource ...
///     read.unlock();
///     Ok(())
/// }
///
/// snapshot(&ReadWriteCoordinator::new()).unwrap();
/// ```
pub trait Lock: Send + Sync {
    /// Blocks the calling thread until a read hold is admitted.
    ///
    /// Mechanisms without a shared read side (the exclusive lock) admit the
    /// read into the same region as writes. Never fails on the mechanisms
    /// this crate ships; the [`Result`] keeps the contract uniform.
    fn acquire_read(&self) -> Result<(), LockError>;

    /// Releases one read hold taken by [`acquire_read`](Lock::acquire_read).
    ///
    /// Fails with [`LockError::Imbalanced`] when no matching hold is
    /// outstanding; the lock state is left untouched in that case.
    fn release_read(&self) -> Result<(), LockError>;

    /// Blocks the calling thread until the write side is admitted, alone.
    ///
    /// Fails with [`LockError::UpgradeNotSupported`] on read/write
    /// mechanisms when the calling thread already holds a read.
    fn acquire_write(&self) -> Result<(), LockError>;

    /// Releases the write hold taken by [`acquire_write`](Lock::acquire_write).
    ///
    /// Fails with [`LockError::Imbalanced`] when no write hold is
    /// outstanding; the lock state is left untouched in that case.
    fn release_write(&self) -> Result<(), LockError>;

    /// Reports a point-in-time [`LockStatus`] snapshot.
    fn status(&self) -> LockStatus;

    /// Commits `body` under the write side of this lock.
    ///
    /// The default runs the body inline: acquire, call, release. Mechanisms
    /// with a scheduled write mode override this to queue the body and
    /// return immediately; see
    /// [`ReadWriteLock`](crate::ReadWriteLock#method.write_apply).
    fn write_apply(&self, body: WriteBody) -> Result<(), LockError> {
        let guard = WriteGuard::new(self)?;
        body();
        guard.unlock();
        Ok(())
    }

    /// Acquires a read hold and wraps it in a guard that releases on drop.
    fn read(&self) -> Result<ReadGuard<'_, Self>, LockError>
    where
        Self: Sized,
    {
        ReadGuard::new(self)
    }

    /// Acquires the write side and wraps it in a guard that releases on drop.
    fn write(&self) -> Result<WriteGuard<'_, Self>, LockError>
    where
        Self: Sized,
    {
        WriteGuard::new(self)
    }

    /// Runs `f` under a read hold and returns its result.
    ///
    /// The hold is released even when `f` panics.
    fn read_with<R>(&self, f: impl FnOnce() -> R) -> Result<R, LockError>
    where
        Self: Sized,
    {
        let guard = ReadGuard::new(self)?;
        let result = f();
        guard.unlock();
        Ok(result)
    }

    /// Runs `f` under the write side and returns its result.
    ///
    /// Unlike [`write_apply`](Lock::write_apply) this always runs inline,
    /// whatever the mechanism's write mode. The hold is released even when
    /// `f` panics.
    fn write_with<R>(&self, f: impl FnOnce() -> R) -> Result<R, LockError>
    where
        Self: Sized,
    {
        let guard = WriteGuard::new(self)?;
        let result = f();
        guard.unlock();
        Ok(result)
    }
}

// region guards

/// RAII handle for one read hold on a [`Lock`].
///
/// Created by [`Lock::read`] or [`ReadGuard::new`]; the hold is released
/// when the guard drops, on every exit path.
///
/// Guards stay on the thread that acquired them. Read/write mechanisms
/// track read holds per thread to refuse upgrades, and a hold released from
/// another thread would leave that accounting stale. Use the raw operations
/// for protocols that must release elsewhere.
pub struct ReadGuard<'lock, L: Lock + ?Sized> {
    lock: &'lock L,
    // keeps the release on the acquiring thread: impl !Send
    no_send_marker: PhantomData<*const ()>,
}

impl<'lock, L: Lock + ?Sized> ReadGuard<'lock, L> {
    /// Acquires a read hold on `lock` and wraps it.
    pub fn new(lock: &'lock L) -> Result<Self, LockError> {
        lock.acquire_read()?;
        Ok(Self::held(lock))
    }

    /// Wraps a read hold that has already been acquired.
    #[inline]
    pub(crate) fn held(lock: &'lock L) -> Self {
        Self {
            lock,
            no_send_marker: PhantomData,
        }
    }

    /// Returns a reference to the guarded lock.
    #[inline]
    pub fn lock(&self) -> &'lock L {
        self.lock
    }

    /// Releases the hold. Equivalent to `drop(guard)`, spelled so the
    /// release reads as intentional at the call site.
    #[inline]
    pub fn unlock(self) {}
}

impl<L: Lock + ?Sized> Drop for ReadGuard<'_, L> {
    fn drop(&mut self) {
        let released = self.lock.release_read();
        debug_assert!(
            released.is_ok(),
            "a read hold disappeared out from under its guard; \
             raw release calls were mixed with guard usage"
        );
    }
}

/// RAII handle for the write side of a [`Lock`].
///
/// Created by [`Lock::write`] or [`WriteGuard::new`]; the write side is
/// released when the guard drops, on every exit path.
///
/// Like [`ReadGuard`], the guard stays on the thread that acquired it.
pub struct WriteGuard<'lock, L: Lock + ?Sized> {
    lock: &'lock L,
    no_send_marker: PhantomData<*const ()>,
}

impl<'lock, L: Lock + ?Sized> WriteGuard<'lock, L> {
    /// Acquires the write side of `lock` and wraps it.
    pub fn new(lock: &'lock L) -> Result<Self, LockError> {
        lock.acquire_write()?;
        Ok(Self::held(lock))
    }

    /// Wraps a write hold that has already been acquired.
    #[inline]
    pub(crate) fn held(lock: &'lock L) -> Self {
        Self {
            lock,
            no_send_marker: PhantomData,
        }
    }

    /// Returns a reference to the guarded lock.
    #[inline]
    pub fn lock(&self) -> &'lock L {
        self.lock
    }

    /// Releases the write side. Equivalent to `drop(guard)`, spelled so the
    /// release reads as intentional at the call site.
    #[inline]
    pub fn unlock(self) {}
}

impl<L: Lock + ?Sized> Drop for WriteGuard<'_, L> {
    fn drop(&mut self) {
        let released = self.lock.release_write();
        debug_assert!(
            released.is_ok(),
            "a write hold disappeared out from under its guard; \
             raw release calls were mixed with guard usage"
        );
    }
}

// endregion

/// ```rust
/// use lockkit::{ExclusiveLock, Lock};
///
/// let lock = ExclusiveLock::new();
/// let guard = lock.write().unwrap();
/// drop(guard);
/// ```
///
/// ```compile_fail
/// use lockkit::{ExclusiveLock, Lock};
///
/// fn check_send<T: Send>(value: T) -> T {
///     value
/// }
///
/// let lock = ExclusiveLock::new();
/// let guard = check_send(lock.write().unwrap());
/// drop(guard);
/// ```
#[allow(dead_code, reason = "It is used only in compile tests")]
fn test_compile_write_guard() {}

/// ```rust
/// use lockkit::{Lock, ReadWriteCoordinator};
///
/// let lock = ReadWriteCoordinator::new();
/// let guard = lock.read().unwrap();
/// drop(guard);
/// ```
///
/// ```compile_fail
/// use lockkit::{Lock, ReadWriteCoordinator};
///
/// fn check_send<T: Send>(value: T) -> T {
///     value
/// }
///
/// let lock = ReadWriteCoordinator::new();
/// let guard = check_send(lock.read().unwrap());
/// drop(guard);
/// ```
#[allow(dead_code, reason = "It is used only in compile tests")]
fn test_compile_read_guard() {}
