use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::read_write::{ReadWriteCoordinator, WriteDispatcher};
use crate::{Lock, LockError, LockStatus, WriteBody, WriteGuard};

/// How [`write_apply`](Lock::write_apply) commits a write body.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WriteMode {
    /// The body runs inline on the calling thread; when `write_apply`
    /// returns, the body has finished and its effects are visible.
    Blocking,
    /// The body is queued for the lock's worker thread and `write_apply`
    /// returns at once. The write side is held across the whole body, so
    /// readers admitted afterwards still see a completed write.
    Scheduled,
}

/// A read/write lock with a fixed write-commit mode.
///
/// Wraps a [`ReadWriteCoordinator`] — the four raw operations and
/// [`status`](Lock::status) behave exactly as the coordinator's do — and
/// commits [`write_apply`](Lock::write_apply) bodies according to the
/// [`WriteMode`] chosen at construction:
///
/// * [`WriteMode::Blocking`]: acquire, run the body inline, release.
/// * [`WriteMode::Scheduled`]: hand the body to a worker thread that
///   acquires, runs and releases on the caller's behalf. The caller never
///   blocks, not even when readers are active.
///
/// Scheduled bodies run in submission order, and dropping the lock drains
/// the bodies still queued before its worker is joined.
///
/// A scheduled `write_apply` is also the one write entry point a thread
/// holding a read may use: nothing blocks, and the body runs after the
/// caller's read is released, like any other queued write.
///
/// # Example
///
/// ```rust
/// use lockkit::{Lock, ReadWriteLock, WriteMode};
///
/// let lock = ReadWriteLock::new(WriteMode::Scheduled);
///
/// let read = lock.read().unwrap();
/// // queued; runs once `read` is released
/// lock.write_apply(Box::new(|| {
///     // ... mutate the protected resource ...
/// })).unwrap();
/// read.unlock();
/// ```
pub struct ReadWriteLock {
    coordinator: Arc<ReadWriteCoordinator>,
    mode: WriteMode,
    /// Spawned on the first scheduled commit; locks that never schedule
    /// a write never pay for the worker thread.
    dispatcher: OnceCell<WriteDispatcher>,
}

impl ReadWriteLock {
    /// Creates a read/write lock committing writes according to `mode`.
    #[must_use]
    pub fn new(mode: WriteMode) -> Self {
        Self {
            coordinator: Arc::new(ReadWriteCoordinator::new()),
            mode,
            dispatcher: OnceCell::new(),
        }
    }

    /// The write-commit mode fixed at construction.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// The admission core this lock delegates to, for
    /// [`try_read`](ReadWriteCoordinator::try_read) and
    /// [`try_write`](ReadWriteCoordinator::try_write).
    #[inline]
    #[must_use]
    pub fn coordinator(&self) -> &ReadWriteCoordinator {
        &self.coordinator
    }

    fn dispatcher(&self) -> &WriteDispatcher {
        self.dispatcher
            .get_or_init(|| WriteDispatcher::spawn(Arc::clone(&self.coordinator)))
    }
}

impl Lock for ReadWriteLock {
    #[inline]
    fn acquire_read(&self) -> Result<(), LockError> {
        self.coordinator.acquire_read()
    }

    #[inline]
    fn release_read(&self) -> Result<(), LockError> {
        self.coordinator.release_read()
    }

    #[inline]
    fn acquire_write(&self) -> Result<(), LockError> {
        self.coordinator.acquire_write()
    }

    #[inline]
    fn release_write(&self) -> Result<(), LockError> {
        self.coordinator.release_write()
    }

    #[inline]
    fn status(&self) -> LockStatus {
        self.coordinator.status()
    }

    fn write_apply(&self, body: WriteBody) -> Result<(), LockError> {
        match self.mode {
            WriteMode::Blocking => {
                let guard = WriteGuard::new(self)?;
                body();
                guard.unlock();
                Ok(())
            }
            WriteMode::Scheduled => {
                self.dispatcher().submit(body);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::atomic::Ordering::SeqCst;
    use std::sync::{Arc, mpsc};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_raw_operations_behave_alike_in_both_modes() {
        for mode in [WriteMode::Blocking, WriteMode::Scheduled] {
            let lock = ReadWriteLock::new(mode);
            assert_eq!(lock.mode(), mode);

            lock.acquire_read().unwrap();
            assert_eq!(lock.status(), LockStatus::ReadLocked(1));
            assert_eq!(lock.acquire_write(), Err(LockError::UpgradeNotSupported));
            lock.release_read().unwrap();

            lock.acquire_write().unwrap();
            assert_eq!(lock.status(), LockStatus::WriteLocked);
            lock.release_write().unwrap();
            assert_eq!(lock.status(), LockStatus::Unlocked);

            assert!(lock.coordinator().try_write().is_some());
        }
    }

    #[test]
    fn test_blocking_write_is_visible_when_the_call_returns() {
        let lock = ReadWriteLock::new(WriteMode::Blocking);
        let value = Arc::new(AtomicUsize::new(0));

        let value_clone = value.clone();
        lock.write_apply(Box::new(move || {
            value_clone.store(7, SeqCst);
        }))
        .unwrap();

        assert_eq!(value.load(SeqCst), 7);
        assert_eq!(lock.status(), LockStatus::Unlocked);
    }

    #[test]
    fn test_scheduled_write_returns_before_the_body_finishes() {
        let lock = ReadWriteLock::new(WriteMode::Scheduled);
        let (started_tx, started_rx) = mpsc::channel();
        let (finish_tx, finish_rx) = mpsc::channel();
        let body_done = Arc::new(AtomicBool::new(false));
        let reader_admitted = Arc::new(AtomicBool::new(false));

        let body_done_clone = body_done.clone();
        lock.write_apply(Box::new(move || {
            started_tx.send(()).unwrap();
            finish_rx.recv().unwrap();
            body_done_clone.store(true, SeqCst);
        }))
        .unwrap();

        // write_apply already returned; the body is still parked
        started_rx.recv().unwrap();
        assert!(!body_done.load(SeqCst));

        thread::scope(|scope| {
            let reader = scope.spawn(|| {
                lock.acquire_read().unwrap();
                // admission implies the worker released, body included
                assert!(
                    body_done.load(SeqCst),
                    "a reader was admitted before the scheduled write finished"
                );
                reader_admitted.store(true, SeqCst);
                lock.release_read().unwrap();
            });

            // the worker holds the write side across the whole body
            thread::sleep(Duration::from_millis(50));
            assert!(
                !reader_admitted.load(SeqCst),
                "a reader was admitted in the middle of a scheduled write"
            );

            finish_tx.send(()).unwrap();
            reader.join().unwrap();
        });

        assert!(body_done.load(SeqCst));
        assert!(reader_admitted.load(SeqCst));
        assert_eq!(lock.status(), LockStatus::Unlocked);
    }

    #[test]
    fn test_scheduling_a_write_while_reading_does_not_deadlock() {
        let lock = ReadWriteLock::new(WriteMode::Scheduled);
        let applied = Arc::new(AtomicBool::new(false));

        lock.acquire_read().unwrap();

        let applied_clone = applied.clone();
        // returns at once even though this thread holds a read
        lock.write_apply(Box::new(move || {
            applied_clone.store(true, SeqCst);
        }))
        .unwrap();

        // the body needs the write side, so it waits out our read
        thread::sleep(Duration::from_millis(20));
        assert!(!applied.load(SeqCst));

        lock.release_read().unwrap();
        drop(lock);
        assert!(applied.load(SeqCst));
    }

    #[test]
    fn test_drop_flushes_scheduled_writes() {
        const TRIES: usize = 64;

        let lock = ReadWriteLock::new(WriteMode::Scheduled);
        let applied = Arc::new(AtomicUsize::new(0));

        for _ in 0..TRIES {
            let applied = applied.clone();
            lock.write_apply(Box::new(move || {
                applied.fetch_add(1, SeqCst);
            }))
            .unwrap();
        }

        drop(lock);
        assert_eq!(applied.load(SeqCst), TRIES);
    }
}
