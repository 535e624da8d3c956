use std::thread::{self, ThreadId};

use crossbeam::utils::CachePadded;
use parking_lot::{Condvar, Mutex};

use crate::{Lock, LockError, LockStatus, WriteGuard};

/// Ownership record of the exclusive region: which thread holds it and how
/// deeply its re-entrant holds are nested.
struct Owner {
    // thread.is_some() == (depth > 0)
    thread: Option<ThreadId>,
    depth: usize,
}

/// A re-entrant mutual-exclusion lock.
///
/// Read and write operations enter the same exclusive region: every access
/// excludes every other access, and there is no shared reader path. The
/// owning thread may re-enter the region any number of times without
/// blocking itself; the region opens to other threads once the owner has
/// released as many times as it acquired.
///
/// Because all four contract operations address the one region, releases
/// are not paired by operation kind: any release by the owning thread
/// unwinds one level of its hold, whichever acquire produced it. In
/// particular a thread inside the region may call
/// [`acquire_write`](Lock::acquire_write) while "reading" — that is a
/// re-entry, not an upgrade, and it never fails. A release by any other
/// thread, or with no hold outstanding, fails with
/// [`LockError::Imbalanced`].
///
/// # Example
///
/// ```rust
/// use lockkit::{ExclusiveLock, Lock, LockStatus};
///
/// let lock = ExclusiveLock::new();
///
/// lock.acquire_read().unwrap();
/// lock.acquire_write().unwrap(); // re-entry by the owner, no deadlock
/// assert_eq!(lock.status(), LockStatus::WriteLocked);
///
/// lock.release_write().unwrap();
/// lock.release_read().unwrap();
/// assert_eq!(lock.status(), LockStatus::Unlocked);
/// ```
pub struct ExclusiveLock {
    owner: CachePadded<Mutex<Owner>>,
    /// Contenders wait here for the owner to fully release.
    vacated: Condvar,
}

impl ExclusiveLock {
    /// Creates a new, unheld `ExclusiveLock`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            owner: CachePadded::new(Mutex::new(Owner {
                thread: None,
                depth: 0,
            })),
            vacated: Condvar::new(),
        }
    }

    /// If the region is free or already held by the calling thread, enters
    /// it and returns a guard; otherwise returns [`None`] without blocking.
    #[must_use]
    pub fn try_lock(&self) -> Option<WriteGuard<'_, Self>> {
        let me = thread::current().id();
        let mut owner = self.owner.lock();

        match owner.thread {
            Some(holder) if holder != me => None,
            _ => {
                owner.thread = Some(me);
                owner.depth += 1;
                drop(owner);
                Some(WriteGuard::held(self))
            }
        }
    }

    /// Blocks the calling thread until the region can be entered.
    fn enter(&self) {
        let me = thread::current().id();
        let mut owner = self.owner.lock();

        loop {
            match owner.thread {
                None => {
                    debug_assert_eq!(owner.depth, 0, "a vacated region kept a hold depth");
                    owner.thread = Some(me);
                    owner.depth = 1;
                    return;
                }
                Some(holder) if holder == me => {
                    owner.depth += 1;
                    return;
                }
                Some(_) => self.vacated.wait(&mut owner),
            }
        }
    }

    /// Unwinds one level of the calling thread's hold.
    fn exit(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut owner = self.owner.lock();

        if owner.thread != Some(me) {
            return Err(LockError::Imbalanced);
        }

        debug_assert!(owner.depth > 0, "an owned region had no hold depth");
        owner.depth -= 1;
        if owner.depth == 0 {
            owner.thread = None;
            drop(owner);
            // one waiter can take the region; the rest keep waiting
            self.vacated.notify_one();
        }

        Ok(())
    }
}

impl Default for ExclusiveLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock for ExclusiveLock {
    #[inline]
    fn acquire_read(&self) -> Result<(), LockError> {
        self.enter();
        Ok(())
    }

    #[inline]
    fn release_read(&self) -> Result<(), LockError> {
        self.exit()
    }

    #[inline]
    fn acquire_write(&self) -> Result<(), LockError> {
        self.enter();
        Ok(())
    }

    #[inline]
    fn release_write(&self) -> Result<(), LockError> {
        self.exit()
    }

    fn status(&self) -> LockStatus {
        if self.owner.lock().thread.is_some() {
            LockStatus::WriteLocked
        } else {
            LockStatus::Unlocked
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
    fn test_reentrant_nesting_by_the_owner() {
        const DEPTH: usize = 5;

        let lock = ExclusiveLock::new();

        lock.acquire_write().unwrap();
        for _ in 1..DEPTH {
            // mixing read and write acquires still addresses the one region
            lock.acquire_read().unwrap();
        }
        assert_eq!(lock.owner.lock().depth, DEPTH);
        assert_eq!(lock.status(), LockStatus::WriteLocked);

        for _ in 0..DEPTH {
            lock.release_write().unwrap();
        }
        assert_eq!(lock.status(), LockStatus::Unlocked);
        assert_eq!(lock.release_write(), Err(LockError::Imbalanced));
    }

    #[test]
    fn test_excludes_other_threads_until_released() {
        let lock = Arc::new(ExclusiveLock::new());
        let entered = Arc::new(AtomicBool::new(false));
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();

        let owner = {
            let lock = lock.clone();
            thread::spawn(move || {
                lock.acquire_write().unwrap();
                held_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                lock.release_write().unwrap();
            })
        };

        held_rx.recv().unwrap();

        let contender = {
            let lock = lock.clone();
            let entered = entered.clone();
            thread::spawn(move || {
                // reads enter the same region as writes
                lock.acquire_read().unwrap();
                entered.store(true, SeqCst);
                lock.release_read().unwrap();
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(SeqCst), "a second thread entered a held region");

        release_tx.send(()).unwrap();
        owner.join().unwrap();
        contender.join().unwrap();
        assert!(entered.load(SeqCst));
        assert_eq!(lock.status(), LockStatus::Unlocked);
    }

    #[test]
    fn test_release_by_a_non_owner_is_imbalanced() {
        let lock = Arc::new(ExclusiveLock::new());
        assert_eq!(lock.release_read(), Err(LockError::Imbalanced));

        lock.acquire_write().unwrap();

        let lock_clone = lock.clone();
        let outsider = thread::spawn(move || lock_clone.release_write());
        assert_eq!(outsider.join().unwrap(), Err(LockError::Imbalanced));

        // the owner's hold survived the failed release
        assert_eq!(lock.status(), LockStatus::WriteLocked);
        lock.release_write().unwrap();
    }

    #[test]
    fn test_try_lock() {
        let lock = Arc::new(ExclusiveLock::new());

        let guard = lock.try_lock().expect("the region is free");
        let reentered = lock.try_lock().expect("try_lock re-enters on the owning thread");

        let lock_clone = lock.clone();
        let contender = thread::spawn(move || lock_clone.try_lock().is_none());
        assert!(
            contender.join().unwrap(),
            "try_lock entered a region held by another thread"
        );

        reentered.unlock();
        guard.unlock();
        assert_eq!(lock.status(), LockStatus::Unlocked);
    }

    #[test]
    fn stress_test_mutual_exclusion() {
        const PAR: usize = 8;
        const TRIES: usize = 200;

        let lock = Arc::new(ExclusiveLock::new());
        let in_region = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let total = Arc::new(AtomicUsize::new(0));

        let mut crews = Vec::with_capacity(PAR);
        for _ in 0..PAR {
            let lock = lock.clone();
            let in_region = in_region.clone();
            let overlaps = overlaps.clone();
            let total = total.clone();
            crews.push(thread::spawn(move || {
                for _ in 0..TRIES {
                    lock.acquire_write().unwrap();
                    // nest once to keep the re-entrant path under load too
                    lock.acquire_read().unwrap();

                    if in_region.fetch_add(1, SeqCst) != 0 {
                        overlaps.fetch_add(1, SeqCst);
                    }
                    thread::yield_now();
                    in_region.fetch_sub(1, SeqCst);

                    lock.release_read().unwrap();
                    lock.release_write().unwrap();

                    let done = total.fetch_add(1, SeqCst) + 1;
                    if done % 500 == 0 {
                        println!("{done} of {}", PAR * TRIES);
                    }
                }
            }));
        }

        for crew in crews {
            crew.join().unwrap();
        }

        assert_eq!(overlaps.load(SeqCst), 0, "two threads were inside the region at once");
        assert_eq!(total.load(SeqCst), PAR * TRIES);
        assert_eq!(lock.status(), LockStatus::Unlocked);
    }
}
