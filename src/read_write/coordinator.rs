use std::thread::{self, ThreadId};

use crossbeam::utils::CachePadded;
use parking_lot::{Condvar, Mutex};
use smallvec::SmallVec;

use crate::{Lock, LockError, LockStatus, ReadGuard, WriteGuard};

/// One thread's outstanding read holds.
#[derive(Copy, Clone)]
struct ReadHold {
    thread: ThreadId,
    depth: usize,
}

/// Admission state, mutated only under the coordinator's internal mutex.
struct AdmissionState {
    /// Outstanding read holds, all threads together.
    readers: usize,
    /// Whether a writer currently holds the exclusive side.
    writer_active: bool,
    /// Tickets handed to writers that asked for admission.
    writers_enqueued: u64,
    /// Tickets already served; the holder of ticket `writers_served` is
    /// next in line.
    writers_served: u64,
    /// Which threads hold reads, used to re-admit nested readers and to
    /// refuse read-to-write upgrades. Exact while reads are released on
    /// the thread that acquired them, which the guards enforce; a raw
    /// release from another thread still decrements `readers` but can
    /// leave an entry stale until the count next reaches zero.
    read_holds: SmallVec<[ReadHold; 8]>,
}

impl AdmissionState {
    fn new() -> Self {
        Self {
            readers: 0,
            writer_active: false,
            writers_enqueued: 0,
            writers_served: 0,
            read_holds: SmallVec::new(),
        }
    }

    /// Writers that have taken a ticket and not yet been served.
    fn writers_waiting(&self) -> bool {
        self.writers_enqueued > self.writers_served
    }

    /// How many read holds `thread` currently has.
    fn read_depth(&self, thread: ThreadId) -> usize {
        self.read_holds
            .iter()
            .find(|hold| hold.thread == thread)
            .map_or(0, |hold| hold.depth)
    }

    fn admit_reader(&mut self, thread: ThreadId) {
        debug_assert!(
            !self.writer_active,
            "a reader was admitted while a writer holds the lock"
        );

        self.readers += 1;
        match self.read_holds.iter_mut().find(|hold| hold.thread == thread) {
            Some(hold) => hold.depth += 1,
            None => self.read_holds.push(ReadHold { thread, depth: 1 }),
        }
    }

    fn retire_reader(&mut self, thread: ThreadId) {
        debug_assert!(self.readers > 0, "retire_reader ran with no readers");

        self.readers -= 1;
        if let Some(position) = self.read_holds.iter().position(|hold| hold.thread == thread) {
            self.read_holds[position].depth -= 1;
            if self.read_holds[position].depth == 0 {
                self.read_holds.remove(position);
            }
        }

        // A release that crossed threads leaves its acquirer's entry
        // behind; once nothing is held the whole table is provably stale.
        if self.readers == 0 {
            self.read_holds.clear();
        }
    }
}

/// The many-reader/single-writer admission core.
///
/// Any number of readers may hold the lock together; a writer holds it
/// alone, excluding readers and other writers. Writers are served in
/// arrival order and are preferred over readers: from the moment a writer
/// asks for admission, newly arriving readers wait behind it, so a steady
/// stream of readers cannot starve a writer. A thread already holding a
/// read is re-admitted immediately even then — its existing hold is what
/// the queued writer is waiting on, and queueing it behind that writer
/// would deadlock both.
///
/// The coordinator tracks admission only; it holds no protected data. Pair
/// every acquire with exactly one release, preferably through the guards
/// and closure helpers of [`Lock`], which release on every exit path.
///
/// Two contract points differ from [`ExclusiveLock`](crate::ExclusiveLock):
///
/// * The write side is not re-entrant. A thread that re-acquires the write
///   side it already holds queues behind itself and never returns.
/// * A thread holding a read cannot take the write side; the attempt fails
///   with [`LockError::UpgradeNotSupported`] instead of deadlocking, since
///   the write side cannot open until the caller's own read is released.
///
/// The write side may be released by a different thread than the one that
/// acquired it; scheduled-write locks rely on this to run writes on a
/// worker thread. Read holds should be released on the acquiring thread —
/// the guards enforce this — so that upgrade detection stays exact.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
///
/// use lockkit::{Lock, ReadWriteCoordinator};
///
/// let coordinator = Arc::new(ReadWriteCoordinator::new());
///
/// let mut readers = Vec::new();
/// for _ in 0..4 {
///     let coordinator = Arc::clone(&coordinator);
///     readers.push(thread::spawn(move || {
///         let read = coordinator.read().unwrap();
///         // ... look at the protected resource ...
///         read.unlock();
///     }));
/// }
/// for reader in readers {
///     reader.join().unwrap();
/// }
///
/// let write = coordinator.write().unwrap();
/// // ... mutate the protected resource, alone ...
/// write.unlock();
/// ```
pub struct ReadWriteCoordinator {
    state: CachePadded<Mutex<AdmissionState>>,
    /// Readers wait here while a writer is active or queued.
    readers_gate: Condvar,
    /// Queued writers wait here for their ticket to come up.
    writers_gate: Condvar,
}

impl ReadWriteCoordinator {
    /// Creates a new coordinator with no readers or writers admitted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: CachePadded::new(Mutex::new(AdmissionState::new())),
            readers_gate: Condvar::new(),
            writers_gate: Condvar::new(),
        }
    }

    /// If the read side is open — no writer active or queued, or the
    /// calling thread already holds a read — takes one read hold and
    /// returns its guard; otherwise returns [`None`] without blocking.
    #[must_use]
    pub fn try_read(&self) -> Option<ReadGuard<'_, Self>> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.read_depth(me) == 0 && (state.writer_active || state.writers_waiting()) {
            return None;
        }

        state.admit_reader(me);
        drop(state);
        Some(ReadGuard::held(self))
    }

    /// If the lock is idle — no holds and no queued writers — takes the
    /// write side and returns its guard; otherwise returns [`None`]
    /// without blocking. No ticket is taken either way, so a declined
    /// `try_write` leaves the reader gate open. An upgrade attempt gets
    /// the same non-blocking [`None`] as any other held state.
    #[must_use]
    pub fn try_write(&self) -> Option<WriteGuard<'_, Self>> {
        let mut state = self.state.lock();

        if state.readers > 0 || state.writer_active || state.writers_waiting() {
            return None;
        }

        state.writer_active = true;
        drop(state);
        Some(WriteGuard::held(self))
    }
}

impl Default for ReadWriteCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock for ReadWriteCoordinator {
    fn acquire_read(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        // A nested read skips the writer gates: this thread's existing
        // hold is what any queued writer is waiting on.
        if state.read_depth(me) == 0 {
            while state.writer_active || state.writers_waiting() {
                self.readers_gate.wait(&mut state);
            }
        }

        state.admit_reader(me);
        Ok(())
    }

    fn release_read(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.readers == 0 {
            return Err(LockError::Imbalanced);
        }

        state.retire_reader(me);
        if state.readers == 0 && state.writers_waiting() {
            drop(state);
            // every queued writer rechecks its ticket; only the head enters
            self.writers_gate.notify_all();
        }

        Ok(())
    }

    fn acquire_write(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.read_depth(me) > 0 {
            // refused before a ticket is taken, so the queue never stalls
            // on a writer that cannot be admitted
            return Err(LockError::UpgradeNotSupported);
        }

        let ticket = state.writers_enqueued;
        state.writers_enqueued += 1;

        while ticket != state.writers_served || state.readers > 0 || state.writer_active {
            self.writers_gate.wait(&mut state);
        }

        state.writers_served += 1;
        state.writer_active = true;
        debug_assert_eq!(state.readers, 0, "a writer was admitted alongside readers");

        Ok(())
    }

    fn release_write(&self) -> Result<(), LockError> {
        let mut state = self.state.lock();

        if !state.writer_active {
            return Err(LockError::Imbalanced);
        }

        state.writer_active = false;
        let writers_waiting = state.writers_waiting();
        drop(state);

        if writers_waiting {
            self.writers_gate.notify_all();
        } else {
            // waiting readers do not conflict with each other; open the
            // gate for all of them at once
            self.readers_gate.notify_all();
        }

        Ok(())
    }

    fn status(&self) -> LockStatus {
        let state = self.state.lock();
        if state.writer_active {
            LockStatus::WriteLocked
        } else if state.readers > 0 {
            LockStatus::ReadLocked(state.readers)
        } else {
            LockStatus::Unlocked
        }
    }
}
