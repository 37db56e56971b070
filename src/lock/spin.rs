use std::hint;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::lock_api::{GuardSend, RawRwLock};

/// Busy-spin mutual-exclusion lock.
///
/// Shared and exclusive acquisitions are the same operation: readers
/// exclude each other as well as writers. No fairness: a waiter may spin
/// indefinitely under contention.
pub struct SpinLock {
    locked: AtomicBool,
}

impl SpinLock {
    #[inline]
    fn acquire(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // wait on a plain load to keep the cache line shared while held
            while self.locked.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

unsafe impl RawRwLock for SpinLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: SpinLock = SpinLock {
        locked: AtomicBool::new(false),
    };

    type GuardMarker = GuardSend;

    fn lock_shared(&self) {
        self.acquire();
    }

    fn try_lock_shared(&self) -> bool {
        self.try_acquire()
    }

    unsafe fn unlock_shared(&self) {
        self.release();
    }

    fn lock_exclusive(&self) {
        self.acquire();
    }

    fn try_lock_exclusive(&self) -> bool {
        self.try_acquire()
    }

    unsafe fn unlock_exclusive(&self) {
        self.release();
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}
