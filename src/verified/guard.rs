use std::mem;
use std::ops::{self, Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::lock_api::{RawRwLock, RwLockWriteGuard};
use tracing::trace;

use super::core::seal;
use crate::header::Header;
use crate::payload::Payload;
use crate::storage::Storage;

/// Exclusive mutation scope returned by [`Verified::modify`](crate::Verified::modify).
///
/// Holds the container's write lock. Dropping the guard recomputes and
/// stores the checksum exactly once, before the lock is released. That
/// includes early returns and unwinding.
pub struct ModifyGuard<'a, T: Payload, R: RawRwLock> {
    slot: RwLockWriteGuard<'a, R, Storage<T>>,
    header: Header,
    checksum: &'a AtomicU64,
}

impl<'a, T: Payload, R: RawRwLock> ModifyGuard<'a, T, R> {
    pub(crate) fn new(
        slot: RwLockWriteGuard<'a, R, Storage<T>>,
        header: Header,
        checksum: &'a AtomicU64,
    ) -> Self {
        ModifyGuard {
            slot,
            header,
            checksum,
        }
    }

    /// Overwrite the payload.
    pub fn set(&mut self, value: T) {
        **self.slot = value;
    }

    /// Overwrite the payload, returning the previous value.
    pub fn replace(&mut self, value: T) -> T {
        mem::replace(&mut **self.slot, value)
    }
}

impl<T: Payload, R: RawRwLock> Deref for ModifyGuard<'_, T, R> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.slot
    }
}

impl<T: Payload, R: RawRwLock> DerefMut for ModifyGuard<'_, T, R> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.slot
    }
}

impl<T: Payload, R: RawRwLock> Drop for ModifyGuard<'_, T, R> {
    fn drop(&mut self) {
        // `slot` is dropped after this body, so the write lock is still held
        let sum = seal(self.header, &**self.slot);
        self.checksum.store(sum, Ordering::Release);
        trace!(checksum = sum, "checksum refreshed");
    }
}

macro_rules! forward_assign_ops {
    ($($op:ident :: $method:ident),* $(,)?) => {$(
        impl<T, R, U> ops::$op<U> for ModifyGuard<'_, T, R>
        where
            T: Payload + ops::$op<U>,
            R: RawRwLock,
        {
            #[inline]
            fn $method(&mut self, rhs: U) {
                ops::$op::$method(&mut **self.slot, rhs);
            }
        }
    )*};
}

forward_assign_ops!(
    AddAssign::add_assign,
    SubAssign::sub_assign,
    MulAssign::mul_assign,
    DivAssign::div_assign,
    RemAssign::rem_assign,
    BitAndAssign::bitand_assign,
    BitOrAssign::bitor_assign,
    BitXorAssign::bitxor_assign,
    ShlAssign::shl_assign,
    ShrAssign::shr_assign,
);
