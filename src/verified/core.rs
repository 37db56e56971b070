use std::fmt;
use std::mem::size_of;
use std::ops::Index;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::lock_api::{MappedRwLockReadGuard, RawRwLock, RwLock, RwLockReadGuard};
use tracing::{debug, trace};

use super::guard::ModifyGuard;
use crate::error::{Error, Result};
use crate::header::Header;
use crate::lock::DefaultRawLock;
use crate::payload::{Accumulator, Payload, Scalar};
use crate::simd;
use crate::storage::Storage;

/// Shared view of a payload. Holds the container's shared lock until dropped.
pub type ReadGuard<'a, T, R = DefaultRawLock> = MappedRwLockReadGuard<'a, R, T>;

/// Tamper-evident container.
///
/// Wraps a value together with a 64-bit integrity header and a checksum over
/// header and payload bytes. Mutation goes through [`modify`](Self::modify),
/// whose guard refreshes the checksum when it is dropped. Anything that
/// changes the payload some other way is reported by the next
/// [`verify`](Self::verify).
///
/// `R` selects the lock strategy (see [`crate::lock`]).
///
/// The checksum is a salted byte-sum, not a MAC: it catches corruption and
/// writes that bypass the API, not an adversary who knows the salt.
pub struct Verified<T, R = DefaultRawLock> {
    header: Header,
    slot: RwLock<R, Storage<T>>,
    checksum: AtomicU64,
}

/// Checksum of `value` under `header`.
pub(crate) fn seal<T: Payload + ?Sized>(header: Header, value: &T) -> u64 {
    let mut acc = Accumulator::new(header.salt());
    value.feed(&mut acc);
    simd::checksum(header, acc.sum())
}

fn fresh_salt() -> u16 {
    rand::random::<u16>()
}

impl<T: Payload> Verified<T> {
    /// Wrap `value` using the default lock strategy and a random salt.
    pub fn new(value: T) -> Self {
        Self::with_lock_and_salt(value, fresh_salt())
    }

    /// Wrap `value` with a caller-chosen salt. Identical inputs then give
    /// identical checksums, which benchmarks and fixtures rely on.
    pub fn with_salt(value: T, salt: u16) -> Self {
        Self::with_lock_and_salt(value, salt)
    }
}

impl<T: Payload, R: RawRwLock> Verified<T, R> {
    /// Wrap `value` using lock strategy `R` and a random salt.
    pub fn with_lock(value: T) -> Self {
        Self::with_lock_and_salt(value, fresh_salt())
    }

    pub fn with_lock_and_salt(value: T, salt: u16) -> Self {
        let header = Header::new(size_of::<T>(), salt);
        let storage = Storage::new(value);
        let sum = seal(header, &*storage);
        trace!(
            salt = header.salt(),
            size = header.size(),
            inline = storage.is_inline(),
            "sealed payload"
        );
        Verified {
            header,
            slot: RwLock::new(storage),
            checksum: AtomicU64::new(sum),
        }
    }

    /// Shared access to the payload. The shared lock is held until the
    /// returned guard is dropped, so writers wait for it.
    pub fn get(&self) -> ReadGuard<'_, T, R> {
        RwLockReadGuard::map(self.slot.read(), |s| &**s)
    }

    /// Recompute the checksum and compare it with the stored one.
    /// Never changes stored state.
    pub fn verify(&self) -> bool {
        let slot = self.slot.read();
        let computed = seal(self.header, &**slot);
        let stored = self.checksum.load(Ordering::Acquire);
        if computed != stored {
            debug!(stored, computed, "checksum mismatch");
            return false;
        }
        true
    }

    /// Like [`verify`](Self::verify), but reports what went wrong.
    pub fn check(&self) -> Result<()> {
        if !self.header.is_valid() {
            return Err(Error::InvalidMagic {
                found: self.header.magic(),
            });
        }
        let slot = self.slot.read();
        let computed = seal(self.header, &**slot);
        let stored = self.checksum.load(Ordering::Acquire);
        if computed != stored {
            return Err(Error::ChecksumMismatch { stored, computed });
        }
        Ok(())
    }

    /// Last stored checksum. No recomputation, no locking.
    #[inline]
    pub fn checksum(&self) -> u64 {
        self.checksum.load(Ordering::Acquire)
    }

    #[inline]
    pub fn header(&self) -> Header {
        self.header
    }

    #[inline]
    pub fn salt(&self) -> u16 {
        self.header.salt()
    }

    /// Header magic is intact.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.header.is_valid()
    }

    /// Payload lives inside the container rather than behind a `Box`.
    pub fn is_inline(&self) -> bool {
        T::INLINE
    }

    /// Exclusive, checksum-refreshing access. Blocks until every reader and
    /// any other writer has released the lock.
    pub fn modify(&self) -> ModifyGuard<'_, T, R> {
        ModifyGuard::new(self.slot.write(), self.header, &self.checksum)
    }

    /// Non-blocking [`modify`](Self::modify).
    pub fn try_modify(&self) -> Option<ModifyGuard<'_, T, R>> {
        self.slot
            .try_write()
            .map(|slot| ModifyGuard::new(slot, self.header, &self.checksum))
    }

    /// Run `f` inside a mutation scope and return its result.
    pub fn modify_with<F, U>(&self, f: F) -> U
    where
        F: FnOnce(&mut T) -> U,
    {
        let mut guard = self.modify();
        f(&mut *guard)
    }

    /// Raw pointer to the live payload.
    ///
    /// Writes through this pointer skip the checksum refresh and are only
    /// caught by a later [`verify`](Self::verify). The caller must make sure
    /// nothing else accesses the container while writing through it.
    pub fn as_ptr(&self) -> *mut T {
        let mut slot = self.slot.write();
        &mut **slot as *mut T
    }

    pub fn into_inner(self) -> T {
        self.slot.into_inner().into_inner()
    }
}

// ── Capability-gated access ─────────────────────────────────────────

impl<T: Scalar, R: RawRwLock> Verified<T, R> {
    /// Copy of a scalar payload.
    pub fn value(&self) -> T {
        **self.slot.read()
    }
}

impl<T: Payload + AsRef<str>, R: RawRwLock> Verified<T, R> {
    /// String view of the payload, held under the shared lock.
    pub fn as_str(&self) -> ReadGuard<'_, str, R> {
        RwLockReadGuard::map(self.slot.read(), |s| AsRef::<str>::as_ref(&**s))
    }
}

impl<T: Payload, R: RawRwLock> Verified<T, R> {
    /// Indexed element, held under the shared lock.
    pub fn at<I>(&self, index: I) -> ReadGuard<'_, <T as Index<I>>::Output, R>
    where
        T: Index<I>,
    {
        RwLockReadGuard::map(self.slot.read(), move |s| &(**s)[index])
    }

    /// Iterate over cloned elements. The shared lock is held until the
    /// iterator is dropped.
    pub fn iter<E>(&self) -> Iter<'_, E, R>
    where
        T: AsRef<[E]>,
        E: Clone,
    {
        Iter {
            items: RwLockReadGuard::map(self.slot.read(), |s| AsRef::<[E]>::as_ref(&**s)),
            pos: 0,
        }
    }
}

/// Iterator returned by [`Verified::iter`].
pub struct Iter<'a, E, R: RawRwLock> {
    items: MappedRwLockReadGuard<'a, R, [E]>,
    pos: usize,
}

impl<E: Clone, R: RawRwLock> Iterator for Iter<'_, E, R> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        let item = self.items.get(self.pos)?.clone();
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.items.len() - self.pos;
        (left, Some(left))
    }
}

impl<E: Clone, R: RawRwLock> ExactSizeIterator for Iter<'_, E, R> {}

// ── Conversions ─────────────────────────────────────────────────────

impl<T: Payload, R: RawRwLock> From<&Verified<T, R>> for bool {
    fn from(v: &Verified<T, R>) -> bool {
        v.verify()
    }
}

impl<T: Payload, R: RawRwLock> From<T> for Verified<T, R> {
    fn from(value: T) -> Self {
        Self::with_lock(value)
    }
}

impl<T: Payload + Default, R: RawRwLock> Default for Verified<T, R> {
    fn default() -> Self {
        Self::with_lock(T::default())
    }
}

impl<T, E, R> FromIterator<E> for Verified<T, R>
where
    T: Payload + FromIterator<E>,
    R: RawRwLock,
{
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::with_lock(iter.into_iter().collect())
    }
}

impl<T: Payload + fmt::Display, R: RawRwLock> fmt::Display for Verified<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self.slot.read(), f)
    }
}

impl<T: Payload + fmt::Debug, R: RawRwLock> fmt::Debug for Verified<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Verified");
        d.field("header", &self.header);
        d.field("checksum", &format_args!("{:#018x}", self.checksum()));
        // never block inside Debug; a writer may hold the lock
        match self.slot.try_read() {
            Some(slot) => d.field("value", &&**slot),
            None => d.field("value", &format_args!("<locked>")),
        };
        d.finish()
    }
}
