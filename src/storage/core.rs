use std::ops::{Deref, DerefMut};

use crate::payload::Payload;

/// Holds the payload, either inline or behind its own allocation.
/// Dereferences to `T` for transparent use.
///
/// The variant is fixed by `T::INLINE`, a compile-time constant, so every
/// container of a given payload type uses the same representation.
pub enum Storage<T> {
    Inline(T),
    Owned(Box<T>),
}

impl<T: Payload> Storage<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        if T::INLINE {
            Storage::Inline(value)
        } else {
            Storage::Owned(Box::new(value))
        }
    }
}

impl<T> Storage<T> {
    pub fn is_inline(&self) -> bool {
        matches!(self, Storage::Inline(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Storage::Inline(v) => v,
            Storage::Owned(b) => *b,
        }
    }
}

impl<T> Deref for Storage<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match self {
            Storage::Inline(v) => v,
            Storage::Owned(b) => b,
        }
    }
}

impl<T> DerefMut for Storage<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        match self {
            Storage::Inline(v) => v,
            Storage::Owned(b) => b,
        }
    }
}
