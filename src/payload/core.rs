use crate::simd::salted_sum;

/// Running salted byte-sum fed by [`Payload::feed`].
///
/// Each `write` call is summed as its own segment, so the parity of the
/// salt bytes restarts at every call.
#[derive(Debug, Clone)]
pub struct Accumulator {
    salt: u16,
    sum: u64,
}

impl Accumulator {
    pub fn new(salt: u16) -> Self {
        Accumulator { salt, sum: 0 }
    }

    #[inline]
    pub fn write(&mut self, bytes: &[u8]) {
        self.sum = self.sum.wrapping_add(salted_sum(bytes, self.salt));
    }

    #[inline]
    pub fn write_len(&mut self, len: usize) {
        self.write(&(len as u64).to_le_bytes());
    }

    pub fn salt(&self) -> u16 {
        self.salt
    }

    pub fn sum(&self) -> u64 {
        self.sum
    }
}

/// A value whose byte representation can be covered by the checksum.
///
/// `feed` hands every byte that identifies the value to the accumulator.
/// Heap-backed types feed their contents, not their pointers, so the
/// checksum follows the logical value.
pub trait Payload {
    /// Store inline instead of behind a `Box`. Only small scalars set this.
    const INLINE: bool = false;

    fn feed(&self, acc: &mut Accumulator);

    /// Feed a contiguous run of values. Plain-old-data types override this
    /// to hand the whole slice over as one byte run.
    fn feed_slice(items: &[Self], acc: &mut Accumulator)
    where
        Self: Sized,
    {
        for item in items {
            item.feed(acc);
        }
    }
}

/// Payloads that behave as plain scalar values (copyable, no indirection).
/// Gates [`Verified::value`](crate::Verified::value).
pub trait Scalar: Payload + Copy {}

macro_rules! impl_pod_scalar {
    ($($t:ty),* $(,)?) => {$(
        impl Payload for $t {
            const INLINE: bool = size_of::<$t>() < size_of::<usize>();

            #[inline]
            fn feed(&self, acc: &mut Accumulator) {
                acc.write(&self.to_ne_bytes());
            }

            #[inline]
            fn feed_slice(items: &[Self], acc: &mut Accumulator) {
                acc.write(bytemuck::cast_slice(items));
            }
        }

        impl Scalar for $t {}
    )*};
}

impl_pod_scalar!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl Payload for bool {
    const INLINE: bool = true;

    #[inline]
    fn feed(&self, acc: &mut Accumulator) {
        acc.write(&[*self as u8]);
    }
}

impl Scalar for bool {}

impl Payload for char {
    const INLINE: bool = size_of::<char>() < size_of::<usize>();

    #[inline]
    fn feed(&self, acc: &mut Accumulator) {
        acc.write(&u32::from(*self).to_ne_bytes());
    }
}

impl Scalar for char {}

impl<T: Payload, const N: usize> Payload for [T; N] {
    fn feed(&self, acc: &mut Accumulator) {
        T::feed_slice(self, acc);
    }
}

impl<T: Payload> Payload for Vec<T> {
    fn feed(&self, acc: &mut Accumulator) {
        T::feed_slice(self, acc);
        acc.write_len(self.len());
    }
}

impl<T: Payload> Payload for Box<T> {
    fn feed(&self, acc: &mut Accumulator) {
        (**self).feed(acc);
    }
}

impl<T: Payload> Payload for Option<T> {
    fn feed(&self, acc: &mut Accumulator) {
        match self {
            Some(v) => {
                acc.write(&[1]);
                v.feed(acc);
            }
            None => acc.write(&[0]),
        }
    }
}

impl Payload for String {
    fn feed(&self, acc: &mut Accumulator) {
        acc.write(self.as_bytes());
        acc.write_len(self.len());
    }
}

impl Payload for Box<str> {
    fn feed(&self, acc: &mut Accumulator) {
        acc.write(self.as_bytes());
        acc.write_len(self.len());
    }
}

impl Payload for &str {
    fn feed(&self, acc: &mut Accumulator) {
        acc.write(self.as_bytes());
        acc.write_len(self.len());
    }
}

macro_rules! impl_tuple {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: Payload),+> Payload for ($($name,)+) {
            fn feed(&self, acc: &mut Accumulator) {
                $(self.$idx.feed(acc);)+
            }
        }
    };
}

impl_tuple!(A.0);
impl_tuple!(A.0, B.1);
impl_tuple!(A.0, B.1, C.2);
impl_tuple!(A.0, B.1, C.2, D.3);

/// Implement [`Payload`] for a struct by feeding the listed fields in order.
///
/// ```
/// use verifycell::{Verified, payload_fields};
///
/// struct Player {
///     health: i32,
///     mana: i32,
///     name: String,
/// }
/// payload_fields!(Player { health, mana, name });
///
/// let p = Verified::new(Player { health: 100, mana: 50, name: "ann".into() });
/// assert!(p.verify());
/// ```
#[macro_export]
macro_rules! payload_fields {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::Payload for $ty {
            fn feed(&self, acc: &mut $crate::Accumulator) {
                $($crate::Payload::feed(&self.$field, acc);)+
            }
        }
    };
}
