//! Lock strategies for the container.
//!
//! Every strategy implements `lock_api::RawRwLock`, so `Verified` takes the
//! strategy as a type parameter. The default is parking_lot's reader-writer
//! lock; building with the `spin-lock` feature switches the default to
//! [`SpinLock`], a busy-wait mutual-exclusion lock for runtimes without a
//! native reader-writer primitive.

mod spin;


pub use self::spin::SpinLock;

/// Raw lock used when `Verified` is named without an explicit strategy.
#[cfg(not(feature = "spin-lock"))]
pub type DefaultRawLock = parking_lot::RawRwLock;

/// Raw lock used when `Verified` is named without an explicit strategy.
#[cfg(feature = "spin-lock")]
pub type DefaultRawLock = SpinLock;

/// Short human-readable name of a lock strategy, for logs and the demo.
pub fn strategy_name<R>() -> &'static str {
    let full = std::any::type_name::<R>();
    full.rsplit("::").next().unwrap_or(full)
}
