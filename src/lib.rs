//! Tamper-evident value containers.
//!
//! [`Verified<T>`] wraps a value together with a 64-bit integrity header and
//! a salted checksum over header and payload bytes. Reads share a lock,
//! mutation goes through a scoped [`ModifyGuard`] that refreshes the
//! checksum when dropped, and [`Verified::verify`] recomputes the checksum
//! to catch writes that bypassed the API.
//!
//! ```
//! use verifycell::Verified;
//!
//! let hp = Verified::new(100i32);
//! *hp.modify() -= 25;
//! assert_eq!(hp.value(), 75);
//! assert!(hp.verify());
//! ```

pub mod audit;
pub mod error;
pub mod header;
pub mod lock;
pub mod payload;
pub mod simd;
pub mod storage;
pub mod verified;

pub use self::audit::{AuditReport, audit};
pub use self::error::{Error, Result};
pub use self::header::Header;
pub use self::lock::{DefaultRawLock, SpinLock};
pub use self::payload::{Accumulator, Payload, Scalar};
pub use self::verified::{Iter, ModifyGuard, ReadGuard, Verified};
