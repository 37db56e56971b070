mod core;
mod guard;


pub use self::core::{Iter, ReadGuard, Verified};
pub use self::guard::ModifyGuard;
