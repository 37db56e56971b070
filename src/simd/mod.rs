//! Salted byte-sum checksum engine with runtime CPU dispatch:
//! - AVX2 (x86/x86_64, 32-byte lanes)
//! - SSE2 (x86/x86_64, 16-byte lanes)
//! - NEON (aarch64, 16-byte lanes)
//! - Scalar fallback (all platforms)

mod core;

#[cfg(test)]
mod tests;

pub use self::core::{
    SimdLevel, checksum, mix, salted_sum, salted_sum_scalar, salted_sum_with, simd_level,
};
