use std::sync::atomic::{AtomicU8, Ordering};

use crate::header::Header;

/// Vector path selected for [`salted_sum`] on this CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    Scalar,
    Sse2,
    Avx2,
    Neon,
}

impl SimdLevel {
    pub fn name(self) -> &'static str {
        match self {
            SimdLevel::Scalar => "scalar",
            SimdLevel::Sse2 => "sse2",
            SimdLevel::Avx2 => "avx2",
            SimdLevel::Neon => "neon",
        }
    }

    /// Bytes consumed per vector iteration (1 for the scalar path).
    pub fn width(self) -> usize {
        match self {
            SimdLevel::Scalar => 1,
            SimdLevel::Sse2 | SimdLevel::Neon => 16,
            SimdLevel::Avx2 => 32,
        }
    }
}

// 0 = not checked yet, otherwise LEVEL_* below.
static CPU_LEVEL: AtomicU8 = AtomicU8::new(0);

const LEVEL_UNCHECKED: u8 = 0;
#[cfg(not(target_arch = "aarch64"))]
const LEVEL_SCALAR: u8 = 1;
#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
const LEVEL_SSE2: u8 = 2;
#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
const LEVEL_AVX2: u8 = 3;
#[cfg(target_arch = "aarch64")]
const LEVEL_NEON: u8 = 4;

#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
fn detect_level() -> u8 {
    if is_x86_feature_detected!("avx2") {
        LEVEL_AVX2
    } else if is_x86_feature_detected!("sse2") {
        LEVEL_SSE2
    } else {
        LEVEL_SCALAR
    }
}

// NEON is baseline on aarch64
#[cfg(target_arch = "aarch64")]
fn detect_level() -> u8 {
    LEVEL_NEON
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")))]
fn detect_level() -> u8 {
    LEVEL_SCALAR
}

#[inline]
fn cpu_level() -> u8 {
    let cached = CPU_LEVEL.load(Ordering::Relaxed);
    if cached != LEVEL_UNCHECKED {
        return cached;
    }
    let detected = detect_level();
    CPU_LEVEL.store(detected, Ordering::Relaxed);
    detected
}

/// The vector path [`salted_sum`] dispatches to.
pub fn simd_level() -> SimdLevel {
    match cpu_level() {
        #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
        LEVEL_AVX2 => SimdLevel::Avx2,
        #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
        LEVEL_SSE2 => SimdLevel::Sse2,
        #[cfg(target_arch = "aarch64")]
        LEVEL_NEON => SimdLevel::Neon,
        _ => SimdLevel::Scalar,
    }
}

/// Salted byte-sum of `data`.
///
/// Every byte is XORed with one byte of `salt` before it is added: bytes at
/// even offsets use the low byte, odd offsets the high byte (the salt
/// broadcast as 16-bit lanes). The widest available vector path does the
/// bulk, the tail is finished one byte at a time. Every path returns the
/// same value as [`salted_sum_scalar`].
#[inline]
pub fn salted_sum(data: &[u8], salt: u16) -> u64 {
    let level = cpu_level();

    #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
    {
        if level == LEVEL_AVX2 {
            return unsafe { salted_sum_avx2(data, salt) };
        }
        if level == LEVEL_SSE2 {
            return unsafe { salted_sum_sse2(data, salt) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if level == LEVEL_NEON {
            return unsafe { salted_sum_neon(data, salt) };
        }
    }

    let _ = level;
    salted_sum_scalar(data, salt)
}

/// Reference implementation. All vector paths must match it exactly.
#[inline]
pub fn salted_sum_scalar(data: &[u8], salt: u16) -> u64 {
    let key = salt_bytes(salt);
    let mut sum: u64 = 0;

    let pairs = data.chunks_exact(2);
    let remainder = pairs.remainder();
    for pair in pairs {
        sum = sum
            .wrapping_add(u64::from(pair[0] ^ key[0]))
            .wrapping_add(u64::from(pair[1] ^ key[1]));
    }
    if let Some(&last) = remainder.first() {
        sum = sum.wrapping_add(u64::from(last ^ key[0]));
    }
    sum
}

#[inline(always)]
fn salt_bytes(salt: u16) -> [u8; 2] {
    [salt as u8, (salt >> 8) as u8]
}

/// Finalizer: three xor-shift rounds separated by two multiplies
/// (MurmurHash3 `fmix64`). Bijective, so distinct sums stay distinct.
#[inline]
pub const fn mix(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    h = h.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    h ^= h >> 33;
    h
}

/// Whole-object checksum: `mix(sum(header) + sum(payload))`.
#[inline]
pub fn checksum(header: Header, payload_sum: u64) -> u64 {
    let header_sum = salted_sum(&header.to_bytes(), header.salt());
    mix(header_sum.wrapping_add(payload_sum))
}

// ── x86 / x86_64 ────────────────────────────────────────────────────

#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
#[target_feature(enable = "avx2")]
unsafe fn salted_sum_avx2(data: &[u8], salt: u16) -> u64 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;

    const CHUNK: usize = 32;

    unsafe {
        let key = _mm256_set1_epi16(salt as i16);
        let zero = _mm256_setzero_si256();
        let mut acc = _mm256_setzero_si256();

        let chunks = data.chunks_exact(CHUNK);
        let tail = chunks.remainder();
        for chunk in chunks {
            let v = _mm256_loadu_si256(chunk.as_ptr() as *const __m256i);
            // psadbw against zero sums each 8-byte group into a 64-bit lane
            acc = _mm256_add_epi64(acc, _mm256_sad_epu8(_mm256_xor_si256(v, key), zero));
        }

        let mut lanes = [0u64; 4];
        _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, acc);
        let vector_sum = lanes[0]
            .wrapping_add(lanes[1])
            .wrapping_add(lanes[2])
            .wrapping_add(lanes[3]);

        // chunk boundaries are even, so the tail starts on the low salt byte
        vector_sum.wrapping_add(salted_sum_scalar(tail, salt))
    }
}

#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
#[target_feature(enable = "sse2")]
unsafe fn salted_sum_sse2(data: &[u8], salt: u16) -> u64 {
    #[cfg(target_arch = "x86")]
    use std::arch::x86::*;
    #[cfg(target_arch = "x86_64")]
    use std::arch::x86_64::*;

    const CHUNK: usize = 16;

    unsafe {
        let key = _mm_set1_epi16(salt as i16);
        let zero = _mm_setzero_si128();
        let mut acc = _mm_setzero_si128();

        let chunks = data.chunks_exact(CHUNK);
        let tail = chunks.remainder();
        for chunk in chunks {
            let v = _mm_loadu_si128(chunk.as_ptr() as *const __m128i);
            acc = _mm_add_epi64(acc, _mm_sad_epu8(_mm_xor_si128(v, key), zero));
        }

        let mut lanes = [0u64; 2];
        _mm_storeu_si128(lanes.as_mut_ptr() as *mut __m128i, acc);
        lanes[0]
            .wrapping_add(lanes[1])
            .wrapping_add(salted_sum_scalar(tail, salt))
    }
}

// ── aarch64 ─────────────────────────────────────────────────────────

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn salted_sum_neon(data: &[u8], salt: u16) -> u64 {
    use std::arch::aarch64::*;

    const CHUNK: usize = 16;

    unsafe {
        let pattern: [u8; CHUNK] = {
            let k = salt_bytes(salt);
            let mut p = [0u8; CHUNK];
            for (i, b) in p.iter_mut().enumerate() {
                *b = k[i & 1];
            }
            p
        };
        let key = vld1q_u8(pattern.as_ptr());
        let mut acc = vdupq_n_u64(0);

        let chunks = data.chunks_exact(CHUNK);
        let tail = chunks.remainder();
        for chunk in chunks {
            let v = veorq_u8(vld1q_u8(chunk.as_ptr()), key);
            // u8x16 -> u16x8 -> u32x4, then widen-accumulate into u64x2
            let halves = vpaddlq_u8(v);
            let words = vpaddlq_u16(halves);
            acc = vpadalq_u32(acc, words);
        }

        let vector_sum = vgetq_lane_u64(acc, 0).wrapping_add(vgetq_lane_u64(acc, 1));
        vector_sum.wrapping_add(salted_sum_scalar(tail, salt))
    }
}

/// Force a specific path; used by tests and benchmarks to compare against the
/// scalar reference. Falls back to scalar when `level` is unavailable here.
pub fn salted_sum_with(level: SimdLevel, data: &[u8], salt: u16) -> u64 {
    match level {
        #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
        SimdLevel::Avx2 if is_x86_feature_detected!("avx2") => unsafe {
            salted_sum_avx2(data, salt)
        },
        #[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
        SimdLevel::Sse2 if is_x86_feature_detected!("sse2") => unsafe {
            salted_sum_sse2(data, salt)
        },
        #[cfg(target_arch = "aarch64")]
        SimdLevel::Neon => unsafe { salted_sum_neon(data, salt) },
        _ => salted_sum_scalar(data, salt),
    }
}
