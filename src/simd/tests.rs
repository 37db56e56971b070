use super::*;
use crate::header::Header;
use proptest::prelude::*;

fn make_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i * 31 % 251) as u8).collect()
}

const ALL_LEVELS: [SimdLevel; 4] = [
    SimdLevel::Scalar,
    SimdLevel::Sse2,
    SimdLevel::Avx2,
    SimdLevel::Neon,
];

// ── Scalar reference ────────────────────────────────────────────────

#[test]
fn test_scalar_empty() {
    assert_eq!(salted_sum_scalar(b"", 0xFFFF), 0);
}

#[test]
fn test_scalar_zero_salt_is_plain_sum() {
    assert_eq!(salted_sum_scalar(&[1, 2, 3, 250], 0), 256);
}

#[test]
fn test_scalar_parity_uses_both_salt_bytes() {
    // even offsets ^ 0x0F, odd offsets ^ 0xF0
    let sum = salted_sum_scalar(&[0x00, 0x00, 0x0F], 0xF00F);
    assert_eq!(sum, 0x0F + 0xF0);
}

#[test]
fn test_scalar_single_byte_change_changes_sum() {
    let a = [10u8, 20, 30, 40, 50];
    let mut b = a;
    b[3] = 41;
    for salt in [0u16, 1, 0x00FF, 0xFF00, 0xABCD, 0xFFFF] {
        assert_ne!(salted_sum_scalar(&a, salt), salted_sum_scalar(&b, salt));
    }
}

// ── Vector paths match scalar ───────────────────────────────────────

#[test]
fn test_dispatch_matches_scalar_lengths() {
    let data = make_data(300);
    for len in 0..data.len() {
        let slice = &data[..len];
        assert_eq!(
            salted_sum(slice, 0x5A3C),
            salted_sum_scalar(slice, 0x5A3C),
            "len={len}"
        );
    }
}

#[test]
fn test_every_level_matches_scalar() {
    let data = make_data(1027);
    for level in ALL_LEVELS {
        for salt in [0u16, 0x0001, 0x8000, 0xA5A5, 0xFFFF] {
            assert_eq!(
                salted_sum_with(level, &data, salt),
                salted_sum_scalar(&data, salt),
                "level={} salt={salt:#x}",
                level.name()
            );
        }
    }
}

#[test]
fn test_unaligned_start() {
    let data = make_data(200);
    for start in 1..8 {
        let slice = &data[start..];
        assert_eq!(salted_sum(slice, 0x1234), salted_sum_scalar(slice, 0x1234));
    }
}

#[test]
fn test_large_buffer_all_ones() {
    let data = vec![0xFFu8; 1 << 20];
    // 0xFF ^ 0x00 = 255 on every byte
    assert_eq!(salted_sum(&data, 0), 255 * (1 << 20));
}

#[test]
fn test_simd_level_reports_a_width() {
    let level = simd_level();
    assert!(level.width() == 1 || level.width() % 16 == 0);
    assert!(!level.name().is_empty());
}

proptest! {
    #[test]
    fn prop_dispatch_equals_scalar(data in proptest::collection::vec(any::<u8>(), 0..600), salt in any::<u16>()) {
        prop_assert_eq!(salted_sum(&data, salt), salted_sum_scalar(&data, salt));
    }

    #[test]
    fn prop_bit_flip_detected(
        data in proptest::collection::vec(any::<u8>(), 1..256),
        salt in any::<u16>(),
        idx in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let i = idx.index(data.len());
        let mut flipped = data.clone();
        flipped[i] ^= 1 << bit;
        prop_assert_ne!(salted_sum(&data, salt), salted_sum(&flipped, salt));
    }
}

// ── Mixing and whole-object checksum ────────────────────────────────

#[test]
fn test_mix_zero_fixed_point() {
    assert_eq!(mix(0), 0);
}

#[test]
fn test_mix_avalanche() {
    let a = mix(0x1000);
    let b = mix(0x1001);
    // a one-bit input change should flip a large share of output bits
    assert!((a ^ b).count_ones() > 16, "{a:#x} vs {b:#x}");
}

#[test]
fn test_mix_distinct_inputs() {
    let outputs: std::collections::HashSet<u64> = (0..10_000u64).map(mix).collect();
    assert_eq!(outputs.len(), 10_000);
}

#[test]
fn test_checksum_nonzero_for_valid_header() {
    for salt in [0u16, 0x2F48, 0x4844, 0xFFFF] {
        assert_ne!(checksum(Header::new(4, salt), 0), 0);
    }
}

#[test]
fn test_checksum_depends_on_salt() {
    let payload = [100u8, 0, 0, 0];
    let a = checksum(Header::new(4, 1), salted_sum(&payload, 1));
    let b = checksum(Header::new(4, 2), salted_sum(&payload, 2));
    assert_ne!(a, b);
}
