use super::*;
use crate::simd::salted_sum_scalar;

fn sum_of<T: Payload + ?Sized>(value: &T, salt: u16) -> u64 {
    let mut acc = Accumulator::new(salt);
    value.feed(&mut acc);
    acc.sum()
}

// ── Inline selection ────────────────────────────────────────────────

#[test]
fn test_small_scalars_are_inline() {
    assert!(<u8 as Payload>::INLINE);
    assert!(<i16 as Payload>::INLINE);
    assert!(<bool as Payload>::INLINE);
    #[cfg(target_pointer_width = "64")]
    {
        assert!(<i32 as Payload>::INLINE);
        assert!(<f32 as Payload>::INLINE);
        assert!(<char as Payload>::INLINE);
    }
}

#[test]
fn test_word_sized_and_larger_are_owned() {
    assert!(!<usize as Payload>::INLINE);
    assert!(!<u128 as Payload>::INLINE);
    assert!(!<String as Payload>::INLINE);
    assert!(!<[i32; 5] as Payload>::INLINE);
    assert!(!<Vec<u8> as Payload>::INLINE);
}

// ── Byte coverage ───────────────────────────────────────────────────

#[test]
fn test_scalar_feeds_native_bytes() {
    let v: i32 = 100;
    assert_eq!(sum_of(&v, 0x1234), salted_sum_scalar(&v.to_ne_bytes(), 0x1234));
}

#[test]
fn test_array_feeds_one_contiguous_run() {
    let arr = [1i32, 2, 3, 4, 5];
    let bytes: Vec<u8> = arr.iter().flat_map(|v| v.to_ne_bytes()).collect();
    assert_eq!(sum_of(&arr, 0xA5A5), salted_sum_scalar(&bytes, 0xA5A5));
}

#[test]
fn test_string_feeds_content_and_length() {
    let s = String::from("hello");
    let expected = salted_sum_scalar(b"hello", 7) + salted_sum_scalar(&5u64.to_le_bytes(), 7);
    assert_eq!(sum_of(&s, 7), expected);
}

#[test]
fn test_str_and_string_agree() {
    let owned = String::from("uint_test");
    let borrowed: &str = "uint_test";
    assert_eq!(sum_of(&owned, 99), sum_of(&borrowed, 99));
}

#[test]
fn test_vec_length_is_covered() {
    // with a zero salt, appended zero bytes only show up through the length
    let a: Vec<u8> = vec![1, 2];
    let b: Vec<u8> = vec![1, 2, 0, 0];
    assert_ne!(sum_of(&a, 0), sum_of(&b, 0));
}

#[test]
fn test_option_tags_differ() {
    let none: Option<u8> = None;
    let zero: Option<u8> = Some(0);
    assert_ne!(sum_of(&none, 0), sum_of(&zero, 0));
}

#[test]
fn test_bool_and_char() {
    assert_ne!(sum_of(&true, 0), sum_of(&false, 0));
    assert_ne!(sum_of(&'a', 0x55), sum_of(&'b', 0x55));
}

#[test]
fn test_tuple_feeds_each_field() {
    let t = (1u8, 2u16, String::from("x"));
    let mut acc = Accumulator::new(3);
    1u8.feed(&mut acc);
    2u16.feed(&mut acc);
    String::from("x").feed(&mut acc);
    assert_eq!(sum_of(&t, 3), acc.sum());
}

#[test]
fn test_boxed_value_matches_inner() {
    let b = Box::new(12345u64);
    assert_eq!(sum_of(&b, 11), sum_of(&12345u64, 11));
}

// ── payload_fields! ─────────────────────────────────────────────────

struct Point {
    x: i32,
    y: i32,
}

crate::payload_fields!(Point { x, y });

#[test]
fn test_payload_fields_macro() {
    let p = Point { x: 10, y: 20 };
    let mut acc = Accumulator::new(0x0F0F);
    10i32.feed(&mut acc);
    20i32.feed(&mut acc);
    assert_eq!(sum_of(&p, 0x0F0F), acc.sum());
}

#[test]
fn test_accumulator_reports_salt() {
    assert_eq!(Accumulator::new(0xBEEF).salt(), 0xBEEF);
    assert_eq!(Accumulator::new(0xBEEF).sum(), 0);
}
