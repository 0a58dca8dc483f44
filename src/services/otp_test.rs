use super::*;

// ===== generate_otp =====

#[test]
fn generate_otp_has_requested_length() {
    for len in [1, 4, OTP_LEN, 10] {
        let code = generate_otp(len);
        assert_eq!(code.len(), len);
    }
}

#[test]
fn generate_otp_is_all_decimal_digits() {
    let code = generate_otp(OTP_LEN);
    assert!(code.chars().all(|c| c.is_ascii_digit()), "non-digit in {code}");
}

#[test]
fn generate_otp_zero_length_is_empty() {
    assert_eq!(generate_otp(0), "");
}

#[test]
fn generate_otp_covers_all_digits_eventually() {
    // 200 six-digit codes make a missing digit value astronomically unlikely;
    // catches an off-by-one in the sampled range.
    let mut seen = [false; 10];
    for _ in 0..200 {
        for c in generate_otp(OTP_LEN).chars() {
            seen[c as usize - '0' as usize] = true;
        }
    }
    assert!(seen.iter().all(|&s| s), "digit never generated: {seen:?}");
}

// ===== store / retrieve / clear =====

#[test]
fn store_then_retrieve_returns_code() {
    let mut store = KvStore::in_memory();
    store_otp(&mut store, "9876543210", "042137").unwrap();
    assert_eq!(retrieve_otp(&store, "9876543210"), Some("042137".to_owned()));
}

#[test]
fn store_overwrites_not_accumulates() {
    let mut store = KvStore::in_memory();
    store_otp(&mut store, "9876543210", "111111").unwrap();
    store_otp(&mut store, "9876543210", "222222").unwrap();
    assert_eq!(retrieve_otp(&store, "9876543210"), Some("222222".to_owned()));
    assert_eq!(store.len(), 1);
}

#[test]
fn retrieve_unknown_phone_is_none() {
    let store = KvStore::in_memory();
    assert_eq!(retrieve_otp(&store, "0000000000"), None);
}

#[test]
fn codes_are_keyed_per_phone() {
    let mut store = KvStore::in_memory();
    store_otp(&mut store, "1111111111", "123456").unwrap();
    store_otp(&mut store, "2222222222", "654321").unwrap();
    assert_eq!(retrieve_otp(&store, "1111111111"), Some("123456".to_owned()));
    assert_eq!(retrieve_otp(&store, "2222222222"), Some("654321".to_owned()));
}

#[test]
fn clear_removes_code() {
    let mut store = KvStore::in_memory();
    store_otp(&mut store, "9876543210", "042137").unwrap();
    clear_otp(&mut store, "9876543210").unwrap();
    assert_eq!(retrieve_otp(&store, "9876543210"), None);
}

#[test]
fn clear_twice_is_safe() {
    let mut store = KvStore::in_memory();
    clear_otp(&mut store, "9876543210").unwrap();
    clear_otp(&mut store, "9876543210").unwrap();
}

// ===== verify_otp =====

#[test]
fn verify_exact_match_passes() {
    assert!(verify_otp("042137", "042137"));
}

#[test]
fn verify_mismatch_fails() {
    assert!(!verify_otp("042137", "042138"));
}

#[test]
fn verify_does_not_normalize() {
    assert!(!verify_otp(" 042137", "042137"));
    assert!(!verify_otp("042137 ", "042137"));
    assert!(!verify_otp("42137", "042137"));
}
