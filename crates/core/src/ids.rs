//! Identifier generation for products and sales transactions.
//!
//! Both formats combine a base-36 millisecond timestamp fragment with a few
//! random bytes. They are short rather than globally unique, so callers
//! check for collisions before inserting (see [`MAX_ID_ATTEMPTS`]).

use rand::Rng;

use crate::types::Timestamp;

/// Prefix of every product identifier.
pub const PRODUCT_ID_PREFIX: &str = "PRD_";

/// Transaction identifiers never exceed this many characters.
pub const MAX_TRANSACTION_ID_LEN: usize = 10;

/// How many candidate identifiers to try before giving up.
pub const MAX_ID_ATTEMPTS: usize = 5;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encode a non-negative integer in lowercase base 36.
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

fn last_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(n)).collect()
}

fn random_hex(len_bytes: usize) -> String {
    let mut rng = rand::rng();
    (0..len_bytes)
        .map(|_| format!("{:02x}", rng.random::<u8>()))
        .collect()
}

fn timestamp_base36(now: Timestamp) -> String {
    to_base36(u64::try_from(now.timestamp_millis()).unwrap_or(0))
}

/// `PRD_<last 4 base-36 timestamp chars>_<6 hex chars>`, uppercased.
pub fn generate_product_id(now: Timestamp) -> String {
    let stamp = last_chars(&timestamp_base36(now), 4);
    format!("{PRODUCT_ID_PREFIX}{stamp}_{}", random_hex(3)).to_uppercase()
}

/// `T` + last 2 alphanumeric owner chars + last 3 base-36 timestamp chars +
/// 2 hex chars, uppercased and capped at [`MAX_TRANSACTION_ID_LEN`].
///
/// Only alphanumerics are taken from the owner so the id stays path-safe.
pub fn generate_transaction_id(owner_id: &str, now: Timestamp) -> String {
    let alnum: String = owner_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let owner_part = if alnum.is_empty() {
        "XX".to_string()
    } else {
        last_chars(&alnum, 2)
    };
    let stamp = last_chars(&timestamp_base36(now), 3);
    format!("T{owner_part}{stamp}{}", random_hex(1))
        .to_uppercase()
        .chars()
        .take(MAX_TRANSACTION_ID_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "zz");
    }

    #[test]
    fn test_product_id_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let id = generate_product_id(now);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3, "unexpected id {id}");
        assert_eq!(parts[0], "PRD");
        assert_eq!(parts[1].len(), 4);
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, id.to_uppercase());
    }

    #[test]
    fn test_transaction_id_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let id = generate_transaction_id("user_ab12cd34", now);
        assert!(id.len() <= MAX_TRANSACTION_ID_LEN);
        assert!(id.starts_with("T34"), "unexpected id {id}");
        assert_eq!(id.len(), 8);
        assert_eq!(id, id.to_uppercase());
    }

    #[test]
    fn test_transaction_id_without_owner() {
        let id = generate_transaction_id("", Utc::now());
        assert!(id.starts_with("TXX"));
    }

    #[test]
    fn test_transaction_id_skips_symbols_in_owner() {
        let id = generate_transaction_id("tab/7?", Utc::now());
        assert!(id.starts_with("TB7"), "unexpected id {id}");
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));

        let id = generate_transaction_id("--", Utc::now());
        assert!(id.starts_with("TXX"));
    }

    #[test]
    fn test_transaction_id_with_short_owner() {
        let id = generate_transaction_id("a", Utc::now());
        assert!(id.starts_with("TA"));
        assert!(id.len() <= MAX_TRANSACTION_ID_LEN);
    }
}
