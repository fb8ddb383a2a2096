/// Short recipe link codes
///
/// A short code is the recipe ID written in base 62 (`0-9a-zA-Z`). Codes are
/// deterministic, so asking for the link of the same recipe twice yields the
/// same URL and no mapping table is needed.

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Path prefix short links are served under
pub const SHORT_LINK_PREFIX: &str = "/s/";

/// Encodes a recipe ID as a short code
///
/// Negative IDs never occur (IDs come from a BIGSERIAL) and encode as `"0"`.
pub fn encode(id: i64) -> String {
    let mut value = u64::try_from(id).unwrap_or(0);
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 62) as usize]);
        value /= 62;
    }
    digits.reverse();

    digits.into_iter().map(char::from).collect()
}

/// Decodes a short code back into a recipe ID
///
/// Returns `None` for empty codes, foreign characters or overflow.
pub fn decode(code: &str) -> Option<i64> {
    if code.is_empty() {
        return None;
    }

    let mut value: i64 = 0;
    for byte in code.bytes() {
        let digit = ALPHABET.iter().position(|c| *c == byte)?;
        value = value.checked_mul(62)?.checked_add(digit as i64)?;
    }

    Some(value)
}
