/// Parses a hex ("0x..") or decimal quantity string. Malformed input is
/// logged and yields 0 so that a single bad field never aborts a batch.
pub fn to_u64(quantity: &str) -> u64 {
    let parsed = match quantity.strip_prefix("0x") {
        Some(digits) if digits.is_empty() => return 0,
        Some(digits) => u64::from_str_radix(digits, 16),
        None if quantity.is_empty() => return 0,
        None => quantity.parse(),
    };

    match parsed {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Error converting {quantity:?} to u64: {e}");
            0
        }
    }
}

pub fn to_u32(quantity: &str) -> u32 {
    to_u64(quantity) as u32
}
