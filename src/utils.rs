// Utility functions

use crate::{
    constants::PUBLIC_KEY_HEX_LEN,
    error::{AppError, Result},
};

/// Renders a raw integer token amount with `decimals` fractional digits.
///
/// The shift is done on the decimal text, so amounts larger than any machine
/// integer are rendered exactly. Trailing fractional zeros are dropped.
pub fn format_balance(value: &str, decimals: u8) -> Result<String> {
    let raw = value.trim();
    let raw = if raw.is_empty() { "0" } else { raw };
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "balance must be an unsigned integer, got {value:?}"
        )));
    }

    let digits = raw.trim_start_matches('0');
    let decimals = decimals as usize;
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits.to_string()
    };

    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        Ok(whole.to_string())
    } else {
        Ok(format!("{whole}.{fraction}"))
    }
}

/// Lower-cases a TON public key and adds the `0x` prefix when it is missing.
/// Values that are not 64-hex keys are only lower-cased.
pub fn normalize_ton_pub_key(value: &str) -> String {
    let result = value.to_ascii_lowercase();
    let (has_prefix, body) = match result.strip_prefix("0x") {
        Some(body) => (true, body),
        None => (false, result.as_str()),
    };

    let is_key = body.len() == PUBLIC_KEY_HEX_LEN && hex::decode(body).is_ok();
    if is_key && !has_prefix {
        return format!("0x{result}");
    }
    result
}
