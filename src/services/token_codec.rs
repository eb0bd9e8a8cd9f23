// Decoders for TIP-3 ABI outputs returned by local contract runs.

use crate::{
    error::{AppError, Result},
    models::{Address, TokenDetails},
    utils::normalize_ton_pub_key,
};
use base64::{
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
    Engine as _,
};
use serde_json::Value;

/// Returns the `value0` output of a responsible getter.
pub fn value0<'a>(output: &'a Value, method: &str) -> Result<&'a Value> {
    output
        .get("value0")
        .ok_or_else(|| AppError::Decode(format!("{method} output is missing value0")))
}

/// Returns the output named `name`, falling back to `value0` for responsible getters.
pub fn named_or_value0<'a>(output: &'a Value, name: &str, method: &str) -> Result<&'a Value> {
    match output.get(name) {
        Some(value) => Ok(value),
        None => value0(output, method),
    }
}

/// Decodes a base64 payload holding UTF-8 text (token name or symbol).
///
/// Multi-byte sequences are decoded as UTF-8, never byte-per-char.
pub fn decode_base64_text(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let bytes = STANDARD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| AppError::Decode(format!("invalid base64 '{trimmed}': {e}")))?;
    String::from_utf8(bytes).map_err(|e| AppError::Decode(format!("invalid UTF-8 text: {e}")))
}

pub fn encode_base64_text(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

pub fn decode_string(value: &Value, field: &str) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::Decode(format!("{field} must be a string")))
}

/// Decodes an unsigned integer into its decimal text without going through a
/// fixed-width number.
pub fn decode_uint_text(value: &Value, field: &str) -> Result<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) if number.is_u64() => number.to_string(),
        _ => {
            return Err(AppError::Decode(format!(
                "{field} must be an unsigned integer"
            )))
        }
    };
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Decode(format!(
            "{field} '{text}' is not a decimal integer"
        )));
    }
    Ok(text)
}

pub fn decode_decimals(value: &Value) -> Result<u8> {
    let text = decode_uint_text(value, "decimals")?;
    text.parse::<u8>()
        .map_err(|e| AppError::Decode(format!("decimals '{text}' out of range: {e}")))
}

pub fn decode_address(value: &Value, field: &str) -> Result<Address> {
    let raw = decode_string(value, field)?;
    Address::parse(&raw).map_err(|e| AppError::Decode(format!("{field}: {e}")))
}

// Internal helper that supports `field` operations.
fn field<'a>(value: &'a Value, name: &str) -> Result<&'a Value> {
    value
        .get(name)
        .ok_or_else(|| AppError::Decode(format!("getDetails output is missing {name}")))
}

/// Decodes the `value0` struct of `getDetails`.
pub fn decode_token_details(details: &Value) -> Result<TokenDetails> {
    if !details.is_object() {
        return Err(AppError::Decode("getDetails value0 must be an object".into()));
    }
    Ok(TokenDetails {
        name: decode_base64_text(&decode_string(field(details, "name")?, "name")?)?,
        symbol: decode_base64_text(&decode_string(field(details, "symbol")?, "symbol")?)?,
        decimals: decode_decimals(field(details, "decimals")?)?,
        total_supply: decode_uint_text(field(details, "total_supply")?, "total_supply")?,
        root_owner_address: decode_address(
            field(details, "root_owner_address")?,
            "root_owner_address",
        )?,
        root_public_key: normalize_ton_pub_key(&decode_string(
            field(details, "root_public_key")?,
            "root_public_key",
        )?),
    })
}
