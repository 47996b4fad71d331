//! Conversions between the string forms callers use and the chain's
//! fixed-width types.

use ethers::types::{Address, H256, U256};
use ethers::utils::to_checksum;

use crate::error::{ContractError, Result};

/// Parse an unsigned integer, inferring the radix from its prefix.
///
/// Accepts an optional `+`, then `0x`/`0X` (hex), `0b`/`0B` (binary),
/// `0o`/`0O` or a bare leading `0` (octal), otherwise decimal. Single `_`
/// separators may appear between digits or right after a prefix. Negative
/// values and values wider than 256 bits are rejected.
pub fn parse_amount(input: &str) -> Result<U256> {
    let invalid = || ContractError::InvalidArgument(format!("wrong number provided: {input}"));

    let digits = input.strip_prefix('+').unwrap_or(input);
    let (radix, body, prefixed) = match digits.as_bytes() {
        [b'0', b'x' | b'X', ..] => (16, &digits[2..], true),
        [b'0', b'b' | b'B', ..] => (2, &digits[2..], true),
        [b'0', b'o' | b'O', ..] => (8, &digits[2..], true),
        [b'0', _, ..] => (8, &digits[1..], true),
        _ => (10, digits, false),
    };

    if body.is_empty()
        || body.ends_with('_')
        || body.contains("__")
        || (!prefixed && body.starts_with('_'))
    {
        return Err(invalid());
    }

    let base = U256::from(radix);
    let mut value = U256::zero();
    let mut seen_digit = false;
    for c in body.chars().filter(|c| *c != '_') {
        let digit = c.to_digit(radix).ok_or_else(invalid)?;
        value = value
            .checked_mul(base)
            .and_then(|v| v.checked_add(U256::from(digit)))
            .ok_or_else(invalid)?;
        seen_digit = true;
    }
    if !seen_digit {
        return Err(invalid());
    }
    Ok(value)
}

/// Parse a 20-byte hex address, with or without `0x`. Surrounding
/// whitespace is rejected, as in [`parse_amount`].
pub fn parse_address(input: &str) -> Result<Address> {
    let hex = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if hex.len() != 40 {
        return Err(ContractError::InvalidArgument(format!(
            "wrong address provided: {input}"
        )));
    }
    hex.parse::<Address>()
        .map_err(|_| ContractError::InvalidArgument(format!("wrong address provided: {input}")))
}

/// Left-pad an address into a 32-byte log topic.
pub fn address_topic(address: Address) -> H256 {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    H256(word)
}

/// Interpret an ABI word as an address: the trailing 20 bytes, left-padded
/// with zeros when the input is shorter.
pub fn word_to_address(word: &[u8]) -> Address {
    let mut bytes = [0u8; 20];
    let tail = &word[word.len().saturating_sub(20)..];
    bytes[20 - tail.len()..].copy_from_slice(tail);
    Address::from(bytes)
}

/// Interpret an ABI word as a big-endian unsigned integer (trailing 32 bytes).
pub fn word_to_u256(word: &[u8]) -> U256 {
    let tail = &word[word.len().saturating_sub(32)..];
    U256::from_big_endian(tail)
}

/// Decimal rendering of an ABI word.
pub fn word_to_decimal(word: &[u8]) -> String {
    word_to_u256(word).to_string()
}

/// EIP-55 mixed-case rendering.
pub fn checksummed(address: Address) -> String {
    to_checksum(&address, None)
}
