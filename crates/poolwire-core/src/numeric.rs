//! Lenient parsing of the numeric and hex fields the pool service sends.
//!
//! Monetary amounts arrive either as decimal strings (`"255"`), as
//! `0x`-prefixed hex strings (`"0xff"`) or occasionally as bare JSON numbers.
//! Hashes and addresses may arrive in short form (`"0x01"`) and are
//! left-padded to their full width.

use alloy::primitives::{Address, Bytes, B256, U256};
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer};

use crate::error::DecodeError;

/// Parse an integer, picking the base from the `0x` prefix. Empty input is zero.
pub fn parse_u256(s: &str) -> Result<U256, DecodeError> {
    let s = s.trim();
    let err = || DecodeError::Integer { value: s.to_string() };
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some("") => return Ok(U256::ZERO),
        Some(hex) => U256::from_str_radix(hex, 16),
        None if s.is_empty() => return Ok(U256::ZERO),
        None => U256::from_str_radix(s, 10),
    };
    parsed.map_err(|_| err())
}

/// Decode hex with or without a `0x` prefix. Odd-length input gets a leading zero nibble.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, DecodeError> {
    let s = s.trim();
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if digits.len() % 2 == 1 {
        Ok(hex::decode(format!("0{digits}"))?)
    } else {
        Ok(hex::decode(digits)?)
    }
}

/// Copy `bytes` right-aligned into an `N`-byte array, keeping the low-order
/// bytes when the input is too long.
fn left_pad<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let take = bytes.len().min(N);
    out[N - take..].copy_from_slice(&bytes[bytes.len() - take..]);
    out
}

pub fn parse_hash(s: &str) -> Result<B256, DecodeError> {
    Ok(B256::from(left_pad::<32>(&decode_hex(s)?)))
}

pub fn parse_address(s: &str) -> Result<Address, DecodeError> {
    Ok(Address::from(left_pad::<20>(&decode_hex(s)?)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

/// Serde adapter for [`parse_u256`]: accepts a decimal string, a hex string or
/// a JSON number. `null` decodes as zero.
pub fn deserialize_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(U256::ZERO),
        Some(NumberOrString::Number(n)) => Ok(U256::from(n)),
        Some(NumberOrString::String(s)) => parse_u256(&s).map_err(de::Error::custom),
    }
}

pub fn deserialize_hash<'de, D>(deserializer: D) -> Result<B256, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_hash(&s).map_err(de::Error::custom)
}

pub fn deserialize_address<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_address(&s).map_err(de::Error::custom)
}

/// Missing, `null` or empty-string recipients decode as `None` (contract creation).
pub fn deserialize_opt_address<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_address(&s).map(Some).map_err(de::Error::custom),
    }
}

pub fn deserialize_bytes<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    decode_hex(&s).map(Bytes::from).map_err(de::Error::custom)
}

/// Unix-epoch seconds to an absolute UTC time.
pub fn deserialize_unix_seconds<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = i64::deserialize(deserializer)?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| de::Error::custom(DecodeError::Timestamp(secs)))
}
