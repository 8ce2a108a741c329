//! PrincipalId - fixed-width identity for committee members and destinations
//!
//! The identity layer that authenticates callers lives outside the ledger.
//! Here a principal is an opaque 20-byte address:
//! - Text form is `0x`-prefixed lowercase hex (the prefix is optional on input)
//! - The all-zero address is the null principal and never a valid member
//! - Serializes as its text form in every serde format

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

/// Principal address width in bytes
pub const PRINCIPAL_LEN: usize = 20;

/// Errors parsing a principal from text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrincipalParseError {
    #[error("Invalid hex in principal: {0}")]
    InvalidHex(String),

    #[error("Invalid principal length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Opaque principal identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrincipalId([u8; PRINCIPAL_LEN]);

impl PrincipalId {
    /// The null principal
    pub const ZERO: PrincipalId = PrincipalId([0u8; PRINCIPAL_LEN]);

    pub const fn new(bytes: [u8; PRINCIPAL_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a principal from a byte slice of exactly [`PRINCIPAL_LEN`] bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrincipalParseError> {
        let array: [u8; PRINCIPAL_LEN] =
            bytes
                .try_into()
                .map_err(|_| PrincipalParseError::InvalidLength {
                    expected: PRINCIPAL_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Principal whose low 8 bytes hold `n` big-endian
    ///
    /// Handy for fixtures: `from_low_u64(1)` is `0x00…01`.
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; PRINCIPAL_LEN];
        bytes[PRINCIPAL_LEN - 8..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// True for the null principal
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; PRINCIPAL_LEN]
    }

    pub fn as_bytes(&self) -> &[u8; PRINCIPAL_LEN] {
        &self.0
    }

    /// Lowercase hex without the `0x` prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for PrincipalId {
    type Err = PrincipalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes =
            hex::decode(digits).map_err(|e| PrincipalParseError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl From<[u8; PRINCIPAL_LEN]> for PrincipalId {
    fn from(bytes: [u8; PRINCIPAL_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for PrincipalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PrincipalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
