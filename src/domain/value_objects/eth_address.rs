//! Ethereum wallet address

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A syntactically valid, lower-cased Ethereum address (`0x` + 40 hex digits)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EthAddress(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid Ethereum address: {0}")]
pub struct InvalidAddress(pub String);

impl EthAddress {
    pub fn parse(value: &str) -> Result<Self, InvalidAddress> {
        if Self::is_valid(value) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(InvalidAddress(value.to_string()))
        }
    }

    /// Checks shape only; mixed-case checksums are not enforced.
    pub fn is_valid(value: &str) -> bool {
        let Some(digits) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) else {
            return false;
        };
        digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against an arbitrary string
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EthAddress {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EthAddress {
    type Error = InvalidAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EthAddress> for String {
    fn from(address: EthAddress) -> Self {
        address.0
    }
}
