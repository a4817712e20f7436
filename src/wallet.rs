use std::{fmt::Display, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WALLET_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap());

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Wallet address required")]
    Missing,

    #[error("Invalid Solana wallet address")]
    Invalid,
}

/// A base58 Solana address of 32 to 44 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Wallet(String);

impl Wallet {
    pub fn parse(input: &str) -> Result<Self, Error> {
        let input = input.trim();

        if input.is_empty() {
            return Err(Error::Missing);
        }

        if !WALLET_REGEX.is_match(input) {
            return Err(Error::Invalid);
        }

        Ok(Self(input.to_string()))
    }

    /// Validates an optional request field.
    pub fn from_field(field: Option<&str>) -> Result<Self, Error> {
        Self::parse(field.ok_or(Error::Missing)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Wallet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Wallet {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Wallet> for String {
    fn from(wallet: Wallet) -> Self {
        wallet.0
    }
}

impl AsRef<str> for Wallet {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
