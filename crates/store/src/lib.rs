#![forbid(unsafe_code)]

//! Key-value storage used by the game services.
//!
//! Everything the server remembers between requests lives behind [`Store`]:
//! cooldown records, rate limit counters, leaderboard sets and the weekly
//! essence counter. The production backend is the Upstash Redis REST API,
//! [`MemoryStore`] exists for local runs and tests.

pub mod clock;
pub mod memory;
pub mod upstash;

use async_trait::async_trait;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::MemoryStore;
pub use upstash::UpstashStore;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Store is not configured")]
    Unconfigured,

    #[error("Could not reach store")]
    Request(#[from] reqwest::Error),

    #[error("Could not build store url")]
    Url(#[from] url::ParseError),

    #[error("Store url {0} cannot be used as a base url")]
    CannotBeABase(String),

    #[error("Store responded with status {0}")]
    Status(reqwest::StatusCode),

    #[error("Store returned an error: {0}")]
    Command(String),

    #[error("Unexpected store response for {command}")]
    UnexpectedResponse { command: &'static str },

    #[error("Value at {key} is not an integer")]
    NotAnInteger { key: String },
}

/// The subset of Redis commands the services need.
#[async_trait]
pub trait Store: Send + Sync {
    /// Increments the integer at `key`, creating it at zero first.
    async fn incr(&self, key: &str) -> Result<i64, Error>;

    /// Decrements the integer at `key`, creating it at zero first.
    async fn decr(&self, key: &str) -> Result<i64, Error>;

    /// Sets a time to live on `key`. Returns false when the key does not exist.
    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, Error>;

    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Sets `key` only when it does not exist yet, with an expiry.
    ///
    /// Returns true when the value was written.
    async fn set_nx_ex(&self, key: &str, value: &str, seconds: u64) -> Result<bool, Error>;

    /// Remaining time to live in seconds, `None` if the key is missing or never expires.
    async fn ttl(&self, key: &str) -> Result<Option<u64>, Error>;

    async fn zincrby(&self, key: &str, increment: f64, member: &str) -> Result<f64, Error>;

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, Error>;

    /// Members with scores, highest first, for ranks `start..=stop`.
    async fn zrevrange_withscores(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, f64)>, Error>;
}

/// Stand-in used when no store has been configured.
///
/// Every command fails with [`Error::Unconfigured`] so callers can apply
/// their own policy for a missing backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredStore;

#[async_trait]
impl Store for UnconfiguredStore {
    async fn incr(&self, _key: &str) -> Result<i64, Error> {
        Err(Error::Unconfigured)
    }

    async fn decr(&self, _key: &str) -> Result<i64, Error> {
        Err(Error::Unconfigured)
    }

    async fn expire(&self, _key: &str, _seconds: u64) -> Result<bool, Error> {
        Err(Error::Unconfigured)
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
        Err(Error::Unconfigured)
    }

    async fn set_nx_ex(&self, _key: &str, _value: &str, _seconds: u64) -> Result<bool, Error> {
        Err(Error::Unconfigured)
    }

    async fn ttl(&self, _key: &str) -> Result<Option<u64>, Error> {
        Err(Error::Unconfigured)
    }

    async fn zincrby(&self, _key: &str, _increment: f64, _member: &str) -> Result<f64, Error> {
        Err(Error::Unconfigured)
    }

    async fn zscore(&self, _key: &str, _member: &str) -> Result<Option<f64>, Error> {
        Err(Error::Unconfigured)
    }

    async fn zrevrange_withscores(
        &self,
        _key: &str,
        _start: usize,
        _stop: usize,
    ) -> Result<Vec<(String, f64)>, Error> {
        Err(Error::Unconfigured)
    }
}

impl Error {
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, Error::Unconfigured)
    }
}
