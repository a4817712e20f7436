//! Once-per-day casting limit per wallet.
//!
//! A cast is recorded as `cooldown:<wallet>` with a 24 hour expiry using a
//! single set-if-not-exists, so two simultaneous casts from one wallet cannot
//! both be recorded. The record expiring is what reopens the wallet.

use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use store::{Clock, Store};

use crate::{
    config::{CooldownConfig, UnconfiguredPolicy},
    wallet::Wallet,
};

const KEY_PREFIX: &str = "cooldown:";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cooldown store is not configured")]
    Unconfigured,

    #[error("Could not reach cooldown store")]
    Store(#[source] store::Error),
}

impl From<store::Error> for Error {
    fn from(err: store::Error) -> Self {
        match err {
            store::Error::Unconfigured => Error::Unconfigured,
            err => Error::Store(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownStatus {
    pub can_play: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unlimited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_in_seconds: Option<u64>,
}

impl CooldownStatus {
    pub fn unlimited() -> Self {
        Self {
            can_play: true,
            unlimited: true,
            reset_in_seconds: None,
        }
    }

    pub fn ready() -> Self {
        Self {
            can_play: true,
            unlimited: false,
            reset_in_seconds: None,
        }
    }

    pub fn cooling_down(reset_in_seconds: Option<u64>) -> Self {
        Self {
            can_play: false,
            unlimited: false,
            reset_in_seconds,
        }
    }

    /// Whether a cast may start, either because the wallet is fresh or unlimited.
    pub fn may_cast(&self) -> bool {
        self.can_play || self.unlimited
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Recorded,
    Unlimited,
    AlreadyPlayed { reset_in_seconds: Option<u64> },
}

#[derive(Clone)]
pub struct CooldownGate {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    config: CooldownConfig,
}

impl CooldownGate {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, config: CooldownConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    fn key(wallet: &Wallet) -> String {
        format!("{KEY_PREFIX}{wallet}")
    }

    fn is_unlimited(&self, wallet: &Wallet) -> bool {
        self.config.unlimited.contains(wallet)
    }

    fn bypassed(&self) -> bool {
        self.config.unconfigured == UnconfiguredPolicy::Bypass
    }

    pub async fn can_play(&self, wallet: &Wallet) -> Result<CooldownStatus, Error> {
        if self.is_unlimited(wallet) {
            return Ok(CooldownStatus::unlimited());
        }

        let key = Self::key(wallet);
        let played_at = match self.store.get(&key).await {
            Ok(played_at) => played_at,
            Err(store::Error::Unconfigured) if self.bypassed() => {
                return Ok(CooldownStatus::unlimited())
            }
            Err(err) => return Err(err.into()),
        };

        let Some(played_at) = played_at else {
            return Ok(CooldownStatus::ready());
        };

        let reset_in_seconds = self.store.ttl(&key).await?;
        debug!("{wallet} already played at {played_at}, resets in {reset_in_seconds:?}s");

        Ok(CooldownStatus::cooling_down(reset_in_seconds))
    }

    pub async fn mark_played(&self, wallet: &Wallet) -> Result<Mark, Error> {
        if self.is_unlimited(wallet) {
            return Ok(Mark::Unlimited);
        }

        let key = Self::key(wallet);
        let now = self.clock.now().to_rfc3339();

        match self
            .store
            .set_nx_ex(&key, &now, self.config.window_seconds)
            .await
        {
            Ok(true) => {
                info!("{wallet} cast at {now}");
                Ok(Mark::Recorded)
            }
            Ok(false) => Ok(Mark::AlreadyPlayed {
                reset_in_seconds: self.store.ttl(&key).await?,
            }),
            Err(store::Error::Unconfigured) if self.bypassed() => Ok(Mark::Unlimited),
            Err(err) => Err(err.into()),
        }
    }
}
