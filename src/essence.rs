//! Primordial Essence, a bonus drop with a global weekly cap.
//!
//! The chance of finding one shrinks as the weekly supply runs out and grows
//! as the week runs out, so the supply tends to be gone by the end of the week.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use store::{Clock, Store};

use crate::{config::EssenceConfig, wallet::Wallet};

/// Long enough to outlive the week it counts.
const COUNTER_TTL: u64 = 8 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssenceRoll {
    pub found: bool,
    pub remaining: i64,
}

#[derive(Clone)]
pub struct EssencePool {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    config: EssenceConfig,
}

/// Counter key for the ISO week containing `now`.
pub fn week_key(now: DateTime<Utc>) -> String {
    let week = now.iso_week();
    format!("essence:remaining:{}-W{:02}", week.year(), week.week())
}

/// Days left in the ISO week, counting today.
pub fn days_left(now: DateTime<Utc>) -> u32 {
    7 - now.weekday().num_days_from_monday()
}

/// `remaining / (days_left * expected_daily_casts)`, clamped to `[0, 1]`.
pub fn chance(remaining: i64, days_left: u32, expected_daily_casts: u32) -> f64 {
    let casts = days_left.max(1) as f64 * expected_daily_casts.max(1) as f64;
    (remaining.max(0) as f64 / casts).clamp(0.0, 1.0)
}

impl EssencePool {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, config: EssenceConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    #[cfg(test)]
    pub async fn remaining(&self) -> Result<i64, store::Error> {
        let key = week_key(self.clock.now());
        self.ensure_week(&key).await?;
        self.read(&key).await
    }

    async fn ensure_week(&self, key: &str) -> Result<(), store::Error> {
        if self
            .store
            .set_nx_ex(key, &self.config.weekly_cap.to_string(), COUNTER_TTL)
            .await?
        {
            info!("Opened {key} with {} essences", self.config.weekly_cap);
        }
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<i64, store::Error> {
        match self.store.get(key).await? {
            Some(value) => value.parse().map_err(|_| store::Error::NotAnInteger {
                key: key.to_string(),
            }),
            None => Ok(self.config.weekly_cap),
        }
    }

    /// Rolls for an essence with a uniform `draw` in `[0, 1)`.
    pub async fn roll(&self, wallet: &Wallet, draw: f64) -> Result<EssenceRoll, store::Error> {
        let now = self.clock.now();
        let key = week_key(now);
        self.ensure_week(&key).await?;

        let remaining = self.read(&key).await?;
        if remaining <= 0 {
            return Ok(EssenceRoll {
                found: false,
                remaining: 0,
            });
        }

        let chance = chance(remaining, days_left(now), self.config.expected_daily_casts);
        debug!("{wallet} rolls {draw:.4} against {chance:.4} with {remaining} left");

        if draw >= chance {
            return Ok(EssenceRoll {
                found: false,
                remaining,
            });
        }

        let remaining = self.store.decr(&key).await?;
        if remaining < 0 {
            // someone else took the last one between read and decrement
            self.store.incr(&key).await?;
            warn!("{wallet} lost the race for the last essence");
            return Ok(EssenceRoll {
                found: false,
                remaining: 0,
            });
        }

        info!("{wallet} found a Primordial Essence, {remaining} left this week");

        Ok(EssenceRoll {
            found: true,
            remaining,
        })
    }
}
