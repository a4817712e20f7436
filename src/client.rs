//! HTTP client for the game server, used by the terminal client.
//!
//! The cooldown calls fail closed: when the server cannot answer, the wallet
//! is treated as cooling down rather than free to cast.

use log::warn;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    cooldown::{CooldownStatus, Mark},
    essence::EssenceRoll,
    models::Fish,
    wallet::Wallet,
};

pub const DEFAULT_SERVER: &str = "http://localhost:3030";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkReply {
    #[serde(default)]
    unlimited: bool,
    reset_in_seconds: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct PitClient {
    client: Client,
    base: String,
}

impl PitClient {
    pub fn new(base: &str) -> Self {
        Self {
            client: Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    pub async fn record_wallet(&self, wallet: &Wallet) -> reqwest::Result<()> {
        self.client
            .post(self.url("record-wallet"))
            .json(&json!({ "wallet": wallet }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn fetch_cooldown(&self, wallet: &Wallet) -> reqwest::Result<CooldownStatus> {
        self.client
            .get(self.url("cooldown"))
            .query(&[("wallet", wallet.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// Asks whether the wallet may cast. Any failure counts as cooling down.
    pub async fn cooldown(&self, wallet: &Wallet) -> CooldownStatus {
        match self.fetch_cooldown(wallet).await {
            Ok(status) => status,
            Err(err) => {
                warn!("Could not check cooldown of {wallet}: {err}");
                CooldownStatus::cooling_down(None)
            }
        }
    }

    /// Claims today's cast. A wallet that already played gets
    /// [`Mark::AlreadyPlayed`], server failures are errors.
    pub async fn mark_played(&self, wallet: &Wallet) -> reqwest::Result<Mark> {
        let response = self
            .client
            .post(self.url("cooldown"))
            .json(&json!({ "wallet": wallet }))
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let reply: MarkReply = response.json().await?;
            return Ok(Mark::AlreadyPlayed {
                reset_in_seconds: reply.reset_in_seconds,
            });
        }

        let reply: MarkReply = response.error_for_status()?.json().await?;
        Ok(if reply.unlimited {
            Mark::Unlimited
        } else {
            Mark::Recorded
        })
    }

    pub async fn record_catch(&self, wallet: &Wallet, fish: &Fish) -> reqwest::Result<()> {
        self.client
            .post(self.url("leaderboard"))
            .json(&json!({ "wallet": wallet, "fish": fish }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn roll_essence(&self, wallet: &Wallet) -> reqwest::Result<EssenceRoll> {
        self.client
            .post(self.url("primordial-essence"))
            .json(&json!({ "wallet": wallet }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}
