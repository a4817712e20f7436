use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::{models::Fish, wallet::Wallet};

const SCORE_KEY: &str = "leaderboard:score";
const CATCHES_KEY: &str = "leaderboard:catches";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub wallet: String,
    pub score: f64,
    pub catches: u64,
}

#[derive(Clone)]
pub struct Leaderboard {
    store: Arc<dyn Store>,
}

impl Leaderboard {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Adds a catch to the wallet's totals and returns its new score.
    pub async fn record(&self, wallet: &Wallet, fish: &Fish) -> Result<f64, store::Error> {
        let points = fish.rarity.points() as f64;

        self.store.zincrby(CATCHES_KEY, 1.0, wallet.as_str()).await?;
        let score = self.store.zincrby(SCORE_KEY, points, wallet.as_str()).await?;

        info!("{wallet} caught {fish} worth {points} points, now at {score}");

        Ok(score)
    }

    pub async fn top(&self, count: usize) -> Result<Vec<Entry>, store::Error> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let ranked = self
            .store
            .zrevrange_withscores(SCORE_KEY, 0, count - 1)
            .await?;

        let mut entries = Vec::with_capacity(ranked.len());
        for (wallet, score) in ranked {
            let catches = self
                .store
                .zscore(CATCHES_KEY, &wallet)
                .await?
                .unwrap_or_default();

            entries.push(Entry {
                wallet,
                score,
                catches: catches as u64,
            });
        }

        Ok(entries)
    }
}
