#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod cooldown;
pub mod essence;
pub mod generator;
pub mod leaderboard;
pub mod models;
pub mod nft;
pub mod rate_limit;
pub mod session;
pub mod wallet;

pub use config::Config;
