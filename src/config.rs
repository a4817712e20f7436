use std::{collections::HashSet, env, net::SocketAddr, str::FromStr, sync::Arc};

use log::{info, warn};
use secrecy::SecretString;
use store::{Clock, MemoryStore, Store, UnconfiguredStore, UpstashStore};
use url::{Origin, Url};

use crate::wallet::Wallet;

pub const DEFAULT_ORIGIN: &str = "https://midevil-fishing.vercel.app";
pub const DEFAULT_HELIUS_URL: &str = "https://mainnet.helius-rpc.com/";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Environent variable {name} not set")]
    EnvarNotSet {
        source: env::VarError,
        name: &'static str,
    },

    #[error("Environent variable {name} has an invalid value {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Unlimited wallet {0:?} is not a valid wallet address")]
    InvalidUnlimitedWallet(String),

    #[error("Store backend upstash needs {0}")]
    MissingStoreCredential(&'static str),

    #[error("Could not create store client")]
    Store(#[from] store::Error),
}

#[inline]
pub fn env_var(name: &'static str) -> Result<String, Error> {
    env::var(name).map_err(|source| Error::EnvarNotSet { source, name })
}

fn optional_env_var(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_var<T: FromStr>(name: &'static str, default: T) -> Result<T, Error> {
    match optional_env_var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::InvalidValue { name, value }),
        None => Ok(default),
    }
}

/// Reduces an url to `scheme://host[:port]`, the form browsers send as `Origin`.
fn origin_of(value: &str) -> Option<String> {
    match Url::parse(value.trim()).ok()?.origin() {
        origin @ Origin::Tuple(..) => Some(origin.ascii_serialization()),
        Origin::Opaque(_) => None,
    }
}

fn allowed_origin() -> Result<String, Error> {
    match optional_env_var("ALLOWED_ORIGIN") {
        Some(value) => origin_of(&value).ok_or(Error::InvalidValue {
            name: "ALLOWED_ORIGIN",
            value,
        }),
        None => Ok(DEFAULT_ORIGIN.to_string()),
    }
}

/// What a subsystem does when no store backend is configured at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnconfiguredPolicy {
    /// Let requests through as if there was no limit.
    Bypass,
    /// Refuse requests as if the store was unreachable.
    Deny,
}

impl FromStr for UnconfiguredPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bypass" | "allow" => Ok(Self::Bypass),
            "deny" => Ok(Self::Deny),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Upstash,
    Memory,
    None,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upstash" => Ok(Self::Upstash),
            "memory" => Ok(Self::Memory),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: i64,
    pub window_seconds: u64,
    pub unconfigured: UnconfiguredPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_seconds: 60,
            unconfigured: UnconfiguredPolicy::Bypass,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CooldownConfig {
    pub window_seconds: u64,
    pub unlimited: HashSet<Wallet>,
    pub unconfigured: UnconfiguredPolicy,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            window_seconds: 24 * 60 * 60,
            unlimited: HashSet::new(),
            unconfigured: UnconfiguredPolicy::Deny,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EssenceConfig {
    pub weekly_cap: i64,
    pub expected_daily_casts: u32,
}

impl Default for EssenceConfig {
    fn default() -> Self {
        Self {
            weekly_cap: 100,
            expected_daily_casts: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeliusConfig {
    pub url: String,
    pub api_key: Option<SecretString>,
}

impl Default for HeliusConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_HELIUS_URL.to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub token: Option<SecretString>,
}

impl StoreConfig {
    pub fn connect(&self, clock: Arc<dyn Clock>) -> Result<Arc<dyn Store>, Error> {
        Ok(match self.backend {
            StoreBackend::Upstash => {
                let url = self
                    .url
                    .as_deref()
                    .ok_or(Error::MissingStoreCredential("UPSTASH_REDIS_REST_URL"))?;
                let token = self
                    .token
                    .clone()
                    .ok_or(Error::MissingStoreCredential("UPSTASH_REDIS_REST_TOKEN"))?;
                info!("Using Upstash store at {url}");
                Arc::new(UpstashStore::new(url, token)?)
            }
            StoreBackend::Memory => {
                warn!("Using in-memory store, state is lost on restart");
                Arc::new(MemoryStore::new(clock))
            }
            StoreBackend::None => {
                warn!("No store configured");
                Arc::new(UnconfiguredStore)
            }
        })
    }
}

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub allowed_origin: String,
    pub helius: HeliusConfig,
    pub store: StoreConfig,
    pub rate_limit: RateLimitConfig,
    pub cooldown: CooldownConfig,
    pub essence: EssenceConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        let store_url = optional_env_var("UPSTASH_REDIS_REST_URL");
        let store_token = optional_env_var("UPSTASH_REDIS_REST_TOKEN").map(SecretString::new);
        let default_backend = if store_url.is_some() && store_token.is_some() {
            StoreBackend::Upstash
        } else {
            StoreBackend::None
        };

        let unlimited = optional_env_var("UNLIMITED_WALLETS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|wallet| !wallet.is_empty())
            .map(|wallet| {
                Wallet::parse(wallet).map_err(|_| Error::InvalidUnlimitedWallet(wallet.to_string()))
            })
            .collect::<Result<HashSet<_>, _>>()?;

        let rate_limit = RateLimitConfig::default();
        let cooldown = CooldownConfig::default();
        let essence = EssenceConfig::default();

        Ok(Self {
            bind_addr: parse_env_var("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3030)))?,
            allowed_origin: allowed_origin()?,
            helius: HeliusConfig {
                url: optional_env_var("HELIUS_URL")
                    .unwrap_or_else(|| DEFAULT_HELIUS_URL.to_string()),
                api_key: optional_env_var("HELIUS_API_KEY").map(SecretString::new),
            },
            store: StoreConfig {
                backend: parse_env_var("STORE_BACKEND", default_backend)?,
                url: store_url,
                token: store_token,
            },
            rate_limit: RateLimitConfig {
                max_requests: parse_env_var("RATE_LIMIT_MAX", rate_limit.max_requests)?,
                window_seconds: parse_env_var("RATE_LIMIT_WINDOW", rate_limit.window_seconds)?,
                unconfigured: parse_env_var("RATE_LIMIT_UNCONFIGURED", rate_limit.unconfigured)?,
            },
            cooldown: CooldownConfig {
                unlimited,
                unconfigured: parse_env_var("COOLDOWN_UNCONFIGURED", cooldown.unconfigured)?,
                ..cooldown
            },
            essence: EssenceConfig {
                weekly_cap: parse_env_var("ESSENCE_CAP", essence.weekly_cap)?,
                expected_daily_casts: parse_env_var(
                    "ESSENCE_DAILY_CASTS",
                    essence.expected_daily_casts,
                )?,
            },
        })
    }
}
