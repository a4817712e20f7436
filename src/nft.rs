//! Pass-through to the Helius `searchAssets` RPC method.

use log::debug;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{config::HeliusConfig, wallet::Wallet};

const PAGE_LIMIT: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Invalid Helius url")]
    Url(#[from] url::ParseError),

    #[error("Helius API request failed")]
    Request(#[from] reqwest::Error),

    #[error("Helius API request failed")]
    Status(reqwest::StatusCode),

    #[error("{0}")]
    Rpc(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftSearch {
    pub wallet: Wallet,
    pub collection: Option<String>,
    pub page: u32,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'static str,
    params: SearchParams<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams<'a> {
    owner_address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    grouping: Option<(&'static str, &'a str)>,
    page: u32,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<SearchResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HeliusClient {
    client: Client,
    url: String,
    api_key: Option<SecretString>,
}

impl HeliusClient {
    pub fn new(config: &HeliusConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> Result<Url, Error> {
        let api_key = self.api_key.as_ref().ok_or(Error::MissingApiKey)?;
        let mut url = Url::parse(&self.url)?;
        url.query_pairs_mut()
            .append_pair("api-key", api_key.expose_secret());
        Ok(url)
    }

    /// Runs one `searchAssets` call and returns its items untouched.
    pub async fn search(&self, search: &NftSearch) -> Result<Vec<Value>, Error> {
        let endpoint = self.endpoint()?;

        let request = RpcRequest {
            jsonrpc: "2.0",
            id: "wallet-nfts",
            method: "searchAssets",
            params: SearchParams {
                owner_address: search.wallet.as_str(),
                grouping: search
                    .collection
                    .as_deref()
                    .map(|collection| ("collection", collection)),
                page: search.page,
                limit: PAGE_LIMIT,
            },
        };

        debug!(
            "Searching assets of {} in {:?} page {}",
            search.wallet, search.collection, search.page
        );

        let response = self.client.post(endpoint).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(Error::Status(response.status()));
        }

        let response: RpcResponse = response.json().await?;
        if let Some(error) = response.error {
            return Err(Error::Rpc(
                error.message.unwrap_or_else(|| "API error".to_string()),
            ));
        }

        Ok(response.result.map(|result| result.items).unwrap_or_default())
    }
}
