use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{Error, Store};

/// Client for the Upstash Redis REST API.
///
/// Every command is a `GET {url}/{command}/{arg}/...` with a bearer token.
/// Arguments are pushed as path segments so keys containing `/` or spaces
/// are escaped properly.
#[derive(Debug, Clone)]
pub struct UpstashStore {
    client: Client,
    base: Url,
    token: SecretString,
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    result: Value,
    error: Option<String>,
}

impl UpstashStore {
    pub fn new(url: &str, token: SecretString) -> Result<Self, Error> {
        Self::with_client(Client::new(), url, token)
    }

    pub fn with_client(client: Client, url: &str, token: SecretString) -> Result<Self, Error> {
        let base = Url::parse(url)?;
        if base.cannot_be_a_base() {
            return Err(Error::CannotBeABase(url.to_string()));
        }

        Ok(Self {
            client,
            base,
            token,
        })
    }

    fn command_url(&self, args: &[&str]) -> Url {
        let mut url = self.base.clone();
        // checked in the constructor
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(args);
        }
        url
    }

    async fn command(&self, args: &[&str]) -> Result<Value, Error> {
        debug!("Sending store command {}", args.first().unwrap_or(&""));

        let response = self
            .client
            .get(self.command_url(args))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        let reply = match response.json::<Reply>().await {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => return Err(Error::Status(status)),
            Err(err) => return Err(err.into()),
        };

        if let Some(error) = reply.error {
            return Err(Error::Command(error));
        }

        if !status.is_success() {
            return Err(Error::Status(status));
        }

        Ok(reply.result)
    }
}

fn as_integer(value: &Value, command: &'static str) -> Result<i64, Error> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or(Error::UnexpectedResponse { command })
}

fn as_float(value: &Value, command: &'static str) -> Result<f64, Error> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or(Error::UnexpectedResponse { command })
}

#[async_trait]
impl Store for UpstashStore {
    async fn incr(&self, key: &str) -> Result<i64, Error> {
        as_integer(&self.command(&["incr", key]).await?, "incr")
    }

    async fn decr(&self, key: &str) -> Result<i64, Error> {
        as_integer(&self.command(&["decr", key]).await?, "decr")
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, Error> {
        let seconds = seconds.to_string();
        Ok(as_integer(&self.command(&["expire", key, &seconds]).await?, "expire")? == 1)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match self.command(&["get", key]).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            _ => Err(Error::UnexpectedResponse { command: "get" }),
        }
    }

    async fn set_nx_ex(&self, key: &str, value: &str, seconds: u64) -> Result<bool, Error> {
        let seconds = seconds.to_string();
        match self
            .command(&["set", key, value, "nx", "ex", &seconds])
            .await?
        {
            Value::String(s) if s == "OK" => Ok(true),
            Value::Null => Ok(false),
            _ => Err(Error::UnexpectedResponse { command: "set" }),
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, Error> {
        // -2 for a missing key, -1 for a key without expiry
        let ttl = as_integer(&self.command(&["ttl", key]).await?, "ttl")?;
        Ok(u64::try_from(ttl).ok())
    }

    async fn zincrby(&self, key: &str, increment: f64, member: &str) -> Result<f64, Error> {
        let increment = increment.to_string();
        as_float(
            &self.command(&["zincrby", key, &increment, member]).await?,
            "zincrby",
        )
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, Error> {
        match self.command(&["zscore", key, member]).await? {
            Value::Null => Ok(None),
            value => as_float(&value, "zscore").map(Some),
        }
    }

    async fn zrevrange_withscores(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, f64)>, Error> {
        let (start, stop) = (start.to_string(), stop.to_string());
        let Value::Array(items) = self
            .command(&["zrevrange", key, &start, &stop, "withscores"])
            .await?
        else {
            return Err(Error::UnexpectedResponse {
                command: "zrevrange",
            });
        };

        items
            .chunks(2)
            .map(|pair| match pair {
                [Value::String(member), score] => {
                    Ok((member.clone(), as_float(score, "zrevrange")?))
                }
                _ => Err(Error::UnexpectedResponse {
                    command: "zrevrange",
                }),
            })
            .collect()
    }
}
