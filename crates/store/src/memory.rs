use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::trace;

use crate::{Clock, Error, Store, SystemClock};

#[derive(Debug, Clone)]
enum Value {
    String(String),
    SortedSet(HashMap<String, f64>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

/// In-process [`Store`] with Redis-like expiry semantics.
///
/// Expired keys are dropped lazily whenever they are touched. Time comes from
/// the injected [`Clock`], so tests can jump across cooldown windows.
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = self.clock.now();
        entries.retain(|_, entry| entry.expires_at.map_or(true, |at| at > now));

        entries
    }

    fn add(&self, key: &str, delta: i64) -> Result<i64, Error> {
        let mut entries = self.entries();
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::String("0".to_string()),
            expires_at: None,
        });

        let current = match &entry.value {
            Value::String(s) => s.parse::<i64>().map_err(|_| Error::NotAnInteger {
                key: key.to_string(),
            })?,
            Value::SortedSet(_) => {
                return Err(Error::NotAnInteger {
                    key: key.to_string(),
                })
            }
        };

        let next = current + delta;
        entry.value = Value::String(next.to_string());
        trace!("{key} = {next}");

        Ok(next)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn incr(&self, key: &str) -> Result<i64, Error> {
        self.add(key, 1)
    }

    async fn decr(&self, key: &str) -> Result<i64, Error> {
        self.add(key, -1)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, Error> {
        let now = self.clock.now();
        Ok(match self.entries().get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(now + Duration::seconds(seconds as i64));
                true
            }
            None => false,
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match self.entries().get(key).map(|entry| &entry.value) {
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::SortedSet(_)) => Err(Error::Command(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
            )),
            None => Ok(None),
        }
    }

    async fn set_nx_ex(&self, key: &str, value: &str, seconds: u64) -> Result<bool, Error> {
        let now = self.clock.now();
        let mut entries = self.entries();

        if entries.contains_key(key) {
            return Ok(false);
        }

        entries.insert(
            key.to_string(),
            Entry {
                value: Value::String(value.to_string()),
                expires_at: Some(now + Duration::seconds(seconds as i64)),
            },
        );

        Ok(true)
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, Error> {
        let now = self.clock.now();
        Ok(self
            .entries()
            .get(key)
            .and_then(|entry| entry.expires_at)
            .map(|at| (at - now).num_seconds().max(0) as u64))
    }

    async fn zincrby(&self, key: &str, increment: f64, member: &str) -> Result<f64, Error> {
        let mut entries = self.entries();
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::SortedSet(HashMap::new()),
            expires_at: None,
        });

        match &mut entry.value {
            Value::SortedSet(set) => {
                let score = set.entry(member.to_string()).or_insert(0.0);
                *score += increment;
                Ok(*score)
            }
            Value::String(_) => Err(Error::Command(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
            )),
        }
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, Error> {
        match self.entries().get(key).map(|entry| &entry.value) {
            Some(Value::SortedSet(set)) => Ok(set.get(member).copied()),
            Some(Value::String(_)) => Err(Error::Command(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
            )),
            None => Ok(None),
        }
    }

    async fn zrevrange_withscores(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<(String, f64)>, Error> {
        if stop < start {
            return Ok(Vec::new());
        }

        let mut members: Vec<_> = match self.entries().get(key).map(|entry| &entry.value) {
            Some(Value::SortedSet(set)) => set
                .iter()
                .map(|(member, score)| (member.clone(), *score))
                .collect(),
            Some(Value::String(_)) => {
                return Err(Error::Command(
                    "WRONGTYPE Operation against a key holding the wrong kind of value"
                        .to_string(),
                ))
            }
            None => return Ok(Vec::new()),
        };

        // Redis orders equal scores by member, descending for ZREVRANGE
        members.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

        Ok(members
            .into_iter()
            .skip(start)
            .take(stop - start + 1)
            .collect())
    }
}
