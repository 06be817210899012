use crate::store::{SignalStore, StoreError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const STORE_URL_ENV: &str = "CASTLINK_STORE_URL";
pub const STORE_TIMEOUT_ENV: &str = "CASTLINK_STORE_TIMEOUT_MS";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpStoreConfig {
    /// Database root, e.g. `https://example-rtdb.firebaseio.com`.
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for HttpStoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 10_000,
        }
    }
}

impl HttpStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Reads `CASTLINK_STORE_URL` and the optional `CASTLINK_STORE_TIMEOUT_MS`.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(STORE_URL_ENV).ok()?;
        let mut config = Self::new(base_url);
        if let Some(ms) = std::env::var(STORE_TIMEOUT_ENV)
            .ok()
            .and_then(|raw| raw.parse().ok())
        {
            config.timeout_ms = ms;
        }
        Some(config)
    }
}

/// Realtime-database REST adapter: `PUT`/`GET {base}/{path}.json`.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }
}

fn check_status(status: StatusCode) -> Result<(), StoreError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(StoreError::Status(status.as_u16()))
    }
}

/// A JSON `null` (or an empty body) means nothing is stored at the path.
fn decode_body(status: StatusCode, body: &[u8]) -> Result<Option<Value>, StoreError> {
    check_status(status)?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice(body).map_err(|e| StoreError::Decode(e.to_string()))? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

#[async_trait]
impl SignalStore for HttpStore {
    async fn put(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let url = self.url(path);
        debug!("PUT {}", url);
        let res = self.client.put(&url).json(&value).send().await?;
        check_status(res.status())
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let res = self.client.get(&url).send().await?;
        let status = res.status();
        let body = res.bytes().await?;
        decode_body(status, &body)
    }
}
