use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Paths under this marker always hit the network and are never cached; live
/// telemetry must not be replayable from a stale copy.
const API_PATH_MARKER: &str = "/api/";

/// Network-first fetch proxy for static resources. Effective from the moment
/// it is constructed: a definitive success (HTTP 200) writes the body through
/// to an in-memory cache keyed by URL, and a network failure falls back to
/// the last cached copy. A miss on both sides surfaces as an error.
pub struct OfflineStore {
    http: reqwest::Client,
    cache: RwLock<HashMap<String, Vec<u8>>>,
}

impl Default for OfflineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineStore {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn bypasses_cache(url: &str) -> bool {
        url.contains(API_PATH_MARKER)
    }

    pub fn cached(&self, url: &str) -> Option<Vec<u8>> {
        self.cache
            .read()
            .ok()
            .and_then(|cache| cache.get(url).cloned())
    }

    fn store(&self, url: &str, body: &[u8]) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(url.to_string(), body.to_vec());
        }
    }

    /// Applies the write-through policy to one completed network response.
    /// Only a definitive 200 is admitted; redirects, partials and errors are
    /// passed through without touching the cache.
    fn admit(&self, url: &str, status: u16, body: &[u8]) {
        if status == 200 && !Self::bypasses_cache(url) {
            self.store(url, body);
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if Self::bypasses_cache(url) {
            let resp = self
                .http
                .get(url)
                .send()
                .await
                .with_context(|| format!("fetch {url}"))?;
            let body = resp.bytes().await.with_context(|| format!("read {url}"))?;
            return Ok(body.to_vec());
        }

        match self.http.get(url).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.bytes().await.with_context(|| format!("read {url}"))?;
                self.admit(url, status, &body);
                Ok(body.to_vec())
            }
            Err(err) => self
                .cached(url)
                .ok_or_else(|| anyhow!("offline and no cached copy of {url}: {err}")),
        }
    }

    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        let body = self.fetch(url).await?;
        serde_json::from_slice(&body).with_context(|| format!("parse json from {url}"))
    }
}
