use crate::api::snapshot::{AvatarState, DailyStats, Snapshot, VersionHistory};
use anyhow::{Context, Result};
use reqwest::Url;
use serde_json::Value;

/// Thin wrapper over the bot's HTTP API. One method per endpoint; every
/// response is pulled down as loose JSON and decoded defensively by the
/// snapshot module.
#[derive(Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid api base url")?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn api_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(&format!("api/{endpoint}"))
            .with_context(|| format!("build api url for {endpoint}"))
    }

    async fn get_json(&self, url: Url, label: &'static str) -> Result<Value> {
        self.http
            .get(url)
            .send()
            .await
            .with_context(|| format!("{label} request failed"))?
            .error_for_status()
            .with_context(|| format!("{label} non-200"))?
            .json()
            .await
            .with_context(|| format!("{label} json decode failed"))
    }

    /// Aggregate snapshot. Carries a millisecond cache-buster so stale
    /// intermediaries never serve yesterday's numbers.
    pub async fn fetch_all(&self) -> Result<Snapshot> {
        let mut url = self.api_url("all")?;
        url.query_pairs_mut()
            .append_pair("t", &chrono::Utc::now().timestamp_millis().to_string());
        let v = self.get_json(url, "all").await?;
        Ok(Snapshot::from_value(&v))
    }

    pub async fn fetch_avatar(&self) -> Result<AvatarState> {
        let v = self.get_json(self.api_url("avatar")?, "avatar").await?;
        Ok(AvatarState::from_value(&v))
    }

    /// Legacy status source; only the daily counters survive normalization.
    pub async fn fetch_daily_stats(&self) -> Result<DailyStats> {
        let v = self.get_json(self.api_url("status")?, "status").await?;
        Ok(DailyStats::from_value(&v))
    }

    pub async fn fetch_versions(&self) -> Result<VersionHistory> {
        let v = self.get_json(self.api_url("versions")?, "versions").await?;
        Ok(VersionHistory::from_value(&v))
    }

    /// Sends one chat message, returns the assistant reply text (empty when
    /// the server answers with an unexpected shape).
    pub async fn send_chat(&self, message: &str) -> Result<String> {
        let url = self.api_url("chat")?;
        let v: Value = self
            .http
            .post(url)
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await
            .context("chat request failed")?
            .error_for_status()
            .context("chat non-200")?
            .json()
            .await
            .context("chat json decode failed")?;
        Ok(v.get("response")
            .and_then(|r| r.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_urls_join_under_the_base() {
        let client = DashboardClient::new("http://127.0.0.1:5000/").unwrap();
        assert_eq!(
            client.api_url("all").unwrap().as_str(),
            "http://127.0.0.1:5000/api/all"
        );
        assert_eq!(
            client.api_url("versions").unwrap().path(),
            "/api/versions"
        );
    }

    #[test]
    fn rejects_unparseable_base() {
        assert!(DashboardClient::new("not a url").is_err());
    }
}
