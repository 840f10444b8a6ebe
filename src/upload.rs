//! # Supabase client
//! Batched upsert of calendar events into the `economic_events` table,
//! plus the optional edge-function refresh trigger.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScrapeError;
use crate::event::EconomicEvent;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Conflict target for the upsert; matches the table's natural key.
/// The raw scraped `date` is ambiguous (no year) and is deliberately not
/// part of it.
const ON_CONFLICT: &str = "event_date,time,name,currency";

/// Destination for a batch of scraped events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn upload(&self, events: &[EconomicEvent]) -> Result<(), ScrapeError>;
}

#[derive(Clone, Debug)]
pub struct SupabaseClient {
    base_url: reqwest::Url,
    anon_key: String,
    http: reqwest::Client,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: impl Into<String>) -> Result<Self, ScrapeError> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|_| ScrapeError::InvalidUrl(base_url.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url,
            anon_key: anon_key.into(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, ScrapeError> {
        self.base_url
            .join(path)
            .map_err(|_| ScrapeError::InvalidUrl(path.to_string()))
    }

    /// Fire the `fetch-economic-calendar` edge function. No payload and no
    /// response contract beyond the status code.
    pub async fn trigger_refresh(&self) -> Result<(), ScrapeError> {
        let url = self.endpoint("functions/v1/fetch-economic-calendar")?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.anon_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let status = resp.status();
        tracing::info!(target: "supabase", %status, "edge function triggered");
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus { status });
        }
        Ok(())
    }
}

#[async_trait]
impl EventSink for SupabaseClient {
    async fn upload(&self, events: &[EconomicEvent]) -> Result<(), ScrapeError> {
        if events.is_empty() {
            // No request at all for an empty batch.
            tracing::debug!(target: "supabase", "no events to upload");
            return Ok(());
        }

        let mut url = self.endpoint("rest/v1/economic_events")?;
        url.query_pairs_mut().append_pair("on_conflict", ON_CONFLICT);

        let payload: Vec<_> = events.iter().map(|e| e.to_record()).collect();

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.anon_key)
            .header("apikey", &self.anon_key)
            // Update on key collision instead of erroring or duplicating.
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(target: "supabase", %status, body = %body, "upload rejected");
            return Err(ScrapeError::Upload { status, body });
        }

        tracing::info!(target: "supabase", count = events.len(), "events upserted");
        Ok(())
    }
}
