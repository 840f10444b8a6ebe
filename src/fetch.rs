//! # Calendar page fetcher
//! The source serves a plain HTML page but blocks requests that do not
//! look like a browser, so the client pins a full browser header set.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, REFERER,
    USER_AGENT,
};

use crate::error::ScrapeError;

/// Default calendar source.
pub const CALENDAR_URL: &str = "https://www.forexfactory.com/calendar";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Anything that can produce the raw calendar page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self) -> Result<String, ScrapeError>;
}

#[derive(Debug)]
pub struct CalendarFetcher {
    url: reqwest::Url,
    http: reqwest::Client,
}

impl CalendarFetcher {
    pub fn new() -> Result<Self, ScrapeError> {
        Self::with_url(CALENDAR_URL)
    }

    pub fn with_url(url: &str) -> Result<Self, ScrapeError> {
        let url =
            reqwest::Url::parse(url).map_err(|_| ScrapeError::InvalidUrl(url.to_string()))?;
        let http = reqwest::Client::builder()
            .default_headers(browser_headers())
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TOTAL_TIMEOUT)
            .build()?;
        Ok(Self { url, http })
    }
}

#[async_trait]
impl PageFetcher for CalendarFetcher {
    async fn fetch_page(&self) -> Result<String, ScrapeError> {
        let resp = self.http.get(self.url.clone()).send().await?;
        let status = resp.status();
        tracing::debug!(target: "scrape", %status, "calendar page fetched");
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus { status });
        }
        let body = resp.bytes().await?;
        String::from_utf8(body.to_vec()).map_err(|_| ScrapeError::NoData)
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(
        REFERER,
        HeaderValue::from_static("https://www.forexfactory.com/"),
    );
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers
}
