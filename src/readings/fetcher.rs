//! Retrieves the raw readings page for a date.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, info, instrument};

use crate::error::FetchError;

/// Default readings source.
pub const DEFAULT_SOURCE_URL: &str = "https://bible.usccb.org/bible/readings/";

/// Fixed request signature sent with every fetch.
pub const USER_AGENT: &str = concat!(
    "DailyReadingsBot/",
    env!("CARGO_PKG_VERSION"),
    " (+daily mass readings mailer)"
);

/// Upper bound on a single fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// A fetched readings page.
#[derive(Debug, Clone)]
pub struct RawReadings {
    pub url: String,
    pub body: String,
}

/// Source of raw readings documents.
#[async_trait]
pub trait ReadingsFetcher: Send + Sync {
    /// Fetch the raw document for `date`.
    async fn fetch(&self, date: NaiveDate) -> Result<RawReadings, FetchError>;
}

/// Path key for a date: `MMDDYY.cfm`.
pub fn path_key(date: NaiveDate) -> String {
    format!("{}.cfm", date.format("%m%d%y"))
}

/// HTTP fetcher against a USCCB-style readings site.
pub struct HttpReadingsFetcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpReadingsFetcher {
    /// Create a fetcher rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(base_url, FETCH_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Full document URL for a date.
    pub fn url_for(&self, date: NaiveDate) -> String {
        format!("{}{}", self.base_url, path_key(date))
    }
}

#[async_trait]
impl ReadingsFetcher for HttpReadingsFetcher {
    #[instrument(skip(self), fields(url = tracing::field::Empty))]
    async fn fetch(&self, date: NaiveDate) -> Result<RawReadings, FetchError> {
        let url = self.url_for(date);
        tracing::Span::current().record("url", url.as_str());
        debug!("Fetching readings page");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/html")
            .send()
            .await
            .map_err(|e| classify(&url, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            && !content_type.to_ascii_lowercase().contains("html")
        {
            return Err(FetchError::ContentType {
                url,
                content_type: content_type.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify(&url, self.timeout, e))?;

        info!(bytes = body.len(), "Fetched readings page");
        Ok(RawReadings { url, body })
    }
}

fn classify(url: &str, timeout: Duration, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}
