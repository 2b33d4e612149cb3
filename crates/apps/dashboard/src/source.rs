//! Remote feed transport.
//!
//! A `FeedSource` returns the raw response body for one feed; decoding and
//! merging happen in the controller.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use formats::feed::FeedKind;
use reqwest::StatusCode;

/// Why a feed body could not be retrieved.
#[derive(Debug)]
pub enum SourceError {
    /// The HTTP client could not be constructed.
    Client(reqwest::Error),
    /// No complete response within the request timeout.
    Timeout { url: String },
    /// Connection, TLS or body-read failure.
    Transport { url: String, source: reqwest::Error },
    /// The endpoint answered with a non-success status.
    Status { url: String, status: StatusCode },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Client(err) => write!(f, "failed to build HTTP client: {err}"),
            SourceError::Timeout { url } => write!(f, "GET {url} timed out"),
            SourceError::Transport { url, source } => write!(f, "GET {url} failed: {source}"),
            SourceError::Status { url, status } => write!(f, "GET {url} returned {status}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Client(err) | SourceError::Transport { source: err, .. } => {
                Some(err as &(dyn std::error::Error + 'static))
            }
            SourceError::Timeout { .. } | SourceError::Status { .. } => None,
        }
    }
}

impl SourceError {
    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout {
                url: url.to_string(),
            }
        } else {
            SourceError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that can produce the current body of a feed.
pub trait FeedSource: Send + Sync {
    fn fetch(&self, feed: FeedKind) -> BoxFuture<'_, Result<Vec<u8>, SourceError>>;
}

/// Fetches both feeds over HTTP with a per-request timeout.
pub struct HttpFeedSource {
    client: reqwest::Client,
    stations_url: String,
    firms_url: String,
}

impl HttpFeedSource {
    pub fn new(
        stations_url: impl Into<String>,
        firms_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::Client)?;
        Ok(Self {
            client,
            stations_url: stations_url.into(),
            firms_url: firms_url.into(),
        })
    }

    pub fn url(&self, feed: FeedKind) -> &str {
        match feed {
            FeedKind::Stations => &self.stations_url,
            FeedKind::Firms => &self.firms_url,
        }
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch(&self, feed: FeedKind) -> BoxFuture<'_, Result<Vec<u8>, SourceError>> {
        Box::pin(async move {
            let url = self.url(feed);
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| SourceError::from_reqwest(url, e))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            let body = resp
                .bytes()
                .await
                .map_err(|e| SourceError::from_reqwest(url, e))?;
            Ok(body.to_vec())
        })
    }
}
