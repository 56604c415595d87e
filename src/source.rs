//! Institution data feeds.
//!
//! A `DataSource` hands collectors already-normalized JSON records, one
//! array per (institution, feed) pair. Collectors never perform network
//! I/O themselves; they only decode what the source returns.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::config::SourceConfig;
use crate::error::SourceError;

/// Logical feeds published per institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// Legislator roster
    Legislators,

    /// Expense entries for the current period
    Expenses,

    /// Contact details per legislator
    LegislatorDetails,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Legislators => "legislators",
            Feed::Expenses => "expenses",
            Feed::LegislatorDetails => "legislator_details",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches every record of `feed` for the institution `siglum`.
    async fn fetch(&self, siglum: &str, feed: Feed) -> Result<Vec<Value>, SourceError>;
}

// ------------------------------------------------------------
// HTTP source
// ------------------------------------------------------------
//
// TODO:
// - Retry 5xx answers once the feed servers publish a rate limit
//
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(cfg: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|source| SourceError::Http {
                url: cfg.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn feed_url(&self, siglum: &str, feed: Feed) -> String {
        format!("{}/{}/{}.json", self.base_url, siglum.to_lowercase(), feed)
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, siglum: &str, feed: Feed) -> Result<Vec<Value>, SourceError> {
        let url = self.feed_url(siglum, feed);
        debug!("GET {url}");

        let http_err = |source: reqwest::Error| SourceError::Http {
            url: url.clone(),
            source,
        };

        let resp = self.client.get(&url).send().await.map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        match resp.json::<Value>().await.map_err(http_err)? {
            Value::Array(records) => Ok(records),
            _ => Err(SourceError::NotAnArray {
                institution: siglum.to_string(),
                feed: feed.to_string(),
            }),
        }
    }
}

// ------------------------------------------------------------
// Static source
// ------------------------------------------------------------
//
// Serves fixed records from memory. Feeds that were never set
// are reported as `SourceError::Missing`.
//
#[derive(Default)]
pub struct StaticSource {
    feeds: HashMap<(String, Feed), Vec<Value>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, siglum: &str, feed: Feed, records: Vec<Value>) -> Self {
        self.feeds.insert((siglum.to_uppercase(), feed), records);
        self
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn fetch(&self, siglum: &str, feed: Feed) -> Result<Vec<Value>, SourceError> {
        self.feeds
            .get(&(siglum.to_uppercase(), feed))
            .cloned()
            .ok_or_else(|| SourceError::Missing {
                institution: siglum.to_string(),
                feed: feed.to_string(),
            })
    }
}
