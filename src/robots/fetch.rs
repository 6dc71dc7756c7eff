//! HTTP fetch seam for robots.txt.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

/// A fetched robots.txt response: status plus body, nothing else.
#[derive(Debug, Clone)]
pub struct FetchedRobots {
    pub status: u16,
    pub body: String,
}

impl FetchedRobots {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetch capability injected into the checker. Errors here are transport
/// failures (connect, timeout); a non-success HTTP status is a normal
/// response, not an error.
#[async_trait]
pub trait RobotsFetcher: Send + Sync {
    async fn fetch(&self, robots_url: &Url) -> anyhow::Result<FetchedRobots>;
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

#[async_trait]
impl RobotsFetcher for HttpFetcher {
    async fn fetch(&self, robots_url: &Url) -> anyhow::Result<FetchedRobots> {
        let response = self.client.get(robots_url.clone()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchedRobots { status, body })
    }
}
