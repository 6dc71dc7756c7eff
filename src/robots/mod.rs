//! robots.txt compliance cache and checker.
//!
//! Answers "may we crawl this URL right now?" while keeping network fetches
//! of robots.txt to one per domain per freshness window. Every public
//! operation here is total: failures are logged and come back as `false`
//! (fail closed), never as an error. A flaky site or a malformed robots file
//! must not halt the crawl loop.

mod fetch;
mod parser;
mod store;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::PolitenessConfig;

pub use fetch::{FetchedRobots, HttpFetcher, RobotsFetcher};
pub use parser::RuleSet;
pub use store::{DiskStore, RobotsStore, StoreError, StoreResult};

/// Freshness-bounded robots.txt cache plus allow/disallow evaluation.
pub struct RobotsChecker {
    store: Arc<dyn RobotsStore>,
    fetcher: Arc<dyn RobotsFetcher>,
    freshness_window: Duration,
}

impl RobotsChecker {
    pub fn new(
        store: Arc<dyn RobotsStore>,
        fetcher: Arc<dyn RobotsFetcher>,
        freshness_window: Duration,
    ) -> Self {
        Self {
            store,
            fetcher,
            freshness_window,
        }
    }

    /// Build a checker over the on-disk store and reqwest fetcher.
    pub fn from_config(config: &PolitenessConfig) -> Self {
        Self::new(
            Arc::new(DiskStore::new(config.cache_dir.clone())),
            Arc::new(HttpFetcher::new(
                &config.user_agent,
                config.request_timeout(),
            )),
            config.freshness_window(),
        )
    }

    /// Whether a cached robots.txt exists for `domain` and is still within
    /// the freshness window. Empty domains and storage failures come back as
    /// false, logged, never raised.
    pub async fn is_cached(&self, domain: &str) -> bool {
        if domain.is_empty() {
            warn!("robots cache queried with an empty domain");
            return false;
        }

        match self.store.modified(domain).await {
            Ok(Some(modified)) => {
                // A clock that claims the file is from the future counts as
                // fresh rather than erroring.
                let age = SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or(Duration::ZERO);
                age < self.freshness_window
            }
            Ok(None) => false,
            Err(err) => {
                error!(domain, error = %err, "robots cache check failed");
                false
            }
        }
    }

    /// Fetch `{scheme}://{host}/robots.txt` for the URL's domain and cache
    /// the body if the response is a success. Returns whether a usable body
    /// was cached; fetch and storage failures are logged and swallowed.
    pub async fn cache_robots_txt(&self, url: &Url) -> bool {
        let Some(domain) = url.host_str().map(|h| h.to_string()) else {
            warn!(url = %url, "cannot cache robots.txt for a URL without a host");
            return false;
        };

        let mut robots_url = url.clone();
        robots_url.set_path("/robots.txt");
        robots_url.set_query(None);
        robots_url.set_fragment(None);

        match self.fetcher.fetch(&robots_url).await {
            Ok(response) if response.is_success() => {
                match self.store.write(&domain, &response.body).await {
                    Ok(true) => {
                        info!(domain, "overwriting cached robots.txt");
                        true
                    }
                    Ok(false) => {
                        info!(domain, "cached new robots.txt");
                        true
                    }
                    Err(err) => {
                        error!(domain, error = %err, "failed to write robots.txt cache");
                        false
                    }
                }
            }
            Ok(response) => {
                warn!(
                    domain,
                    status = response.status,
                    "robots.txt fetch returned non-success status, not caching"
                );
                false
            }
            Err(err) => {
                error!(domain, error = %err, "robots.txt fetch failed");
                false
            }
        }
    }

    /// Whether `url` may be crawled right now.
    ///
    /// Ensures a fresh cached robots.txt (one re-fetch attempt if missing or
    /// stale), then evaluates the URL path against the `User-agent: *`
    /// rules. Fails closed: if no fresh robots data can be obtained, or
    /// anything errors along the way, the answer is false.
    pub async fn check(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(url, error = %err, "unparseable URL, refusing crawl");
                return false;
            }
        };
        let Some(domain) = parsed.host_str().map(|h| h.to_string()) else {
            warn!(url, "URL has no host, refusing crawl");
            return false;
        };

        if !self.is_cached(&domain).await {
            self.cache_robots_txt(&parsed).await;
        }
        // Still nothing fresh after the fetch attempt: a stale file is as
        // good as absent, so fail closed.
        if !self.is_cached(&domain).await {
            debug!(domain, "no fresh robots.txt available, failing closed");
            return false;
        }

        let body = match self.store.read(&domain).await {
            Ok(body) => body,
            Err(err) => {
                error!(domain, error = %err, "failed to read cached robots.txt");
                return false;
            }
        };

        let rules = RuleSet::parse(&body);
        let allowed = rules.is_allowed(parsed.path());
        debug!(domain, path = parsed.path(), allowed, "robots.txt decision");
        allowed
    }
}
