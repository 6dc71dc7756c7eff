//! PriceCrawl - crawl politeness engine for price-comparison scraping.
//!
//! Two independent components keep the scrapers polite:
//! the [`limiter::RateLimiter`] serializes and throttles outbound work per
//! domain, and the [`robots::RobotsChecker`] maintains a freshness-bounded
//! robots.txt cache and answers allow/disallow for a URL. Neither component
//! lets a failing scrape escape as an error: public operations degrade to a
//! safe default and log instead.

pub mod config;
pub mod limiter;
pub mod robots;

pub use config::PolitenessConfig;
pub use limiter::{DispatchOutcome, DomainStats, LimiterConfig, RateLimiter};
pub use robots::{
    DiskStore, FetchedRobots, HttpFetcher, RobotsChecker, RobotsFetcher, RobotsStore, RuleSet,
    StoreError,
};
