//! Per-domain request rate limiter.
//!
//! Serializes outbound actions per domain and enforces a cooldown between
//! completions for the same domain. Independent domains never wait on each
//! other: both the cooldown map and the queue map are sharded concurrent
//! maps, and the only lock an action holds is its own domain's gate.
//!
//! Failures inside a submitted action are logged and swallowed. An action
//! that errors or panics never reaches the caller as an error and never
//! poisons its domain's queue.

mod domain_queue;

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{watch, Notify};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

use domain_queue::DomainQueue;
pub use domain_queue::DomainStats;

/// How an enqueued action ended. Total: there is no error path out of
/// [`RateLimiter::enqueue`], only an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action ran to completion.
    Completed,
    /// The action returned an error or panicked; logged and swallowed.
    Failed,
    /// The limiter stopped before the action could run (or finish).
    Abandoned,
}

/// Rate limiter tuning.
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Minimum spacing between completed actions for the same domain.
    pub cooldown: Duration,
    /// Grace period `stop_processing` grants in-flight actions before
    /// aborting them.
    pub drain_timeout: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(2),
            drain_timeout: Duration::from_secs(5),
        }
    }
}

/// Per-domain serialized, cooldown-gated dispatcher.
///
/// Designed to be wrapped in `Arc` and shared across tasks.
#[derive(Debug)]
pub struct RateLimiter {
    config: LimiterConfig,
    /// Domain -> cooldown expiry. Absent key means never throttled; expired
    /// entries are inert and get overwritten, never deleted.
    cooldowns: DashMap<String, Instant>,
    /// Domain -> execution gate, created lazily on first use.
    queues: DashMap<String, Arc<DomainQueue>>,
    shutdown: watch::Sender<bool>,
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
    tasks: DashMap<u64, AbortHandle>,
    next_task_id: AtomicU64,
}

/// Decrements the in-flight count when the action future completes or is
/// dropped by an abort.
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.idle.notify_waiters();
    }
}

impl RateLimiter {
    /// Create a new rate limiter with default config.
    pub fn new() -> Self {
        Self::with_config(LimiterConfig::default())
    }

    /// Create a new rate limiter with custom config.
    pub fn with_config(config: LimiterConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            cooldowns: DashMap::new(),
            queues: DashMap::new(),
            shutdown,
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
            tasks: DashMap::new(),
            next_task_id: AtomicU64::new(0),
        }
    }

    /// Extract the throttling key (host) from a URL.
    pub fn extract_domain(url: &str) -> Option<String> {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|s| s.to_string()))
    }

    /// Submit an action for `domain`.
    ///
    /// Runs promptly if the domain is cold; otherwise waits for the domain's
    /// cooldown to expire and for any in-flight action on the same domain to
    /// finish. Actions for one domain execute in submission order. Other
    /// domains are never blocked by this call.
    ///
    /// Returns when the action completes, fails, or is abandoned by
    /// [`stop_processing`](Self::stop_processing).
    pub async fn enqueue<F>(&self, domain: &str, action: F) -> DispatchOutcome
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut shutdown_rx = self.shutdown.subscribe();
        if *shutdown_rx.borrow() {
            warn!(domain, "limiter stopped, abandoning action");
            return DispatchOutcome::Abandoned;
        }

        // Clone the Arc out of the shard so the map lock is not held across
        // any await point.
        let queue = self
            .queues
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(DomainQueue::new()))
            .clone();

        let _gate = tokio::select! {
            guard = queue.gate.lock() => guard,
            _ = shutdown_rx.wait_for(|stopped| *stopped) => {
                warn!(domain, "limiter stopped while queued, abandoning action");
                return DispatchOutcome::Abandoned;
            }
        };

        // Wait out the cooldown while holding the gate. Re-check after every
        // sleep: set_cooldown may have extended it in the meantime.
        loop {
            let until = self.cooldowns.get(domain).map(|entry| *entry);
            match until {
                Some(until) if until > Instant::now() => {
                    debug!(
                        domain,
                        wait_ms = (until - Instant::now()).as_millis() as u64,
                        "waiting for cooldown"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep_until(until) => {}
                        _ = shutdown_rx.wait_for(|stopped| *stopped) => {
                            warn!(domain, "limiter stopped during cooldown wait, abandoning action");
                            return DispatchOutcome::Abandoned;
                        }
                    }
                }
                _ => break,
            }
        }

        // Run the action in its own task so a panic is contained there and
        // stop_processing can abort it.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            idle: Arc::clone(&self.idle),
        };
        let mut handle = tokio::spawn(async move {
            let _guard = guard;
            action.await
        });
        let task_id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        self.tasks.insert(task_id, handle.abort_handle());
        if *shutdown_rx.borrow() {
            // stop_processing raced the spawn; make sure this task dies too.
            handle.abort();
        }

        queue.record_dispatch();
        let outcome = match (&mut handle).await {
            Ok(Ok(())) => {
                debug!(domain, "action completed");
                DispatchOutcome::Completed
            }
            Ok(Err(err)) => {
                queue.record_failure();
                error!(domain, error = %err, "action failed");
                DispatchOutcome::Failed
            }
            Err(join_err) if join_err.is_cancelled() => {
                warn!(domain, "action abandoned during shutdown");
                DispatchOutcome::Abandoned
            }
            Err(join_err) => {
                queue.record_failure();
                error!(domain, error = %join_err, "action panicked");
                DispatchOutcome::Failed
            }
        };
        self.tasks.remove(&task_id);

        // Re-arm the cooldown from completion time, success or failure.
        self.cooldowns
            .insert(domain.to_string(), Instant::now() + self.config.cooldown);

        outcome
    }

    /// Put `domain` on cooldown for `duration` from now, extending but never
    /// shortening an existing cooldown. Used for manual backoff, e.g. after a
    /// 429 or 503 from the target site.
    pub fn set_cooldown(&self, domain: &str, duration: Duration) {
        let expiry = Instant::now() + duration;
        self.cooldowns
            .entry(domain.to_string())
            .and_modify(|current| {
                if *current < expiry {
                    *current = expiry;
                }
            })
            .or_insert(expiry);
        debug!(domain, cooldown_ms = duration.as_millis() as u64, "cooldown set");
    }

    /// Whether `domain` is currently on cooldown. False for unseen domains.
    pub fn is_on_cooldown(&self, domain: &str) -> bool {
        self.cooldowns
            .get(domain)
            .map(|entry| Instant::now() < *entry)
            .unwrap_or(false)
    }

    /// Begin accepting work. Safe to call repeatedly or with nothing pending.
    pub fn start_processing(&self) {
        self.shutdown.send_replace(false);
        info!("rate limiter accepting work");
    }

    /// Stop dispatching. Queued and cooldown-waiting actions are abandoned
    /// immediately; in-flight actions get the configured drain timeout, then
    /// are aborted. No background execution survives this call.
    pub async fn stop_processing(&self) {
        if self.shutdown.send_replace(true) {
            return; // already stopped
        }

        let deadline = Instant::now() + self.config.drain_timeout;
        while self.in_flight.load(Ordering::SeqCst) > 0 && Instant::now() < deadline {
            let _ = tokio::time::timeout_at(deadline, self.idle.notified()).await;
        }

        let remaining = self.tasks.len();
        if remaining > 0 {
            warn!(remaining, "drain timeout elapsed, aborting in-flight actions");
            for entry in self.tasks.iter() {
                entry.value().abort();
            }
            // Aborted futures drop at their next yield point; wait for the
            // in-flight count to confirm.
            let grace = Instant::now() + Duration::from_secs(1);
            while self.in_flight.load(Ordering::SeqCst) > 0 && Instant::now() < grace {
                let _ = tokio::time::timeout_at(grace, self.idle.notified()).await;
            }
        }

        info!("rate limiter stopped");
    }

    /// Dispatch counters for every domain seen so far.
    pub fn stats(&self) -> HashMap<String, DomainStats> {
        self.queues
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats()))
            .collect()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
