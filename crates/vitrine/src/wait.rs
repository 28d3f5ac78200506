//! Wait mechanisms: load states, timeouts and polling.
//!
//! Everything that waits in Vitrine goes through [`poll_until`], so the
//! deadline and poll cadence come from one [`Timeouts`] value per page handle.

use crate::result::{VitrineError, VitrineResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

/// Default navigation timeout (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default action timeout (5 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5_000;

/// Default expectation timeout (5 seconds)
pub const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Network idle threshold (500ms without requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

/// Page load states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// The `load` event fired
    Load,
    /// `DOMContentLoaded` fired; subresources may still be loading
    #[default]
    DomContentLoaded,
    /// No network activity for the idle window
    NetworkIdle,
}

impl LoadState {
    /// Event name as the browser reports it
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::NetworkIdle => "networkidle",
        }
    }

    /// `document.readyState` values that satisfy this state
    #[must_use]
    pub const fn ready_states(&self) -> &'static [&'static str] {
        match self {
            Self::DomContentLoaded => &["interactive", "complete"],
            Self::Load | Self::NetworkIdle => &["complete"],
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

/// Deadlines applied to every driver interaction of one page handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Bound on navigation and load-state waits
    #[serde(with = "millis")]
    pub navigation: Duration,
    /// Bound on waiting for an element before acting on it
    #[serde(with = "millis")]
    pub action: Duration,
    /// Bound on retrying an expectation
    #[serde(with = "millis")]
    pub expect: Duration,
    /// Delay between polls
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    /// Quiet period that counts as network idle
    #[serde(with = "millis")]
    pub network_idle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_millis(DEFAULT_NAVIGATION_TIMEOUT_MS),
            action: Duration::from_millis(DEFAULT_ACTION_TIMEOUT_MS),
            expect: Duration::from_millis(DEFAULT_EXPECT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            network_idle: Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS),
        }
    }
}

impl Timeouts {
    /// Near-zero deadlines, for unit tests against the mock driver
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            navigation: Duration::from_millis(50),
            action: Duration::from_millis(20),
            expect: Duration::from_millis(20),
            poll_interval: Duration::from_millis(5),
            network_idle: Duration::from_millis(10),
        }
    }

    /// Set the action timeout
    #[must_use]
    pub const fn with_action(mut self, action: Duration) -> Self {
        self.action = action;
        self
    }

    /// Set the expectation timeout
    #[must_use]
    pub const fn with_expect(mut self, expect: Duration) -> Self {
        self.expect = expect;
        self
    }

    /// Set the navigation timeout
    #[must_use]
    pub const fn with_navigation(mut self, navigation: Duration) -> Self {
        self.navigation = navigation;
        self
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Poll `check` until it yields `Some`, or the timeout passes.
///
/// Returns `Ok(None)` on timeout so callers can pick the error that fits.
/// An `Err` from `check` stops polling immediately.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> VitrineResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = VitrineResult<Option<T>>>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = check().await? {
            return Ok(Some(value));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        tokio::time::sleep(interval).await;
    }
}

/// Like [`poll_until`] but a timeout becomes [`VitrineError::Timeout`]
pub async fn poll_or_timeout<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    check: F,
) -> VitrineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = VitrineResult<Option<T>>>,
{
    poll_until(timeout, interval, check)
        .await?
        .ok_or(VitrineError::Timeout {
            ms: timeout.as_millis() as u64,
        })
}

/// Detects a quiet network window from successive resource counts.
///
/// Fed with the number of resource entries the page has loaded so far; idle
/// once the count has not changed for the configured window.
#[derive(Debug, Clone)]
pub struct NetworkIdleTracker {
    window: Duration,
    last_count: Option<usize>,
    quiet_since: Option<Instant>,
}

impl NetworkIdleTracker {
    /// Create a tracker with the given quiet window
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_count: None,
            quiet_since: None,
        }
    }

    /// Record an observation; returns true once the network is idle
    pub fn observe(&mut self, resource_count: usize, now: Instant) -> bool {
        if self.last_count == Some(resource_count) {
            let since = *self.quiet_since.get_or_insert(now);
            now.duration_since(since) >= self.window
        } else {
            self.last_count = Some(resource_count);
            self.quiet_since = Some(now);
            self.window.is_zero()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_default_is_dom_content_loaded() {
            assert_eq!(LoadState::default(), LoadState::DomContentLoaded);
        }

        #[test]
        fn test_ready_states() {
            assert!(LoadState::DomContentLoaded
                .ready_states()
                .contains(&"interactive"));
            assert_eq!(LoadState::NetworkIdle.ready_states(), &["complete"]);
        }

        #[test]
        fn test_display() {
            assert_eq!(LoadState::NetworkIdle.to_string(), "networkidle");
        }
    }

    mod timeouts_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let t = Timeouts::default();
            assert_eq!(t.network_idle, Duration::from_millis(500));
            assert_eq!(t.navigation, Duration::from_secs(30));
        }

        #[test]
        fn test_yaml_millis() {
            let t: Timeouts = serde_yaml_ng::from_str(
                "navigation: 1000\naction: 200\nexpect: 300\npoll_interval: 10\nnetwork_idle: 500\n",
            )
            .unwrap();
            assert_eq!(t.action, Duration::from_millis(200));
            assert_eq!(t.expect, Duration::from_millis(300));
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test]
        async fn test_poll_until_returns_first_some() {
            let calls = AtomicUsize::new(0);
            let got = poll_until(Duration::from_secs(1), Duration::from_millis(1), || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok((n >= 2).then_some(n))
            })
            .await
            .unwrap();
            assert_eq!(got, Some(2));
        }

        #[tokio::test]
        async fn test_poll_until_times_out_with_none() {
            let got: Option<()> =
                poll_until(Duration::from_millis(10), Duration::from_millis(2), || async {
                    Ok(None)
                })
                .await
                .unwrap();
            assert!(got.is_none());
        }

        #[tokio::test]
        async fn test_poll_or_timeout_maps_to_timeout_error() {
            let err = poll_or_timeout::<(), _, _>(
                Duration::from_millis(5),
                Duration::from_millis(1),
                || async { Ok(None) },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, VitrineError::Timeout { ms: 5 }));
        }

        #[tokio::test]
        async fn test_poll_stops_on_error() {
            let calls = AtomicUsize::new(0);
            let err = poll_until::<(), _, _>(Duration::from_secs(1), Duration::from_millis(1), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(VitrineError::driver("session closed"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, VitrineError::Driver { .. }));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    mod network_idle_tests {
        use super::*;

        #[test]
        fn test_idle_after_quiet_window() {
            let start = Instant::now();
            let mut tracker = NetworkIdleTracker::new(Duration::from_millis(500));
            assert!(!tracker.observe(3, start));
            assert!(!tracker.observe(3, start + Duration::from_millis(200)));
            assert!(tracker.observe(3, start + Duration::from_millis(500)));
        }

        #[test]
        fn test_new_request_resets_window() {
            let start = Instant::now();
            let mut tracker = NetworkIdleTracker::new(Duration::from_millis(500));
            tracker.observe(3, start);
            assert!(!tracker.observe(4, start + Duration::from_millis(400)));
            assert!(!tracker.observe(4, start + Duration::from_millis(800)));
            assert!(tracker.observe(4, start + Duration::from_millis(900)));
        }
    }
}
