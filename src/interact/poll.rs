//! Bounded polling and retry primitives.
//!
//! These two helpers carry the synchronization discipline for the whole
//! element layer: every explicit wait is a [`poll_until`] against the
//! configured deadline, and every transient-failure recovery is a
//! [`retry_transient`] with a fixed attempt bound and backoff. Keeping
//! them generic lets the timing and attempt-count contracts be tested
//! without a browser.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

/// Repeatedly evaluate `probe` until it yields a value or `deadline`
/// elapses. The probe runs once immediately, then at most every
/// `interval`; a final evaluation happens at the deadline itself, so a
/// condition that becomes true at `t < deadline` is observed at
/// approximately `t`, and one that never holds fails at approximately
/// `deadline`, not later.
pub async fn poll_until<T, F, Fut>(deadline: Duration, interval: Duration, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>> + Send,
{
    let end = Instant::now() + deadline;
    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }
        let now = Instant::now();
        if now >= end {
            return None;
        }
        tokio::time::sleep_until((now + interval).min(end)).await;
    }
}

/// Run `op` up to `max_attempts` times, sleeping `backoff` between
/// attempts, retrying only while `transient` classifies the error as
/// recoverable. The final error (transient or not) is returned as-is;
/// callers decide how to wrap exhaustion.
pub async fn retry_transient<T, E, F, Fut, P>(
    max_attempts: usize,
    backoff: Duration,
    mut op: F,
    transient: P,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && transient(&err) => {
                warn!("attempt {attempt} of {max_attempts} failed: {err}, retrying");
                tokio::time::sleep(backoff).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_millis(250);

    #[tokio::test(start_paused = true)]
    async fn probe_that_succeeds_returns_promptly() {
        let start = Instant::now();
        let calls = AtomicUsize::new(0);

        // Becomes "visible" on the third poll, i.e. at ~500ms.
        let found = poll_until(Duration::from_secs(10), INTERVAL, async || {
            if calls.fetch_add(1, Ordering::SeqCst) >= 2 {
                Some("here")
            } else {
                None
            }
        })
        .await;

        assert_eq!(found, Some("here"));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_that_never_succeeds_fails_at_the_deadline() {
        let start = Instant::now();

        let found: Option<()> =
            poll_until(Duration::from_secs(3), INTERVAL, async || None).await;

        assert!(found.is_none());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(3) + INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn final_probe_lands_on_the_deadline() {
        // Deadline is not a multiple of the interval; the last probe
        // must still happen at exactly the deadline.
        let calls = AtomicUsize::new(0);
        let found = poll_until(Duration::from_millis(600), INTERVAL, async || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            (n == 3).then_some(n)
        })
        .await;

        // Probes at 0, 250, 500, 600ms.
        assert_eq!(found, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_recover_within_the_bound() {
        let calls = AtomicUsize::new(0);

        let result: Result<usize, String> = retry_transient(
            3,
            Duration::from_millis(500),
            async || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(format!("stale on attempt {n}")) } else { Ok(n) }
            },
            |_| true,
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_stops_at_exactly_max_attempts() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), String> = retry_transient(
            3,
            Duration::from_millis(500),
            async || {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("never stabilizes".to_string())
            },
            |_| true,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), String> = retry_transient(
            3,
            Duration::from_millis(500),
            async || {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("timeout".to_string())
            },
            |err| err.contains("stale"),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
