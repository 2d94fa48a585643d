//! Suspending wait-until primitive.
//!
//! Probes are polled at a fixed interval until they produce a value or the
//! timeout elapses. The probe runs once before the first sleep, so a value
//! that is already present costs no delay.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("condition not met within {waited:?}")]
pub struct WaitTimeout {
    pub waited: Duration,
}

impl WaitTimeout {
    pub fn waited_ms(&self) -> u64 {
        u64::try_from(self.waited.as_millis()).unwrap_or(u64::MAX)
    }
}

#[derive(Error, Debug)]
pub enum WaitError<E> {
    #[error(transparent)]
    TimedOut(#[from] WaitTimeout),

    #[error("probe failed: {0}")]
    Probe(E),
}

pub async fn wait_until<T, F, Fut>(
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> Result<T, WaitTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let started = Instant::now();
    loop {
        if let Some(value) = probe().await {
            return Ok(value);
        }
        let waited = started.elapsed();
        if waited >= timeout {
            return Err(WaitTimeout { waited });
        }
        tokio::time::sleep(interval.min(timeout - waited)).await;
    }
}

/// Like [`wait_until`], but a probe error ends the wait immediately
pub async fn try_wait_until<T, E, F, Fut>(
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = Instant::now();
    loop {
        if let Some(value) = probe().await.map_err(WaitError::Probe)? {
            return Ok(value);
        }
        let waited = started.elapsed();
        if waited >= timeout {
            return Err(WaitTimeout { waited }.into());
        }
        tokio::time::sleep(interval.min(timeout - waited)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_ready_value_returns_without_sleeping() {
        let started = Instant::now();
        let value = wait_until(Duration::from_millis(200), Duration::from_secs(1), || async {
            Some(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
        assert!(started.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_value_appears_after_polls() {
        let polls = AtomicU32::new(0);
        let value = wait_until(Duration::from_millis(200), Duration::from_secs(15), || {
            let n = polls.fetch_add(1, Ordering::SeqCst);
            async move { (n >= 3).then_some("ready") }
        })
        .await
        .unwrap();
        assert_eq!(value, "ready");
        assert_eq!(polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_at_deadline() {
        let started = Instant::now();
        let err = wait_until(Duration::from_millis(200), Duration::from_millis(1_000), || async {
            None::<()>
        })
        .await
        .unwrap_err();
        assert!(err.waited_ms() >= 1_000);
        assert!(started.elapsed() < Duration::from_millis(1_100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_stops_waiting() {
        let err = try_wait_until(Duration::from_millis(200), Duration::from_secs(5), || async {
            Err::<Option<()>, _>("page gone")
        })
        .await
        .unwrap_err();
        assert!(matches!(err, WaitError::Probe("page gone")));
    }
}
