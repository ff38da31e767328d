//! Time source
//!
//! Backoff, pacing and cache expiry all go through [`Clock`] so tests can run
//! them on virtual time.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time as unix millis
    fn now_millis(&self) -> i64;

    async fn sleep(&self, duration: Duration);
}

/// Wall clock + tokio timers
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock: `sleep` returns immediately, advances time and is recorded
#[derive(Debug, Default)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    now: i64,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: start_millis,
                sleeps: Vec::new(),
            }),
        }
    }

    /// Move virtual time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.now += duration.as_millis() as i64;
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    /// Recorded sleeps as whole milliseconds
    pub fn sleeps_millis(&self) -> Vec<u64> {
        self.lock()
            .sleeps
            .iter()
            .map(|d| d.as_millis() as u64)
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // A poisoned lock only means a test panicked mid-update; the data is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.lock().now
    }

    async fn sleep(&self, duration: Duration) {
        {
            let mut state = self.lock();
            state.now += duration.as_millis() as i64;
            state.sleeps.push(duration);
        }
        tokio::task::yield_now().await;
    }
}
