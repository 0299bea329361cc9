/*
[INPUT]:  A period and an async action to repeat
[OUTPUT]: A handle that disarms the recurring action
[POS]:    Timer facility seam - injected into the pager for auto-refresh
[UPDATE]: When changing how recurring actions are scheduled or cancelled
*/

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Recurring action; each call yields the future for one firing
pub type TimerAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// "Call this every period" / "cancel it".
///
/// `every` is called with no pager lock held, so it may read pager state.
pub trait TimerFacility: Send + Sync {
    fn every(&self, period: Duration, action: TimerAction) -> TimerHandle;
}

/// Disarms its recurring action on `cancel` or drop
#[derive(Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Timer backed by a tokio task per armed action
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl TimerFacility for TokioTimer {
    fn every(&self, period: Duration, action: TimerAction) -> TimerHandle {
        let token = CancellationToken::new();
        let shutdown = token.clone();

        tokio::spawn(async move {
            // First firing is one period out; callers refresh immediately themselves.
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                // A firing already under way completes; the next select observes cancellation.
                action().await;
            }
            debug!(period_ms = period.as_millis() as u64, "recurring timer stopped");
        });

        TimerHandle::new(token)
    }
}
