/*
[INPUT]:  Test scenarios for the pager and its collaborators
[OUTPUT]: In-memory log source, manual timer, and pager builders
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for logview tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use logview::timer::TimerAction;
use logview::{LogPager, PagerOptions, RecordingSink, TimerFacility, TimerHandle};
use logview_adapter::{LogPage, LogSource, LogWindowRequest, LogviewError, Result};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Append-only log of `total` numbered lines served from memory
pub struct FakeLog {
    total: Mutex<u64>,
    requests: Mutex<Vec<LogWindowRequest>>,
    failing: AtomicBool,
    extra_lines: usize,
    gate: Option<Semaphore>,
}

impl FakeLog {
    pub fn new(total: u64) -> Self {
        Self {
            total: Mutex::new(total),
            requests: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            extra_lines: 0,
            gate: None,
        }
    }

    /// Every fetch parks until `release` hands it a permit
    pub fn gated(total: u64) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(total)
        }
    }

    /// Answer with more lines than were asked for
    pub fn overfilling(total: u64, extra_lines: usize) -> Self {
        Self {
            extra_lines,
            ..Self::new(total)
        }
    }

    pub fn release(&self, fetches: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(fetches);
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn append(&self, lines: u64) {
        *self.total.lock().unwrap() += lines;
    }

    pub fn requests(&self) -> Vec<LogWindowRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Yield until `count` fetches have been issued
    pub async fn wait_for_fetches(&self, count: usize) {
        while self.fetch_count() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl LogSource for FakeLog {
    async fn fetch_window(&self, request: LogWindowRequest) -> Result<LogPage> {
        self.requests.lock().unwrap().push(request);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(LogviewError::Api {
                code: 503,
                message: "log server unavailable".to_string(),
            });
        }

        let total = *self.total.lock().unwrap();
        let end = request.end().min(total) + self.extra_lines as u64;
        let lines = (request.start..end.max(request.start))
            .map(|n| format!("\u{1b}[32mline {n}\u{1b}[0m"))
            .collect();
        Ok(LogPage {
            lines,
            has_more: request.end() < total,
        })
    }
}

struct Armed {
    period: Duration,
    action: TimerAction,
    token: CancellationToken,
}

/// Timer that only fires when the test says so
#[derive(Default)]
pub struct ManualTimer {
    armed: Mutex<Vec<Armed>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers armed and not yet cancelled
    pub fn live_timers(&self) -> usize {
        self.armed
            .lock()
            .unwrap()
            .iter()
            .filter(|armed| !armed.token.is_cancelled())
            .count()
    }

    pub fn total_armed(&self) -> usize {
        self.armed.lock().unwrap().len()
    }

    pub fn periods(&self) -> Vec<Duration> {
        self.armed.lock().unwrap().iter().map(|armed| armed.period).collect()
    }

    /// Run one firing of every live timer
    pub async fn fire(&self) {
        let actions: Vec<TimerAction> = self
            .armed
            .lock()
            .unwrap()
            .iter()
            .filter(|armed| !armed.token.is_cancelled())
            .map(|armed| armed.action.clone())
            .collect();
        for action in actions {
            action().await;
        }
    }
}

impl TimerFacility for ManualTimer {
    fn every(&self, period: Duration, action: TimerAction) -> TimerHandle {
        let token = CancellationToken::new();
        self.armed.lock().unwrap().push(Armed {
            period,
            action,
            token: token.clone(),
        });
        TimerHandle::new(token)
    }
}

pub fn options(page_size: u32) -> PagerOptions {
    PagerOptions {
        page_size,
        ..PagerOptions::default()
    }
}

pub fn build_pager(
    source: Arc<FakeLog>,
    sink: Arc<RecordingSink>,
    timer: Arc<dyn TimerFacility>,
    options: PagerOptions,
) -> LogPager {
    LogPager::new(source, sink, timer, options)
}
