/*
[INPUT]:  LogSource collaborator, RenderSink, TimerFacility, navigation calls
[OUTPUT]: Window state transitions, rendered pages and navigation controls
[POS]:    Paging layer - single-flight window controller with auto-refresh
[UPDATE]: When navigation semantics or refresh discipline change
*/

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use logview_adapter::{LogPage, LogSource, LogWindowRequest, LogviewError};
use tracing::{debug, info, warn};

use crate::ansi::RenderedLine;
use crate::sink::RenderSink;
use crate::timer::{TimerAction, TimerFacility, TimerHandle};

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_AUTO_REFRESH_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Fetching,
}

/// Window position and refresh flags owned by one pager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerState {
    pub start: u64,
    pub count: u32,
    pub has_more: bool,
    pub fetch_in_flight: bool,
    pub auto_refresh_active: bool,
}

impl PagerState {
    pub fn new(start: u64, count: u32) -> Self {
        Self {
            start,
            count: count.max(1),
            has_more: true,
            fetch_in_flight: false,
            auto_refresh_active: false,
        }
    }

    pub fn phase(&self) -> FetchPhase {
        if self.fetch_in_flight {
            FetchPhase::Fetching
        } else {
            FetchPhase::Idle
        }
    }

    pub fn controls(&self) -> NavControls {
        let idle = !self.fetch_in_flight;
        NavControls {
            prev: idle && self.start > 0,
            next: idle && self.has_more,
            refresh: idle,
            auto_refresh: self.auto_refresh_active,
        }
    }
}

/// Which navigation affordances are actionable right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavControls {
    pub prev: bool,
    pub next: bool,
    pub refresh: bool,
    /// Auto-refresh is armed (toggle label, not an enabled flag)
    pub auto_refresh: bool,
}

/// Lines last fetched for `[start, start + count)`; replaced wholesale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogWindow {
    pub start: u64,
    pub count: u32,
    pub lines: Vec<String>,
    pub has_more: bool,
    pub fetched_at: DateTime<Utc>,
}

impl LogWindow {
    /// Human status, 1-based: `lines 101-200`
    pub fn range_label(&self) -> String {
        if self.lines.is_empty() {
            return format!("no lines at offset {}", self.start);
        }
        let first = self.start.saturating_add(1);
        let last = self.start.saturating_add(self.lines.len() as u64);
        format!("lines {first}-{last}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is outstanding
    InFlight,
    /// `next_page` with nothing past the window
    NoMorePages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated { start: u64, lines: usize, has_more: bool },
    Failed { message: String },
    Skipped(SkipReason),
}

#[derive(Debug, Clone)]
pub struct PagerOptions {
    pub page_size: u32,
    pub start: u64,
    pub auto_refresh_interval: Duration,
}

impl Default for PagerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            start: 0,
            auto_refresh_interval: DEFAULT_AUTO_REFRESH_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Navigation {
    Stay,
    Next,
    Prev,
}

struct Shared {
    state: PagerState,
    window: Option<LogWindow>,
    auto_refresh: Option<TimerHandle>,
}

struct PagerInner {
    source: Arc<dyn LogSource>,
    sink: Arc<dyn RenderSink>,
    timer: Arc<dyn TimerFacility>,
    interval: Duration,
    shared: Mutex<Shared>,
}

impl PagerInner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        lock_shared(&self.shared)
    }
}

fn lock_shared(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight flag if a fetch future is dropped before settling.
struct InFlight<'a> {
    shared: &'a Mutex<Shared>,
    armed: bool,
}

impl InFlight<'_> {
    /// Return to Idle and apply the outcome under the same lock
    fn settle<T>(mut self, apply: impl FnOnce(&mut Shared) -> T) -> T {
        self.armed = false;
        let mut shared = lock_shared(self.shared);
        shared.state.fetch_in_flight = false;
        apply(&mut shared)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock_shared(self.shared).state.fetch_in_flight = false;
        }
    }
}

/// Moving window over a remote, append-only log.
///
/// Cloning yields another handle onto the same window. At most one fetch is
/// outstanding at a time; calls made meanwhile are dropped, not queued.
#[derive(Clone)]
pub struct LogPager {
    inner: Arc<PagerInner>,
}

impl fmt::Debug for LogPager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogPager")
            .field("state", &self.state())
            .field("interval", &self.inner.interval)
            .finish()
    }
}

impl LogPager {
    pub fn new(
        source: Arc<dyn LogSource>,
        sink: Arc<dyn RenderSink>,
        timer: Arc<dyn TimerFacility>,
        options: PagerOptions,
    ) -> Self {
        let state = PagerState::new(options.start, options.page_size);
        Self {
            inner: Arc::new(PagerInner {
                source,
                sink,
                timer,
                interval: options.auto_refresh_interval,
                shared: Mutex::new(Shared {
                    state,
                    window: None,
                    auto_refresh: None,
                }),
            }),
        }
    }

    pub fn state(&self) -> PagerState {
        self.inner.lock().state
    }

    pub fn phase(&self) -> FetchPhase {
        self.state().phase()
    }

    pub fn controls(&self) -> NavControls {
        self.state().controls()
    }

    /// Last successfully fetched window
    pub fn window(&self) -> Option<LogWindow> {
        self.inner.lock().window.clone()
    }

    /// Re-fetch the current window
    pub async fn refresh(&self) -> RefreshOutcome {
        self.navigate(Navigation::Stay).await
    }

    /// Advance one page; does nothing unless more lines exist
    pub async fn next_page(&self) -> RefreshOutcome {
        self.navigate(Navigation::Next).await
    }

    /// Step back one page, clamped at offset 0 (which re-fetches page one)
    pub async fn prev_page(&self) -> RefreshOutcome {
        self.navigate(Navigation::Prev).await
    }

    /// Flip auto-refresh. Turning it on refreshes at once and arms one
    /// recurring timer; turning it off disarms it. Returns the new setting.
    pub async fn toggle_auto_refresh(&self) -> bool {
        let (active, previous) = {
            let mut shared = self.inner.lock();
            let active = !shared.state.auto_refresh_active;
            shared.state.auto_refresh_active = active;
            (active, shared.auto_refresh.take())
        };
        if let Some(previous) = previous {
            previous.cancel();
        }

        // The timer facility is called with the pager unlocked.
        let armed = active.then(|| self.inner.timer.every(self.inner.interval, self.tick_action()));

        let controls = {
            let mut shared = self.inner.lock();
            if let Some(handle) = armed {
                // A concurrent toggle may have turned auto-refresh off or armed its own timer.
                if shared.state.auto_refresh_active && shared.auto_refresh.is_none() {
                    shared.auto_refresh = Some(handle);
                } else {
                    handle.cancel();
                }
            }
            shared.state.controls()
        };

        info!(
            active,
            interval_ms = self.inner.interval.as_millis() as u64,
            "auto-refresh toggled"
        );
        self.inner.sink.update_controls(controls);

        if active {
            self.refresh().await;
        }
        active
    }

    /// Disarm auto-refresh if it is on; called before the view goes away
    pub fn shutdown(&self) {
        let controls = {
            let mut shared = self.inner.lock();
            let Some(handle) = shared.auto_refresh.take() else {
                return;
            };
            handle.cancel();
            shared.state.auto_refresh_active = false;
            shared.state.controls()
        };
        info!("auto-refresh stopped");
        self.inner.sink.update_controls(controls);
    }

    fn tick_action(&self) -> TimerAction {
        let pager: Weak<PagerInner> = Arc::downgrade(&self.inner);
        Arc::new(move || {
            let pager = pager.clone();
            async move {
                let Some(inner) = pager.upgrade() else {
                    return;
                };
                if let RefreshOutcome::Skipped(reason) = (LogPager { inner }).refresh().await {
                    debug!(?reason, "auto-refresh tick skipped");
                }
            }
            .boxed()
        })
    }

    fn begin_fetch(&self, navigation: Navigation) -> Result<(LogWindowRequest, NavControls), SkipReason> {
        let mut shared = self.inner.lock();
        let state = &mut shared.state;
        if state.fetch_in_flight {
            return Err(SkipReason::InFlight);
        }

        let step = u64::from(state.count);
        match navigation {
            Navigation::Stay => {}
            Navigation::Next => {
                if !state.has_more {
                    return Err(SkipReason::NoMorePages);
                }
                state.start = state.start.saturating_add(step);
            }
            Navigation::Prev => state.start = state.start.saturating_sub(step),
        }

        state.fetch_in_flight = true;
        Ok((LogWindowRequest::new(state.start, state.count), state.controls()))
    }

    async fn navigate(&self, navigation: Navigation) -> RefreshOutcome {
        let (request, controls) = match self.begin_fetch(navigation) {
            Ok(issued) => issued,
            Err(reason) => {
                debug!(?navigation, ?reason, "navigation skipped");
                return RefreshOutcome::Skipped(reason);
            }
        };
        let flight = InFlight {
            shared: &self.inner.shared,
            armed: true,
        };
        self.inner.sink.update_controls(controls);

        debug!(start = request.start, count = request.count, "fetching log window");
        match self.inner.source.fetch_window(request).await {
            Ok(page) => self.apply_page(flight, request, page),
            Err(err) => self.apply_failure(flight, request, err),
        }
    }

    fn apply_page(&self, flight: InFlight<'_>, request: LogWindowRequest, page: LogPage) -> RefreshOutcome {
        let LogPage { mut lines, mut has_more } = page;
        let limit = usize::try_from(request.count).unwrap_or(usize::MAX);
        if lines.len() > limit {
            warn!(
                start = request.start,
                count = request.count,
                received = lines.len(),
                "log source returned more lines than requested; truncating"
            );
            lines.truncate(limit);
            has_more = true;
        }

        let window = LogWindow {
            start: request.start,
            count: request.count,
            lines,
            has_more,
            fetched_at: Utc::now(),
        };
        let rendered: Vec<RenderedLine> = window.lines.iter().map(|line| RenderedLine::parse(line)).collect();

        let controls = flight.settle(|shared| {
            shared.state.has_more = window.has_more;
            shared.window = Some(window.clone());
            shared.state.controls()
        });

        debug!(
            start = window.start,
            lines = window.lines.len(),
            has_more = window.has_more,
            "log window applied"
        );
        self.inner.sink.render_window(&window, &rendered);
        self.inner.sink.update_controls(controls);

        RefreshOutcome::Updated {
            start: window.start,
            lines: window.lines.len(),
            has_more: window.has_more,
        }
    }

    fn apply_failure(&self, flight: InFlight<'_>, request: LogWindowRequest, err: LogviewError) -> RefreshOutcome {
        warn!(
            start = request.start,
            count = request.count,
            retryable = err.is_retryable(),
            error = %err,
            "log window fetch failed"
        );
        let message = err.to_string();
        let controls = flight.settle(|shared| shared.state.controls());

        self.inner.sink.render_error(&message);
        self.inner.sink.update_controls(controls);

        RefreshOutcome::Failed { message }
    }
}
