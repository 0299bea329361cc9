/*
[INPUT]:  Window requests from a pager
[OUTPUT]: Pages of raw log lines or an adapter error
[POS]:    Collaborator seam - anything that can serve log windows
[UPDATE]: When the fetch contract between pager and log server changes
*/

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{LogviewClient, Result};
use crate::types::{LogPage, LogWindowRequest};

/// Source of log windows consumed by the pager.
///
/// Any `Err` is "failure to obtain this page"; callers do not distinguish
/// transport failures from error bodies.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch_window(&self, request: LogWindowRequest) -> Result<LogPage>;
}

#[async_trait]
impl LogSource for LogviewClient {
    async fn fetch_window(&self, request: LogWindowRequest) -> Result<LogPage> {
        LogviewClient::fetch_window(self, request).await
    }
}

#[async_trait]
impl<T: LogSource + ?Sized> LogSource for Arc<T> {
    async fn fetch_window(&self, request: LogWindowRequest) -> Result<LogPage> {
        (**self).fetch_window(request).await
    }
}
