/*
[INPUT]:  Window position chosen by the pager
[OUTPUT]: Query parameters for the log window endpoint
[POS]:    Data layer - request types
[UPDATE]: When the log server query schema changes
*/

use serde::{Deserialize, Serialize};

/// Half-open range `[start, start + count)` of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogWindowRequest {
    pub start: u64,
    pub count: u32,
}

impl LogWindowRequest {
    pub fn new(start: u64, count: u32) -> Self {
        Self { start, count }
    }

    /// Exclusive end offset of the requested range
    pub fn end(&self) -> u64 {
        self.start.saturating_add(u64::from(self.count))
    }
}
