/*
[INPUT]:  Public API exports for the logview crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod ansi;
pub mod config;
pub mod levels;
pub mod pager;
pub mod sink;
pub mod timer;

// Re-export main types for convenience
pub use ansi::{RenderedLine, StyleState, StyledRun, parse_line, render_line, strip_line};
pub use config::ViewerConfig;
pub use levels::{LevelPalette, LogLevel};
pub use pager::{LogPager, LogWindow, NavControls, PagerOptions, PagerState, RefreshOutcome, SkipReason};
pub use sink::{HtmlSink, RecordingSink, RenderSink, TerminalMode, TerminalSink};
pub use timer::{TimerFacility, TimerHandle, TokioTimer};
