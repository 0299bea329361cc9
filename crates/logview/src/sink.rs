/*
[INPUT]:  Fetched log windows, fetch errors, navigation control states
[OUTPUT]: HTML snapshot files, terminal output, or recorded events
[POS]:    Presentation layer - where the pager's view updates land
[UPDATE]: When adding an output surface or changing document layout
*/

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::ansi::{PaletteColor, RenderedLine, escape_html};
use crate::levels::{LevelPalette, LogLevel};
use crate::pager::{LogWindow, NavControls};

/// Receives every view update the pager produces
pub trait RenderSink: Send + Sync {
    /// Replace the displayed lines; `lines[i]` is `window.lines[i]` parsed
    fn render_window(&self, window: &LogWindow, lines: &[RenderedLine]);

    /// Show a fetch failure; the last rendered lines stay
    fn render_error(&self, message: &str);

    fn update_controls(&self, controls: NavControls);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Window {
        start: u64,
        count: u32,
        has_more: bool,
        /// HTML of each rendered line
        html: Vec<String>,
    },
    Error(String),
    Controls(NavControls),
}

/// Keeps every update in order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        lock(&self.events).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// HTML lines of the most recent window
    pub fn last_window(&self) -> Option<Vec<String>> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            SinkEvent::Window { html, .. } => Some(html.clone()),
            _ => None,
        })
    }

    pub fn window_count(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|event| matches!(event, SinkEvent::Window { .. }))
            .count()
    }

    pub fn last_controls(&self) -> Option<NavControls> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            SinkEvent::Controls(controls) => Some(*controls),
            _ => None,
        })
    }

    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl RenderSink for RecordingSink {
    fn render_window(&self, window: &LogWindow, lines: &[RenderedLine]) {
        lock(&self.events).push(SinkEvent::Window {
            start: window.start,
            count: window.count,
            has_more: window.has_more,
            html: lines.iter().map(RenderedLine::to_html).collect(),
        });
    }

    fn render_error(&self, message: &str) {
        lock(&self.events).push(SinkEvent::Error(message.to_string()));
    }

    fn update_controls(&self, controls: NavControls) {
        lock(&self.events).push(SinkEvent::Controls(controls));
    }
}

#[derive(Debug, Default)]
struct HtmlView {
    meta: Option<String>,
    lines: Vec<String>,
    error: Option<String>,
    controls: Option<NavControls>,
}

/// Rewrites a standalone HTML snapshot of the window on every update
#[derive(Debug)]
pub struct HtmlSink {
    path: PathBuf,
    title: String,
    palette: LevelPalette,
    view: Mutex<HtmlView>,
}

impl HtmlSink {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>, palette: LevelPalette) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            palette,
            view: Mutex::new(HtmlView::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn publish(&self, view: &HtmlView) {
        let document = self.render_document(view);
        if let Err(err) = write_atomically(&self.path, &document) {
            warn!(path = %self.path.display(), error = %err, "failed to write html view");
        }
    }

    fn render_document(&self, view: &HtmlView) -> String {
        let mut out = String::new();
        let _ = writeln!(&mut out, "<!doctype html>");
        let _ = writeln!(&mut out, "<html lang=\"en\">");
        let _ = writeln!(&mut out, "<head>");
        let _ = writeln!(&mut out, "  <meta charset=\"utf-8\">");
        let _ = writeln!(&mut out, "  <title>{}</title>", escape_html(&self.title));
        let _ = writeln!(&mut out, "  <style>");
        self.write_stylesheet(&mut out);
        let _ = writeln!(&mut out, "  </style>");
        let _ = writeln!(&mut out, "</head>");
        let _ = writeln!(&mut out, "<body>");

        if let Some(meta) = &view.meta {
            let _ = writeln!(&mut out, "  <div class=\"meta\">{}</div>", escape_html(meta));
        }
        if let Some(controls) = view.controls {
            write_controls(&mut out, controls);
        }
        if let Some(error) = &view.error {
            let _ = writeln!(&mut out, "  <div class=\"error\">{}</div>", escape_html(error));
        }

        let _ = writeln!(&mut out, "  <pre class=\"log\">");
        for line in &view.lines {
            let _ = writeln!(&mut out, "{line}");
        }
        let _ = writeln!(&mut out, "</pre>");
        let _ = writeln!(&mut out, "</body>");
        let _ = writeln!(&mut out, "</html>");
        out
    }

    fn write_stylesheet(&self, out: &mut String) {
        let _ = writeln!(out, "    body {{ margin: 0; padding: 16px; background: #111; color: #ddd; }}");
        let _ = writeln!(
            out,
            "    pre {{ font: 13px/1.3 Menlo, Consolas, Monaco, monospace; white-space: pre-wrap; }}"
        );
        let _ = writeln!(
            out,
            "    .meta, .nav {{ color: #9aa0a6; font: 12px/1.4 Menlo, Consolas, Monaco, monospace; margin-bottom: 8px; }}"
        );
        let _ = writeln!(out, "    .nav .off {{ opacity: 0.4; }}");
        let _ = writeln!(out, "    .error {{ color: #ff6b6b; margin-bottom: 8px; }}");
        for color in PaletteColor::ALL {
            let (r, g, b) = color.rgb();
            let _ = writeln!(out, "    .{} {{ color: #{r:02x}{g:02x}{b:02x}; }}", color.css_class());
        }
        let _ = writeln!(out, "    .ansi-bold {{ font-weight: bold; }}");
        let _ = writeln!(out, "    .ansi-dim {{ opacity: 0.6; }}");
        let _ = writeln!(out, "    .ansi-italic {{ font-style: italic; }}");
        let _ = writeln!(out, "    .ansi-underline {{ text-decoration: underline; }}");
        for level in LogLevel::ALL {
            if let Some((r, g, b)) = self.palette.color(level) {
                let _ = writeln!(
                    out,
                    "    .{} {{ border-left: 2px solid #{r:02x}{g:02x}{b:02x}; padding-left: 4px; }}",
                    level.css_class()
                );
            }
        }
    }

    fn line_markup(&self, line: &RenderedLine) -> String {
        match self.palette.classify(line) {
            Some(level) => format!("<span class=\"{}\">{}</span>", level.css_class(), line.to_html()),
            None => line.to_html(),
        }
    }
}

fn write_controls(out: &mut String, controls: NavControls) {
    let flag = |on: bool, label: &str| {
        if on {
            format!("<span>{label}</span>")
        } else {
            format!("<span class=\"off\">{label}</span>")
        }
    };
    let auto = if controls.auto_refresh { "auto-refresh: on" } else { "auto-refresh: off" };
    let _ = writeln!(
        out,
        "  <div class=\"nav\">{} {} {} <span>{auto}</span></div>",
        flag(controls.prev, "prev"),
        flag(controls.next, "next"),
        flag(controls.refresh, "refresh"),
    );
}

/// Stage beside the target and rename over it
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    fs::write(&staging, contents).with_context(|| format!("write {}", staging.display()))?;
    fs::rename(&staging, path).with_context(|| format!("rename onto {}", path.display()))?;
    Ok(())
}

impl RenderSink for HtmlSink {
    fn render_window(&self, window: &LogWindow, lines: &[RenderedLine]) {
        let mut view = lock(&self.view);
        view.lines = lines.iter().map(|line| self.line_markup(line)).collect();
        view.meta = Some(format!(
            "{} | fetched {}",
            window.range_label(),
            window.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        view.error = None;
        self.publish(&view);
    }

    fn render_error(&self, message: &str) {
        let mut view = lock(&self.view);
        view.error = Some(message.to_string());
        self.publish(&view);
    }

    fn update_controls(&self, controls: NavControls) {
        let mut view = lock(&self.view);
        view.controls = Some(controls);
        self.publish(&view);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalMode {
    /// Re-encode styles as SGR
    Ansi,
    /// Escape sequences stripped
    Plain,
}

/// Writes each window to a terminal-like stream
pub struct TerminalSink {
    mode: TerminalMode,
    out: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for TerminalSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSink").field("mode", &self.mode).finish()
    }
}

impl TerminalSink {
    pub fn new(mode: TerminalMode, out: impl Write + Send + 'static) -> Self {
        Self {
            mode,
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn stdout(mode: TerminalMode) -> Self {
        Self::new(mode, io::stdout())
    }

    fn emit(&self, text: &str) {
        let mut out = lock(&self.out);
        if let Err(err) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            warn!(error = %err, "failed to write terminal view");
        }
    }
}

impl RenderSink for TerminalSink {
    fn render_window(&self, window: &LogWindow, lines: &[RenderedLine]) {
        let mut text = format!("-- {} --\n", window.range_label());
        for line in lines {
            match self.mode {
                TerminalMode::Ansi => text.push_str(&line.to_ansi()),
                TerminalMode::Plain => text.push_str(&line.plain_text()),
            }
            text.push('\n');
        }
        self.emit(&text);
    }

    fn render_error(&self, message: &str) {
        self.emit(&format!("error: {message}\n"));
    }

    fn update_controls(&self, controls: NavControls) {
        debug!(?controls, "navigation controls updated");
    }
}
