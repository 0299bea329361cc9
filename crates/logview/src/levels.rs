/*
[INPUT]:  Producer level colors (defaults or hex overrides) and parsed lines
[OUTPUT]: Producer-shaped colored lines and level classification of rendered lines
[POS]:    Rendering layer - maps the log producer's truecolor levels to CSS hooks
[UPDATE]: When the producer's level set or default colors change
*/

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};

use crate::ansi::{Foreground, RenderedLine};

/// Levels the remote log producer colors its lines with
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [LogLevel::Info, LogLevel::Warn, LogLevel::Error, LogLevel::Debug];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            LogLevel::Info => "level-info",
            LogLevel::Warn => "level-warn",
            LogLevel::Error => "level-error",
            LogLevel::Debug => "level-debug",
        }
    }

    fn default_hex(self) -> &'static str {
        match self {
            LogLevel::Info => "#00FF00",
            LogLevel::Warn => "#FFFF00",
            LogLevel::Error => "#FF0000",
            LogLevel::Debug => "#999999",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| anyhow!("unknown log level: {value}"))
    }
}

/// Parse `#RRGGBB` (leading `#` optional)
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Truecolor per level, as the producer prints it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelPalette {
    colors: BTreeMap<LogLevel, (u8, u8, u8)>,
}

impl Default for LevelPalette {
    fn default() -> Self {
        let colors = LogLevel::ALL
            .into_iter()
            .filter_map(|level| parse_hex_color(level.default_hex()).map(|rgb| (level, rgb)))
            .collect();
        Self { colors }
    }
}

impl LevelPalette {
    /// Defaults with `LEVEL -> #RRGGBB` overrides applied
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self> {
        let mut palette = Self::default();
        for (name, hex) in overrides {
            let level: LogLevel = name.parse()?;
            let rgb = parse_hex_color(hex)
                .ok_or_else(|| anyhow!("invalid color for {level}: {hex}"))?;
            palette.colors.insert(level, rgb);
        }
        Ok(palette)
    }

    pub fn color(&self, level: LogLevel) -> Option<(u8, u8, u8)> {
        self.colors.get(&level).copied()
    }

    /// One line in the producer's shape: `ESC[38;2;R;G;Bm [project] text ESC[0m`
    pub fn format_line(&self, project: &str, level: LogLevel, text: &str) -> String {
        let (r, g, b) = self.color(level).unwrap_or((0xff, 0xff, 0xff));
        format!("\u{1b}[38;2;{r};{g};{b}m [{project}] {text} \u{1b}[0m")
    }

    /// Level whose color the first colored run of the line carries
    pub fn classify(&self, line: &RenderedLine) -> Option<LogLevel> {
        let first = line.runs.iter().find(|run| run.style.foreground.is_some())?;
        let Some(Foreground::Rgb(r, g, b)) = first.style.foreground else {
            return None;
        };
        self.colors
            .iter()
            .find(|(_, rgb)| **rgb == (r, g, b))
            .map(|(level, _)| *level)
    }
}
