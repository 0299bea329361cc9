/*
[INPUT]:  One raw log line, possibly carrying ANSI CSI escape sequences
[OUTPUT]: Styled runs, escaped HTML markup, sanitized ANSI or plain text
[POS]:    Rendering layer - SGR interpreter shared by every sink
[UPDATE]: When supported SGR codes or the markup shape change
*/

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

/// Any CSI sequence. Only a final `m` without intermediate bytes is SGR;
/// every other CSI sequence is dropped from the output.
static CSI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[([0-?]*)([ -/]*)([@-~])").expect("CSI pattern compiles")
});

/// Named terminal colors (standard and bright)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl PaletteColor {
    pub const ALL: [PaletteColor; 16] = [
        PaletteColor::Black,
        PaletteColor::Red,
        PaletteColor::Green,
        PaletteColor::Yellow,
        PaletteColor::Blue,
        PaletteColor::Magenta,
        PaletteColor::Cyan,
        PaletteColor::White,
        PaletteColor::BrightBlack,
        PaletteColor::BrightRed,
        PaletteColor::BrightGreen,
        PaletteColor::BrightYellow,
        PaletteColor::BrightBlue,
        PaletteColor::BrightMagenta,
        PaletteColor::BrightCyan,
        PaletteColor::BrightWhite,
    ];

    /// Palette slot 0..=15; `None` outside the 16 named colors
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_bright(self) -> bool {
        self.index() >= 8
    }

    /// Class token used in rendered markup
    pub fn css_class(self) -> &'static str {
        match self {
            PaletteColor::Black => "ansi-black",
            PaletteColor::Red => "ansi-red",
            PaletteColor::Green => "ansi-green",
            PaletteColor::Yellow => "ansi-yellow",
            PaletteColor::Blue => "ansi-blue",
            PaletteColor::Magenta => "ansi-magenta",
            PaletteColor::Cyan => "ansi-cyan",
            PaletteColor::White => "ansi-white",
            PaletteColor::BrightBlack => "ansi-bright-black",
            PaletteColor::BrightRed => "ansi-bright-red",
            PaletteColor::BrightGreen => "ansi-bright-green",
            PaletteColor::BrightYellow => "ansi-bright-yellow",
            PaletteColor::BrightBlue => "ansi-bright-blue",
            PaletteColor::BrightMagenta => "ansi-bright-magenta",
            PaletteColor::BrightCyan => "ansi-bright-cyan",
            PaletteColor::BrightWhite => "ansi-bright-white",
        }
    }

    /// SGR foreground code (30-37 or 90-97)
    pub fn sgr_code(self) -> u8 {
        if self.is_bright() {
            90 + self.index() - 8
        } else {
            30 + self.index()
        }
    }

    /// xterm default RGB for the slot, used by stylesheets
    pub fn rgb(self) -> (u8, u8, u8) {
        ansi256_to_rgb(self.index())
    }
}

/// Foreground source; palette and truecolor are mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Foreground {
    Palette(PaletteColor),
    Rgb(u8, u8, u8),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Attributes {
    pub bold: bool,
    pub dim: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        !(self.bold || self.dim || self.italic || self.underline)
    }

    fn css_classes(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.bold, "ansi-bold"),
            (self.dim, "ansi-dim"),
            (self.italic, "ansi-italic"),
            (self.underline, "ansi-underline"),
        ]
        .into_iter()
        .filter_map(|(on, class)| on.then_some(class))
    }

    fn sgr_codes(&self) -> impl Iterator<Item = u8> {
        [(self.bold, 1), (self.dim, 2), (self.italic, 3), (self.underline, 4)]
            .into_iter()
            .filter_map(|(on, code)| on.then_some(code))
    }
}

/// Active rendering attributes at one point of a line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StyleState {
    pub foreground: Option<Foreground>,
    pub attributes: Attributes,
}

impl StyleState {
    pub fn is_default(&self) -> bool {
        self.foreground.is_none() && self.attributes.is_empty()
    }

    /// Apply the parameter field of one SGR sequence (`ESC [ <params> m`).
    ///
    /// Empty tokens are dropped; an empty list resets. Tokens that are not
    /// recognised codes leave the state untouched.
    pub fn apply_sgr(&mut self, params: &str) {
        let tokens: Vec<&str> = params.split(';').filter(|token| !token.is_empty()).collect();
        if tokens.is_empty() {
            *self = Self::default();
            return;
        }

        let mut index = 0;
        while index < tokens.len() {
            index += self.apply_code(&tokens[index..]);
        }
    }

    /// Returns how many tokens the code consumed (always at least one).
    fn apply_code(&mut self, tokens: &[&str]) -> usize {
        let Ok(code) = tokens[0].parse::<u16>() else {
            return 1;
        };

        match code {
            0 => *self = Self::default(),
            1 => self.attributes.bold = true,
            2 => self.attributes.dim = true,
            3 => self.attributes.italic = true,
            4 => self.attributes.underline = true,
            22 => {
                self.attributes.bold = false;
                self.attributes.dim = false;
            }
            23 => self.attributes.italic = false,
            24 => self.attributes.underline = false,
            30..=37 => self.set_palette((code - 30) as u8),
            90..=97 => self.set_palette((code - 90 + 8) as u8),
            38 => return 1 + self.apply_extended_foreground(&tokens[1..]),
            39 => self.foreground = None,
            _ => {}
        }
        1
    }

    fn set_palette(&mut self, index: u8) {
        if let Some(color) = PaletteColor::from_index(index) {
            self.foreground = Some(Foreground::Palette(color));
        }
    }

    /// `38;2;R;G;B` or `38;5;N`. Malformed components are skipped together
    /// with their selector so they are never read as codes of their own.
    fn apply_extended_foreground(&mut self, rest: &[&str]) -> usize {
        match rest.first().copied() {
            Some("2") => {
                if let Some([r, g, b]) = rest.get(1..4) {
                    if let (Ok(r), Ok(g), Ok(b)) =
                        (r.parse::<u8>(), g.parse::<u8>(), b.parse::<u8>())
                    {
                        self.foreground = Some(Foreground::Rgb(r, g, b));
                    }
                }
                rest.len().min(4)
            }
            Some("5") => {
                if let Some(index) = rest.get(1).and_then(|token| token.parse::<u8>().ok()) {
                    self.foreground = Some(indexed_foreground(index));
                }
                rest.len().min(2)
            }
            _ => 0,
        }
    }

    fn write_sgr(&self, out: &mut String) {
        let mut codes: Vec<String> = self.attributes.sgr_codes().map(|code| code.to_string()).collect();
        match self.foreground {
            Some(Foreground::Palette(color)) => codes.push(color.sgr_code().to_string()),
            Some(Foreground::Rgb(r, g, b)) => codes.push(format!("38;2;{r};{g};{b}")),
            None => {}
        }
        let _ = write!(out, "\u{1b}[{}m", codes.join(";"));
    }
}

/// Maximal slice of a line sharing one style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub style: StyleState,
}

/// A parsed line, ready for any sink
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedLine {
    pub runs: Vec<StyledRun>,
}

impl RenderedLine {
    pub fn parse(line: &str) -> Self {
        Self {
            runs: parse_line(line),
        }
    }

    /// Escaped markup with one `<span>` per non-default run
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            write_run_html(&mut out, run);
        }
        out
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Re-encoded SGR output carrying only the codes this module understands
    pub fn to_ansi(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            if run.style.is_default() {
                out.push_str(&run.text);
                continue;
            }
            run.style.write_sgr(&mut out);
            out.push_str(&run.text);
            out.push_str("\u{1b}[0m");
        }
        out
    }
}

/// Split a line into styled runs. Style starts fresh for every line.
pub fn parse_line(line: &str) -> Vec<StyledRun> {
    let mut runs = Vec::new();
    let mut style = StyleState::default();
    let mut cursor = 0;

    for captures in CSI_PATTERN.captures_iter(line) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        push_run(&mut runs, &line[cursor..whole.start()], style);
        cursor = whole.end();

        if &captures[3] == "m" && captures[2].is_empty() {
            style.apply_sgr(&captures[1]);
        }
    }
    push_run(&mut runs, &line[cursor..], style);

    runs
}

/// Parse and render a line to HTML in one step
pub fn render_line(line: &str) -> String {
    RenderedLine::parse(line).to_html()
}

/// Drop every escape sequence and control byte, keeping the text
pub fn strip_line(line: &str) -> String {
    RenderedLine::parse(line).plain_text()
}

fn push_run(runs: &mut Vec<StyledRun>, text: &str, style: StyleState) {
    let text: String = text.chars().filter(|ch| !ch.is_control() || *ch == '\t').collect();
    if text.is_empty() {
        return;
    }
    if let Some(last) = runs.last_mut() {
        if last.style == style {
            last.text.push_str(&text);
            return;
        }
    }
    runs.push(StyledRun { text, style });
}

fn write_run_html(out: &mut String, run: &StyledRun) {
    let text = escape_html(&run.text);
    if run.style.is_default() {
        out.push_str(&text);
        return;
    }

    let mut classes: Vec<&'static str> = Vec::new();
    if let Some(Foreground::Palette(color)) = run.style.foreground {
        classes.push(color.css_class());
    }
    classes.extend(run.style.attributes.css_classes());

    out.push_str("<span");
    if !classes.is_empty() {
        let _ = write!(out, " class=\"{}\"", classes.join(" "));
    }
    if let Some(Foreground::Rgb(r, g, b)) = run.style.foreground {
        let _ = write!(out, " style=\"color:rgb({r},{g},{b})\"");
    }
    out.push('>');
    out.push_str(&text);
    out.push_str("</span>");
}

fn indexed_foreground(index: u8) -> Foreground {
    match PaletteColor::from_index(index) {
        Some(color) => Foreground::Palette(color),
        None => {
            let (r, g, b) = ansi256_to_rgb(index);
            Foreground::Rgb(r, g, b)
        }
    }
}

/// xterm 256-color table
pub fn ansi256_to_rgb(index: u8) -> (u8, u8, u8) {
    match index {
        0 => (0x00, 0x00, 0x00),
        1 => (0x80, 0x00, 0x00),
        2 => (0x00, 0x80, 0x00),
        3 => (0x80, 0x80, 0x00),
        4 => (0x00, 0x00, 0x80),
        5 => (0x80, 0x00, 0x80),
        6 => (0x00, 0x80, 0x80),
        7 => (0xc0, 0xc0, 0xc0),
        8 => (0x80, 0x80, 0x80),
        9 => (0xff, 0x00, 0x00),
        10 => (0x00, 0xff, 0x00),
        11 => (0xff, 0xff, 0x00),
        12 => (0x00, 0x00, 0xff),
        13 => (0xff, 0x00, 0xff),
        14 => (0x00, 0xff, 0xff),
        15 => (0xff, 0xff, 0xff),
        16..=231 => {
            let cube = index - 16;
            let levels = [0, 95, 135, 175, 215, 255];
            (
                levels[usize::from(cube / 36)],
                levels[usize::from((cube % 36) / 6)],
                levels[usize::from(cube % 6)],
            )
        }
        232..=255 => {
            let level = 8 + (index - 232) * 10;
            (level, level, level)
        }
    }
}

/// Escape text for HTML; control bytes other than tab are dropped
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\t' => out.push('\t'),
            ch if ch.is_control() => {}
            _ => out.push(ch),
        }
    }
    out
}
