//! Text tiles - immutable blocks of lines and the operators that compose them.
//!
//! A [`Tile`] is the working value of the page renderers. Tiles are stacked
//! vertically (`|`), placed side by side (`+`), and produced from small
//! templates whose `@{name}` spans are filled from an explicit [`Context`].
//!
//! Placing a multi-line value inside a line of literal text keeps the
//! surrounding text aligned:
//!
//! ```
//! use tiledoc_core::tile::{Context, Template, Tile};
//!
//! let args = Tile::from_lines(["int s,", "int64_t deadline);"]);
//! let ctx = Context::new().with("args", args);
//! let out = Template::new("int brecv(@{args}").render(&ctx).unwrap();
//! assert_eq!(out.to_string(), "int brecv(int s,\n          int64_t deadline);");
//! ```

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, BitOr};
use std::sync::OnceLock;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

const OPEN: &str = "@{";
const CLOSE: char = '}';

static IDENT_REGEX: OnceLock<Regex> = OnceLock::new();

fn ident_regex() -> &'static Regex {
    IDENT_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unterminated interpolation on template line {line}")]
    Unterminated { line: usize },

    #[error("Invalid interpolation expression '{expr}' on template line {line}")]
    InvalidExpression { expr: String, line: usize },

    #[error("Undefined template variable: {0}")]
    Undefined(String),
}

/// An ordered, immutable sequence of text lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tile {
    lines: Vec<String>,
}

impl Tile {
    /// A tile with no lines at all.
    pub fn empty() -> Self {
        Self { lines: Vec::new() }
    }

    /// A tile holding a single empty line.
    pub fn blank() -> Self {
        Self {
            lines: vec![String::new()],
        }
    }

    /// Split `text` on newlines. An empty string yields one empty line.
    pub fn text(text: &str) -> Self {
        Self {
            lines: text
                .split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect(),
        }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Display width of the widest line, counted in grapheme clusters.
    pub fn width(&self) -> usize {
        self.lines.iter().map(|l| display_width(l)).max().unwrap_or(0)
    }

    /// Stack `below` under this tile.
    pub fn above(&self, below: &Tile) -> Tile {
        let mut lines = Vec::with_capacity(self.len() + below.len());
        lines.extend(self.lines.iter().cloned());
        lines.extend(below.lines.iter().cloned());
        Tile { lines }
    }

    /// Place `right` to the right of this tile.
    ///
    /// The shorter side is padded with empty lines, and every left line that
    /// receives right-hand text is first padded to the width of the widest
    /// left line. Rows whose right-hand line is empty are left unpadded
    /// rather than justified, so the result carries no trailing spaces;
    /// visible alignment is the same either way. A tile with no lines
    /// behaves like a single empty line.
    pub fn beside(&self, right: &Tile) -> Tile {
        let mut lines = self.lines.clone();
        if right.is_empty() {
            return Tile { lines };
        }
        if lines.len() < right.len() {
            lines.resize(right.len(), String::new());
        }
        let width = lines.iter().map(|l| display_width(l)).max().unwrap_or(0);
        for (line, text) in lines.iter_mut().zip(&right.lines) {
            if text.is_empty() {
                continue;
            }
            pad_to(line, width);
            line.push_str(text);
        }
        Tile { lines }
    }

    /// Strip trailing whitespace, drop blank edge lines and remove the
    /// common indentation of the remaining non-blank lines.
    ///
    /// `trim` is a fixed point: trimming a trimmed tile changes nothing.
    pub fn trim(&self) -> Tile {
        let stripped: Vec<&str> = self.lines.iter().map(|l| l.trim_end()).collect();
        let Some(first) = stripped.iter().position(|l| !l.is_empty()) else {
            return Tile::empty();
        };
        let last = stripped
            .iter()
            .rposition(|l| !l.is_empty())
            .unwrap_or(first);
        let body = &stripped[first..=last];

        let indent = body
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
            .min()
            .unwrap_or(0);

        Tile {
            lines: body
                .iter()
                .map(|l| skip_chars(l, indent).to_string())
                .collect(),
        }
    }
}

fn display_width(line: &str) -> usize {
    line.graphemes(true).count()
}

fn pad_to(line: &mut String, width: usize) {
    let current = display_width(line);
    if current < width {
        line.push_str(&" ".repeat(width - current));
    }
}

fn skip_chars(line: &str, count: usize) -> &str {
    match line.char_indices().nth(count) {
        Some((idx, _)) => &line[idx..],
        None => "",
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

impl From<&str> for Tile {
    fn from(text: &str) -> Self {
        Tile::text(text)
    }
}

impl From<String> for Tile {
    fn from(text: String) -> Self {
        Tile::text(&text)
    }
}

impl From<&String> for Tile {
    fn from(text: &String) -> Self {
        Tile::text(text)
    }
}

impl BitOr for Tile {
    type Output = Tile;

    fn bitor(mut self, below: Tile) -> Tile {
        self.lines.extend(below.lines);
        self
    }
}

impl BitOr<&Tile> for &Tile {
    type Output = Tile;

    fn bitor(self, below: &Tile) -> Tile {
        self.above(below)
    }
}

impl Add for Tile {
    type Output = Tile;

    fn add(self, right: Tile) -> Tile {
        self.beside(&right)
    }
}

impl Add<&Tile> for &Tile {
    type Output = Tile;

    fn add(self, right: &Tile) -> Tile {
        self.beside(right)
    }
}

/// Variables visible to a template.
#[derive(Debug, Clone, Default)]
pub struct Context {
    vars: BTreeMap<String, Tile>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Tile>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Tile>) {
        self.vars.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Tile> {
        self.vars.get(name)
    }

    /// A copy of this context with `other`'s variables layered on top.
    pub fn merged(&self, other: &Context) -> Context {
        let mut vars = self.vars.clone();
        vars.extend(other.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        Context { vars }
    }
}

/// A template string with `@{name}` interpolation spans.
#[derive(Debug, Clone, Copy)]
pub struct Template<'a> {
    source: &'a str,
}

impl<'a> Template<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Trim-format: interpolate, then [`Tile::trim`] the result.
    pub fn render(&self, ctx: &Context) -> Result<Tile, TemplateError> {
        Ok(self.expand(ctx)?.trim())
    }

    /// Raw-format: interpolate and keep every line, blank edges included.
    pub fn render_raw(&self, ctx: &Context) -> Result<Tile, TemplateError> {
        self.expand(ctx)
    }

    fn expand(&self, ctx: &Context) -> Result<Tile, TemplateError> {
        let mut out = Tile::empty();
        for (idx, line) in self.source.split('\n').enumerate() {
            let row = expand_line(line, idx + 1, ctx)?;
            out = out | row;
        }
        Ok(out)
    }
}

fn expand_line(line: &str, number: usize, ctx: &Context) -> Result<Tile, TemplateError> {
    let mut row = Tile::empty();
    let mut cursor = 0;

    while let Some(offset) = line[cursor..].find(OPEN) {
        let start = cursor + offset;
        let literal = &line[cursor..start];
        if !literal.is_empty() {
            row = row.beside(&Tile::text(literal));
        }

        let expr_start = start + OPEN.len();
        let close = line[expr_start..]
            .find(CLOSE)
            .ok_or(TemplateError::Unterminated { line: number })?;
        let expr = line[expr_start..expr_start + close].trim();
        if !ident_regex().is_match(expr) {
            return Err(TemplateError::InvalidExpression {
                expr: expr.to_string(),
                line: number,
            });
        }
        let value = ctx
            .get(expr)
            .ok_or_else(|| TemplateError::Undefined(expr.to_string()))?;
        row = row.beside(&value.trim());
        cursor = expr_start + close + CLOSE.len_utf8();
    }

    let tail = &line[cursor..];
    if !tail.is_empty() || row.is_empty() {
        row = row.beside(&Tile::text(tail));
    }
    if row.is_empty() {
        row = Tile::blank();
    }
    Ok(row)
}

/// How [`vjoin`] attaches separators to rendered items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// The separator continues the last line of the preceding item.
    Inline,
    /// The separator lines follow the preceding item on their own.
    Block,
}

/// Render `template` once per item and lay the results out horizontally,
/// with `sep` after every item but the final one, which gets `last`.
pub fn join(
    template: &Template<'_>,
    base: &Context,
    items: &[Context],
    sep: &Tile,
    last: &Tile,
) -> Result<Tile, TemplateError> {
    let mut out = Tile::empty();
    for (idx, item) in items.iter().enumerate() {
        let rendered = template.render(&base.merged(item))?;
        out = out.beside(&rendered);
        out = out.beside(if idx + 1 < items.len() { sep } else { last });
    }
    Ok(out)
}

/// Like [`join`], but items are stacked vertically.
pub fn vjoin(
    template: &Template<'_>,
    base: &Context,
    items: &[Context],
    sep: &Tile,
    last: &Tile,
    mode: JoinMode,
) -> Result<Tile, TemplateError> {
    let mut out = Tile::empty();
    for (idx, item) in items.iter().enumerate() {
        let mut block = template.render(&base.merged(item))?.into_lines();
        let tail = if idx + 1 < items.len() { sep } else { last };
        match mode {
            JoinMode::Inline => match (block.last_mut(), tail.lines().split_first()) {
                (Some(line), Some((head, rest))) => {
                    line.push_str(head);
                    block.extend(rest.iter().cloned());
                }
                _ => block.extend(tail.lines().iter().cloned()),
            },
            JoinMode::Block => block.extend(tail.lines().iter().cloned()),
        }
        out = out | Tile::from_lines(block);
    }
    Ok(out)
}

/// Stack the non-empty `parts` with one blank line between neighbours.
pub fn paragraphs<I>(parts: I) -> Tile
where
    I: IntoIterator<Item = Tile>,
{
    let mut out = Tile::empty();
    for part in parts.into_iter().filter(|p| !p.is_empty()) {
        if !out.is_empty() {
            out = out | Tile::blank();
        }
        out = out | part;
    }
    out
}
