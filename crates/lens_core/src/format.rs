//! crates/lens_core/src/format.rs
//!
//! Display helpers: byte sizes, counts, timestamps, and the block structure of
//! assistant answers.

use chrono::{DateTime, Local, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// `0` → `0 Bytes`, `1536` → `1.5 KB`, `5242880` → `5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut unit = 0;
    let mut divisor = 1u64;
    while unit < SIZE_UNITS.len() - 1 && bytes >= divisor * 1024 {
        divisor *= 1024;
        unit += 1;
    }
    let value = format!("{:.2}", bytes as f64 / divisor as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", value, SIZE_UNITS[unit])
}

/// `1234567` → `1,234,567`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

const DATE_FORMAT: &str = "%b %-d, %Y, %-I:%M %p";

/// Formats a backend timestamp for display in local time, e.g. `Jan 5, 2024, 3:07 PM`.
///
/// Timestamps without an offset are already local wall-clock time. Anything
/// unparsable is returned unchanged.
pub fn format_date(timestamp: &str) -> String {
    let timestamp = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return dt.with_timezone(&Local).format(DATE_FORMAT).to_string();
    }
    match NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => naive.format(DATE_FORMAT).to_string(),
        Err(_) => timestamp.to_string(),
    }
}

//=========================================================================================
// Answer Rendering
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Strong(String),
}

/// One visual line of a paragraph.
pub type Line = Vec<Span>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Bullet or numbered items, each kept verbatim.
    List(Vec<String>),
    /// Lines separated by single newlines.
    Paragraph(Vec<Line>),
}

fn numbered_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.").expect("numbered item pattern is valid"))
}

fn strong_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("strong span pattern is valid"))
}

const BULLET: char = '•';

/// Splits assistant text into display blocks on blank lines.
pub fn render_answer(text: &str) -> Vec<Block> {
    text.split("\n\n").map(render_block).collect()
}

fn render_block(block: &str) -> Block {
    let trimmed = block.trim();
    if trimmed.starts_with(BULLET) {
        return Block::List(list_items(block, |line| line.starts_with(BULLET)));
    }
    if numbered_item().is_match(trimmed) {
        return Block::List(list_items(block, |line| numbered_item().is_match(line)));
    }
    Block::Paragraph(block.split('\n').map(render_line).collect())
}

fn list_items(block: &str, is_item: impl Fn(&str) -> bool) -> Vec<String> {
    block
        .split('\n')
        .map(str::trim)
        .filter(|line| is_item(line))
        .map(str::to_string)
        .collect()
}

fn render_line(line: &str) -> Line {
    let mut spans = Vec::new();
    let mut last = 0;
    for caps in strong_span().captures_iter(line) {
        let whole = caps.get(0).expect("group 0 is always present");
        if whole.start() > last {
            spans.push(Span::Text(line[last..whole.start()].to_string()));
        }
        spans.push(Span::Strong(caps[1].to_string()));
        last = whole.end();
    }
    if last < line.len() || spans.is_empty() {
        spans.push(Span::Text(line[last..].to_string()));
    }
    spans
}
