// File: src/model/parser.rs
//! Text -> items.
//!
//! A block is read line by line. Top-level checklist lines (`- [m] text` at column
//! zero) open a new item; anything else either sticks to the current item as a
//! continuation line or is reported back as an [`IgnoredLine`].
use crate::model::{IgnoredLine, Item};

/// Indentation of a top-level item. Continuation lines must exceed it to start
/// attaching to an item.
const TOP_LEVEL_INDENT: usize = 0;

/// A line that matched the checklist grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistLine<'a> {
    pub marker: char,
    pub text: &'a str,
}

/// Result of parsing one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBlock {
    pub items: Vec<Item>,
    pub ignored: Vec<IgnoredLine>,
}

impl ParsedBlock {
    pub fn has_ignored(&self) -> bool {
        !self.ignored.is_empty()
    }
}

/// Number of leading whitespace characters.
pub fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Recognizes `-`, optional spaces, `[`, one marker character, `]`, then text.
/// Only matches at column zero.
pub fn classify_line(line: &str) -> Option<ChecklistLine<'_>> {
    let rest = line.strip_prefix('-')?.trim_start();
    let rest = rest.strip_prefix('[')?;

    let mut chars = rest.chars();
    let marker = chars.next()?;
    let rest = chars.as_str().strip_prefix(']')?;

    Some(ChecklistLine {
        marker,
        text: rest.trim(),
    })
}

pub fn parse(source: &str) -> ParsedBlock {
    let mut block = ParsedBlock::default();

    for (idx, raw) in source.split('\n').enumerate() {
        // CRLF sources: the '\r' is not part of the content.
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(checklist) = classify_line(line) {
            block
                .items
                .push(Item::from_marker(checklist.marker, checklist.text));
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        match block.items.last_mut() {
            // Once an item has continuation lines, everything non-blank sticks to
            // it until the next top-level line, whatever its indentation.
            Some(current)
                if indent_of(line) > TOP_LEVEL_INDENT
                    || !current.continuation_lines.is_empty() =>
            {
                current.continuation_lines.push(line.to_string());
            }
            _ => block.ignored.push(IgnoredLine {
                line_number: idx + 1,
                content: line.to_string(),
            }),
        }
    }

    log::debug!(
        "Parsed block: {} item(s), {} ignored line(s)",
        block.items.len(),
        block.ignored.len()
    );
    block
}
