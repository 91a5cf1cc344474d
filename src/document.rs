// File: ./src/document.rs
//! Where board text comes from and goes back to.
//!
//! A board is one fenced block (```` ```todo ````) inside a Markdown note. The
//! controller only sees the block's content through [`DocumentHost`]; the two
//! hosts here keep the note in memory ([`NoteDocument`]) or on disk
//! ([`FileDocument`]).
use crate::storage::LocalStorage;
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

const FENCE: &str = "```";

/// Line range of a block's content inside the note, fences excluded.
/// `start_line..end_line`, 0-based, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionBounds {
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    pub bounds: SectionBounds,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced,
    /// No block matched the previous text; nothing was written.
    NotFound,
}

pub trait DocumentHost {
    /// Current raw content of the board's block.
    fn get_text(&self) -> Result<String>;

    /// Swaps the block whose content is `previous` for `new_text`.
    fn replace_text(&mut self, previous: &str, new_text: &str) -> Result<ReplaceOutcome>;

    /// Where the block sits, when the host knows.
    fn section_bounds(&self) -> Option<SectionBounds> {
        None
    }
}

fn is_closing_fence(line: &str) -> bool {
    let line = line.trim();
    line.len() >= FENCE.len() && line.chars().all(|c| c == '`')
}

/// All ```` ```<lang> ```` blocks of a note, in document order.
/// Fences of other languages are skipped as a whole.
pub fn find_blocks(document: &str, lang: &str) -> Vec<FencedBlock> {
    enum Fence {
        Outside,
        Ours(usize),
        Other,
    }

    let lines: Vec<&str> = document.split('\n').collect();
    let opener = format!("{}{}", FENCE, lang);
    let mut state = Fence::Outside;
    let mut blocks = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_end();
        state = match state {
            Fence::Outside if trimmed == opener => Fence::Ours(idx + 1),
            Fence::Outside if trimmed.starts_with(FENCE) => Fence::Other,
            Fence::Ours(start) if is_closing_fence(trimmed) => {
                blocks.push(FencedBlock {
                    bounds: SectionBounds {
                        start_line: start,
                        end_line: idx,
                    },
                    content: lines[start..idx].join("\n"),
                });
                Fence::Outside
            }
            Fence::Other if is_closing_fence(trimmed) => Fence::Outside,
            s => s,
        };
    }
    blocks
}

/// Rewrites one block of `document`.
///
/// `bounds` is used when the lines it covers still hold `previous`; otherwise
/// the first ```` ```<lang> ```` block whose trimmed content equals the trimmed
/// `previous` is replaced. Returns `None` when neither locates the block.
pub fn replace_block(
    document: &str,
    lang: &str,
    bounds: Option<SectionBounds>,
    previous: &str,
    new_text: &str,
) -> Option<String> {
    if let Some(b) = bounds
        && let Some(out) = replace_in_bounds(document, b, previous, new_text)
    {
        return Some(out);
    }
    replace_by_search(document, lang, previous, new_text)
}

fn replace_in_bounds(
    document: &str,
    bounds: SectionBounds,
    previous: &str,
    new_text: &str,
) -> Option<String> {
    let mut lines: Vec<&str> = document.split('\n').collect();
    if bounds.start_line > bounds.end_line || bounds.end_line > lines.len() {
        return None;
    }
    if lines[bounds.start_line..bounds.end_line].join("\n").trim() != previous.trim() {
        log::debug!("Section bounds are stale, falling back to search");
        return None;
    }

    let replacement: Vec<&str> = if new_text.is_empty() {
        Vec::new()
    } else {
        new_text.split('\n').collect()
    };
    lines.splice(bounds.start_line..bounds.end_line, replacement);
    Some(lines.join("\n"))
}

fn replace_by_search(document: &str, lang: &str, previous: &str, new_text: &str) -> Option<String> {
    // The language tag is user configuration; never let it act as a pattern.
    let pattern = format!(r"{}{}\n([\s\S]*?){}", FENCE, regex::escape(lang), FENCE);
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            log::error!("Invalid block search pattern {:?}: {}", pattern, e);
            return None;
        }
    };

    for caps in re.captures_iter(document) {
        let Some(content) = caps.get(1) else {
            continue;
        };
        if content.as_str().trim() != previous.trim() {
            continue;
        }

        let old = content.as_str();
        let mut replacement = new_text.to_string();
        // Keep the closing fence on its own line.
        if !replacement.is_empty() && (old.ends_with('\n') || old.is_empty()) {
            replacement.push('\n');
        }

        let mut out = String::with_capacity(document.len() + replacement.len());
        out.push_str(&document[..content.start()]);
        out.push_str(&replacement);
        out.push_str(&document[content.end()..]);
        return Some(out);
    }
    None
}

// --- In-memory note ---

/// A whole Markdown note held in memory, exposing its `index`-th board block.
#[derive(Debug, Clone)]
pub struct NoteDocument {
    content: String,
    lang: String,
    index: usize,
}

impl NoteDocument {
    pub fn new(content: impl Into<String>, lang: impl Into<String>, index: usize) -> Self {
        Self {
            content: content.into(),
            lang: lang.into(),
            index,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Simulates an edit made outside the board.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    fn block(&self) -> Option<FencedBlock> {
        find_blocks(&self.content, &self.lang).into_iter().nth(self.index)
    }
}

impl DocumentHost for NoteDocument {
    fn get_text(&self) -> Result<String> {
        self.block().map(|b| b.content).ok_or_else(|| {
            anyhow::anyhow!("No ```{} block #{} in note", self.lang, self.index)
        })
    }

    fn replace_text(&mut self, previous: &str, new_text: &str) -> Result<ReplaceOutcome> {
        let bounds = self.section_bounds();
        match replace_block(&self.content, &self.lang, bounds, previous, new_text) {
            Some(updated) => {
                self.content = updated;
                Ok(ReplaceOutcome::Replaced)
            }
            None => Ok(ReplaceOutcome::NotFound),
        }
    }

    fn section_bounds(&self) -> Option<SectionBounds> {
        self.block().map(|b| b.bounds)
    }
}

// --- Note on disk ---

/// A Markdown file on disk. Every access re-reads the file; writes are locked
/// and atomic. The lock file lives in `lock_dir`, never beside the note.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
    lang: String,
    index: usize,
    lock_dir: PathBuf,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>, lang: impl Into<String>, index: usize) -> Self {
        Self {
            path: path.into(),
            lang: lang.into(),
            index,
            lock_dir: std::env::temp_dir().join("kanblock-locks"),
        }
    }

    /// Keeps lock files under `dir` (the CLI passes the cache dir).
    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        LocalStorage::lock_path_in(&self.lock_dir, &self.path)
    }

    fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read note {:?}", self.path))
    }

    fn block_in(&self, content: &str) -> Option<FencedBlock> {
        find_blocks(content, &self.lang).into_iter().nth(self.index)
    }
}

impl DocumentHost for FileDocument {
    fn get_text(&self) -> Result<String> {
        let content = LocalStorage::with_lock_file(&self.lock_path(), || self.read())?;
        self.block_in(&content).map(|b| b.content).ok_or_else(|| {
            anyhow::anyhow!(
                "No ```{} block #{} in {:?}",
                self.lang,
                self.index,
                self.path
            )
        })
    }

    fn replace_text(&mut self, previous: &str, new_text: &str) -> Result<ReplaceOutcome> {
        LocalStorage::with_lock_file(&self.lock_path(), || {
            let content = self.read()?;
            let bounds = self.block_in(&content).map(|b| b.bounds);
            match replace_block(&content, &self.lang, bounds, previous, new_text) {
                Some(updated) => {
                    LocalStorage::atomic_write(&self.path, updated)?;
                    Ok(ReplaceOutcome::Replaced)
                }
                None => Ok(ReplaceOutcome::NotFound),
            }
        })
    }

    fn section_bounds(&self) -> Option<SectionBounds> {
        let content = self.read().ok()?;
        self.block_in(&content).map(|b| b.bounds)
    }
}
