// File: ./src/suggest.rs
//! Autocomplete while editing item text: `#tag` and `[[note` triggers.
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn tag_trigger() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#([^\s#\[\]]*)$").expect("static regex is valid"))
}

fn link_trigger() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\]]*)$").expect("static regex is valid"))
}

fn tag_in_text() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)(#[\w/\-]+)").expect("static regex is valid"))
}

/// A note (or other resource) that can be linked with `[[...]]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResourceRef {
    pub path: String,
    pub basename: String,
}

/// Whatever knows about notes and tags. Only autocomplete uses it.
pub trait ResourceLookup {
    /// Candidates matching a partial link target.
    fn resolve_resource_refs(&self, query: &str) -> Vec<ResourceRef>;
    fn list_all_tags(&self) -> BTreeSet<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    Tag(String),
    Resource(ResourceRef),
}

impl Suggestion {
    pub fn label(&self) -> &str {
        match self {
            Suggestion::Tag(t) => t,
            Suggestion::Resource(r) => &r.basename,
        }
    }
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Suggestions for the text left of the cursor.
pub fn suggestions(text_before_cursor: &str, lookup: &dyn ResourceLookup) -> Vec<Suggestion> {
    if let Some(caps) = tag_trigger().captures(text_before_cursor) {
        let query = caps.get(1).map_or("", |m| m.as_str()).to_lowercase();
        return lookup
            .list_all_tags()
            .into_iter()
            .filter(|tag| tag.to_lowercase().contains(&query))
            .map(|tag| {
                if tag.starts_with('#') {
                    tag
                } else {
                    format!("#{}", tag)
                }
            })
            .map(Suggestion::Tag)
            .collect();
    }

    if let Some(caps) = link_trigger().captures(text_before_cursor) {
        let query = caps.get(1).map_or("", |m| m.as_str());
        return lookup
            .resolve_resource_refs(query)
            .into_iter()
            .map(Suggestion::Resource)
            .collect();
    }

    Vec::new()
}

/// Replaces the trigger before `cursor` with the chosen suggestion.
/// Returns the new text and the cursor position right after the insertion.
pub fn apply_suggestion(text: &str, cursor: usize, suggestion: &Suggestion) -> (String, usize) {
    let cursor = floor_char_boundary(text, cursor);
    let (before, after) = text.split_at(cursor);

    let (re, insert) = match suggestion {
        Suggestion::Tag(tag) => (tag_trigger(), tag.clone()),
        Suggestion::Resource(r) => (link_trigger(), format!("[[{}]]", r.basename)),
    };

    let new_before = match re.find(before) {
        Some(m) => format!("{}{}", &before[..m.start()], insert),
        None => format!("{}{}", before, insert),
    };
    let new_cursor = new_before.len();
    (format!("{}{}", new_before, after), new_cursor)
}

// --- Directory-backed lookup ---

/// Notes and tags found under a directory of Markdown files.
#[derive(Debug, Clone, Default)]
pub struct VaultIndex {
    notes: Vec<ResourceRef>,
    tags: BTreeSet<String>,
}

impl VaultIndex {
    pub fn scan(root: &Path) -> anyhow::Result<Self> {
        let mut index = Self::default();
        let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    // Hidden folders (.git, .obsidian) hold no notes.
                    if !path
                        .file_name()
                        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
                    {
                        pending.push(path);
                    }
                    continue;
                }
                if path.extension().is_none_or(|e| e != "md") {
                    continue;
                }
                index.add_note(root, &path);
            }
        }
        index.notes.sort();
        log::debug!(
            "Indexed {} note(s) and {} tag(s) under {:?}",
            index.notes.len(),
            index.tags.len(),
            root
        );
        Ok(index)
    }

    fn add_note(&mut self, root: &Path, path: &Path) {
        let rel = path.strip_prefix(root).unwrap_or(path);
        let basename = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        self.notes.push(ResourceRef {
            path: rel.to_string_lossy().replace('\\', "/"),
            basename,
        });

        match fs::read_to_string(path) {
            Ok(content) => {
                for caps in tag_in_text().captures_iter(&content) {
                    if let Some(m) = caps.get(1) {
                        self.tags.insert(m.as_str().to_string());
                    }
                }
            }
            Err(e) => log::warn!("Skipping tags of {:?}: {}", path, e),
        }
    }
}

impl ResourceLookup for VaultIndex {
    fn resolve_resource_refs(&self, query: &str) -> Vec<ResourceRef> {
        let query = query.to_lowercase();
        self.notes
            .iter()
            .filter(|n| {
                n.basename.to_lowercase().contains(&query) || n.path.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    fn list_all_tags(&self) -> BTreeSet<String> {
        self.tags.clone()
    }
}
