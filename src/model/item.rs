// File: ./src/model/item.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};
use uuid::Uuid;

/// Opaque identity of an item. Generated once, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workflow bucket. Declaration order is the fixed column order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Todo,
    InProgress,
    Done,
}

impl Stage {
    /// Position in the fixed column order (todo, in-progress, done).
    pub fn rank(self) -> usize {
        Stage::iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn canonical_marker(self) -> char {
        match self {
            Stage::Done => 'x',
            Stage::InProgress => '/',
            Stage::Todo => ' ',
        }
    }

    pub fn is_done(self) -> bool {
        self == Stage::Done
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Todo => write!(f, "todo"),
            Stage::InProgress => write!(f, "in-progress"),
            Stage::Done => write!(f, "done"),
        }
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" | "to-do" => Ok(Stage::Todo),
            "in-progress" | "inprogress" | "doing" => Ok(Stage::InProgress),
            "done" => Ok(Stage::Done),
            other => Err(format!(
                "Unknown stage '{}' (expected todo, in-progress or done)",
                other
            )),
        }
    }
}

/// Maps whatever sits in the checkbox to a stage.
/// Lossy on purpose: `?`, `!`, space and friends all land in `Todo`.
pub fn stage_for_marker(marker: char) -> Stage {
    match marker {
        'x' => Stage::Done,
        '/' => Stage::InProgress,
        _ => Stage::Todo,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub text: String,
    pub stage: Stage,
    /// Checkbox character as it appeared in the source. Kept across moves so an
    /// item that ends up back in its original stage is written unchanged.
    pub original_marker: char,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub continuation_lines: Vec<String>,
}

impl Item {
    /// A fresh item with the canonical marker of `stage`.
    pub fn new(text: impl Into<String>, stage: Stage) -> Self {
        Self {
            id: ItemId::new(),
            text: text.into(),
            stage,
            original_marker: stage.canonical_marker(),
            continuation_lines: Vec::new(),
        }
    }

    /// Item as read from source: stage is derived from the marker.
    pub fn from_marker(marker: char, text: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            text: text.into(),
            stage: stage_for_marker(marker),
            original_marker: marker,
            continuation_lines: Vec::new(),
        }
    }

    /// The marker written back to text.
    pub fn effective_marker(&self) -> char {
        if stage_for_marker(self.original_marker) == self.stage {
            self.original_marker
        } else {
            self.stage.canonical_marker()
        }
    }
}

/// A source line that fit neither the checklist grammar nor a continuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredLine {
    /// 1-based line number inside the block.
    pub line_number: usize,
    pub content: String,
}
