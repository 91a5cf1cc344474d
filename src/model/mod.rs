// File: ./src/model/mod.rs
pub mod item;
pub mod parser;
pub mod serializer;

pub use item::{IgnoredLine, Item, ItemId, Stage, stage_for_marker};
pub use parser::{ParsedBlock, classify_line, indent_of, parse};
pub use serializer::{item_to_text, serialize};
