// File: ./src/model/serializer.rs
use crate::model::Item;

/// One item and its continuation lines, newline-joined.
pub fn item_to_text(item: &Item) -> String {
    let main = format!("- [{}] {}", item.effective_marker(), item.text);
    if item.continuation_lines.is_empty() {
        return main;
    }
    let mut out = main;
    for line in &item.continuation_lines {
        out.push('\n');
        out.push_str(line);
    }
    out
}

/// Canonical text for a sequence. No blank separators, no trailing newline.
/// Ignored lines are not written back.
pub fn serialize<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = &'a Item>,
{
    items
        .into_iter()
        .map(item_to_text)
        .collect::<Vec<_>>()
        .join("\n")
}
