// File: ./src/payload.rs
//! Turning externally dropped content (plain text, note links) into item text.
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::OnceLock;

/// Scheme + host of note links we know how to resolve.
const NOTE_LINK_PREFIX: &str = "obsidian://open?";
const NOTE_EXTENSION: &str = ".md";

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z][a-zA-Z0-9+.\-]*://|www\.)\S*$").expect("static regex is valid")
    })
}

/// Decodes the note name out of an `obsidian://open?...&file=...` link.
/// Returns `None` for anything else.
pub fn note_name_from_link(line: &str) -> Option<String> {
    let query = line.trim().strip_prefix(NOTE_LINK_PREFIX)?;

    let mut file = None;
    let mut path = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("file", v)) => file = Some(v),
            Some(("path", v)) => path = Some(v),
            _ => {}
        }
    }
    let raw = file.or(path)?;
    let decoded = percent_decode_str(raw).decode_utf8_lossy();

    let base = decoded.rsplit(['/', '\\']).next().unwrap_or_default();
    let base = base.strip_suffix(NOTE_EXTENSION).unwrap_or(base);
    if base.is_empty() {
        return None;
    }
    Some(base.to_string())
}

pub fn is_cross_reference(text: &str) -> bool {
    text.starts_with("[[") && text.ends_with("]]") && text.len() >= 4
}

pub fn looks_like_url(text: &str) -> bool {
    url_regex().is_match(text)
}

/// Display text for one dropped line.
pub fn drop_text(line: &str) -> String {
    let text = note_name_from_link(line).unwrap_or_else(|| line.trim().to_string());
    if is_cross_reference(&text) || looks_like_url(&text) {
        text
    } else {
        format!("[[{}]]", text)
    }
}

/// One display text per non-blank payload line, in payload order.
pub fn drop_texts(payload: &str) -> Vec<String> {
    payload
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(drop_text)
        .collect()
}
