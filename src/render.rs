// File: ./src/render.rs
//! Hooks for displaying item text. The board never looks at what a renderer
//! produces; it only decides which text goes to which surface.
use crate::model::{ItemId, Stage};

pub trait ItemRenderer {
    type Surface: Default;

    fn render(&mut self, text: &str, surface: &mut Self::Surface);
}

/// Writes the text as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl ItemRenderer for PlainRenderer {
    type Surface = String;

    fn render(&mut self, text: &str, surface: &mut String) {
        surface.push_str(text);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCard<S> {
    pub id: ItemId,
    pub surface: S,
    /// Number of attached continuation lines, shown as a `+N` badge.
    pub extra_lines: usize,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedColumn<S> {
    pub stage: Stage,
    pub title: String,
    pub cards: Vec<RenderedCard<S>>,
}
