// File: src/store.rs
//! The single ordered sequence of items behind a board.
//!
//! The same `Vec` is both the text order (what the serializer writes) and the
//! source of the three columns (filter by stage, keep relative order).
use crate::model::{Item, ItemId, ParsedBlock, Stage};
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemStore {
    items: Vec<Item>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|i| &i.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == id)
    }

    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| &i.id == id)
    }

    /// Items of one stage, in sequence order.
    pub fn stage_items(&self, stage: Stage) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |i| i.stage == stage)
    }

    /// Grouped view: one list per stage, fixed stage order.
    pub fn columns(&self) -> Vec<(Stage, Vec<&Item>)> {
        Stage::iter()
            .map(|stage| (stage, self.stage_items(stage).collect()))
            .collect()
    }

    // --- Core ordering ---

    /// Places `item` in `stage`.
    ///
    /// Replaces an existing item with the same id (so this doubles as a move).
    /// Position, in order of preference:
    /// 1. right before `before`, if that id is present (whatever its stage);
    /// 2. right after the last item already in `stage`;
    /// 3. at the stage boundary (see [`Self::boundary_index`]).
    pub fn insert(&mut self, mut item: Item, stage: Stage, before: Option<&ItemId>) {
        item.stage = stage;

        // Dropped onto itself: keep the slot, take the new stage.
        if before == Some(&item.id)
            && let Some(idx) = self.position(&item.id)
        {
            self.items[idx] = item;
            return;
        }

        if let Some(idx) = self.position(&item.id) {
            self.items.remove(idx);
        }

        if let Some(before_id) = before {
            if let Some(idx) = self.position(before_id) {
                self.items.insert(idx, item);
                return;
            }
            log::debug!(
                "Drop target {} no longer present, appending to {}",
                before_id,
                stage
            );
        }

        let idx = match self.items.iter().rposition(|i| i.stage == stage) {
            Some(last) => last + 1,
            None => self.boundary_index(stage),
        };
        self.items.insert(idx, item);
    }

    /// Moves a present item. Returns false if the id is unknown.
    pub fn move_item(&mut self, id: &ItemId, stage: Stage, before: Option<&ItemId>) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        if before == Some(id) {
            self.items[idx].stage = stage;
            return true;
        }
        let item = self.items.remove(idx);
        self.insert(item, stage, before);
        true
    }

    /// Removes by identity. No-op when absent.
    pub fn remove(&mut self, id: &ItemId) -> Option<Item> {
        let idx = self.position(id)?;
        Some(self.items.remove(idx))
    }

    /// New empty item at the boundary of `stage`. Returns its id.
    pub fn create_and_insert(&mut self, stage: Stage) -> ItemId {
        let item = Item::new(String::new(), stage);
        let id = item.id.clone();
        let idx = self.boundary_index(stage);
        self.items.insert(idx, item);
        id
    }

    /// Index just after the last item whose stage comes before or equals
    /// `stage` in column order. Zero if there is none.
    pub fn boundary_index(&self, stage: Stage) -> usize {
        let target = stage.rank();
        self.items
            .iter()
            .rposition(|i| i.stage.rank() <= target)
            .map(|idx| idx + 1)
            .unwrap_or(0)
    }
}

impl From<ParsedBlock> for ItemStore {
    fn from(block: ParsedBlock) -> Self {
        Self::from_items(block.items)
    }
}
