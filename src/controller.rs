// File: src/controller.rs
//! Board controller: the owner of one board's item sequence.
//!
//! A controller is built per document load. It parses the block text, holds the
//! [`ItemStore`] exclusively, routes commands and drag gestures to it, and writes
//! the re-serialized text back through the [`DocumentHost`] after every change.
//! When the text changes underneath it, [`BoardController::reload`] throws the
//! in-memory state away and starts over from the new text.
use crate::config::Config;
use crate::document::{DocumentHost, ReplaceOutcome};
use crate::gesture::{GestureController, GestureOutcome, ReleaseTarget};
use crate::model::{IgnoredLine, Item, ItemId, Stage, parse, serialize};
use crate::render::{ItemRenderer, RenderedCard, RenderedColumn};
use crate::store::ItemStore;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use strum::IntoEnumIterator;

/// Result of the last write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Written,
    /// The host could not locate the block; nothing was written.
    NotFound,
    /// The host failed. The in-memory board is still authoritative.
    Failed(String),
}

/// One column of the grouped view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<'a> {
    pub stage: Stage,
    pub title: String,
    pub items: Vec<&'a Item>,
}

/// Joins the non-blank lines of `text`, trimmed, with single spaces.
fn single_line(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct BoardController<H: DocumentHost> {
    host: H,
    config: Config,
    store: ItemStore,
    ignored: Vec<IgnoredLine>,
    /// Text the store was last parsed from or written as.
    source: String,
    gestures: GestureController,
    /// Items created from the "+" button whose text was never saved.
    drafts: HashSet<ItemId>,
    warnings: Vec<String>,
    last_sync: Option<SyncStatus>,
}

impl<H: DocumentHost> BoardController<H> {
    /// Reads the block from `host` and builds the board.
    pub fn load(host: H, config: Config) -> Result<Self> {
        let text = host.get_text()?;
        let mut board = Self {
            host,
            gestures: GestureController::new(config.delete_delay()),
            config,
            store: ItemStore::new(),
            ignored: Vec::new(),
            source: String::new(),
            drafts: HashSet::new(),
            warnings: Vec::new(),
            last_sync: None,
        };
        board.reload(&text);
        Ok(board)
    }

    /// Full reparse. Any drag in progress and any unsaved draft are dropped.
    pub fn reload(&mut self, text: &str) {
        let block = parse(text);
        if block.has_ignored() {
            let warning = format!(
                "{} line(s) are not checklist items and may be lost when the board is edited",
                block.ignored.len()
            );
            log::warn!("{}", warning);
            for line in &block.ignored {
                log::debug!("Ignored line {}: {:?}", line.line_number, line.content);
            }
            if !self.warnings.contains(&warning) {
                self.warnings.push(warning);
            }
        }

        self.ignored = block.ignored.clone();
        self.store = ItemStore::from(block);
        self.source = text.to_string();
        self.gestures.reset();
        self.drafts.clear();
    }

    /// Re-reads the host and reparses if the block changed outside the board.
    /// Returns true when a reparse happened.
    pub fn refresh(&mut self) -> Result<bool> {
        let text = self.host.get_text()?;
        if text == self.source {
            return Ok(false);
        }
        log::debug!("Block changed outside the board, reparsing");
        self.reload(&text);
        Ok(true)
    }

    // --- Accessors ---

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.store.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn ignored_lines(&self) -> &[IgnoredLine] {
        &self.ignored
    }

    /// Advisory warnings collected during this session.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn last_sync(&self) -> Option<&SyncStatus> {
        self.last_sync.as_ref()
    }

    pub fn last_sync_error(&self) -> Option<&str> {
        match &self.last_sync {
            Some(SyncStatus::Failed(msg)) => Some(msg),
            Some(SyncStatus::NotFound) => Some("Could not find matching block to update"),
            _ => None,
        }
    }

    pub fn gestures(&self) -> &GestureController {
        &self.gestures
    }

    /// Canonical text of the board as it stands, drafts excluded.
    pub fn text(&self) -> String {
        serialize(
            self.store
                .items()
                .iter()
                .filter(|i| !self.drafts.contains(&i.id)),
        )
    }

    pub fn columns(&self) -> Vec<Column<'_>> {
        Stage::iter()
            .map(|stage| Column {
                stage,
                title: self.config.column_names.title(stage).to_string(),
                items: self.store.stage_items(stage).collect(),
            })
            .collect()
    }

    pub fn render<R: ItemRenderer>(&self, renderer: &mut R) -> Vec<RenderedColumn<R::Surface>> {
        self.columns()
            .into_iter()
            .map(|col| RenderedColumn {
                stage: col.stage,
                title: col.title,
                cards: col
                    .items
                    .into_iter()
                    .map(|item| {
                        let mut surface = R::Surface::default();
                        renderer.render(&item.text, &mut surface);
                        RenderedCard {
                            id: item.id.clone(),
                            surface,
                            extra_lines: item.continuation_lines.len(),
                            done: item.stage.is_done(),
                        }
                    })
                    .collect(),
            })
            .collect()
    }

    // --- Commands ---

    /// Adds an empty draft at the end of `stage`. Nothing is written until
    /// [`Self::save_text`] gives it text.
    pub fn add_item(&mut self, stage: Stage) -> ItemId {
        let id = self.store.create_and_insert(stage);
        self.drafts.insert(id.clone());
        id
    }

    /// Sets an item's text. Line breaks collapse to single spaces, since an
    /// item is one line of the block. Empty text deletes the item.
    /// Returns false if the id is unknown.
    pub fn save_text(&mut self, id: &ItemId, text: &str) -> bool {
        let text = single_line(text);
        let was_draft = self.drafts.remove(id);

        if text.is_empty() {
            if self.store.remove(id).is_none() {
                return false;
            }
            // A draft never reached the text; nothing to write.
            if !was_draft {
                self.commit();
            }
            return true;
        }

        let Some(item) = self.store.get_mut(id) else {
            return false;
        };
        item.text = text;
        self.commit();
        true
    }

    /// Abandons an edit. Unsaved drafts disappear; existing items are untouched.
    pub fn cancel_edit(&mut self, id: &ItemId) {
        if self.drafts.remove(id) {
            self.store.remove(id);
        }
    }

    pub fn move_item(&mut self, id: &ItemId, stage: Stage, before: Option<&ItemId>) -> bool {
        if !self.store.move_item(id, stage, before) {
            return false;
        }
        self.commit();
        true
    }

    pub fn delete_item(&mut self, id: &ItemId) -> bool {
        if self.store.remove(id).is_none() {
            return false;
        }
        let was_draft = self.drafts.remove(id);
        if !was_draft {
            self.commit();
        }
        true
    }

    // --- Gestures ---

    /// Starts dragging a card. Unknown ids are ignored.
    pub fn pick_up(&mut self, id: &ItemId, now: DateTime<Utc>) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        self.gestures.pick_up(id.clone(), now)
    }

    pub fn pointer_left_regions(&mut self, now: DateTime<Utc>) {
        self.gestures.leave_regions(now);
    }

    pub fn pointer_entered_region(&mut self) {
        self.gestures.enter_region();
    }

    pub fn release(&mut self, target: ReleaseTarget<'_>, now: DateTime<Utc>) -> GestureOutcome {
        let outcome = self.gestures.release(&mut self.store, target, now);
        if outcome.changed_sequence() {
            if let GestureOutcome::Deleted { item } = &outcome {
                self.drafts.remove(item);
            }
            self.commit();
        }
        outcome
    }

    /// Creates items from an external payload and writes once for the batch.
    pub fn drop_external(
        &mut self,
        payload: &str,
        stage: Stage,
        before: Option<&ItemId>,
    ) -> Vec<ItemId> {
        let ids = self
            .gestures
            .drop_external(&mut self.store, payload, stage, before);
        if !ids.is_empty() {
            self.commit();
        }
        ids
    }

    // --- Write-back ---

    /// Serializes and hands the text to the host. Failures are recorded, never
    /// propagated: the board stays usable.
    fn commit(&mut self) -> SyncStatus {
        let new_text = self.text();
        if !self.ignored.is_empty() {
            log::warn!(
                "Writing board; {} unrecognized line(s) are not carried over",
                self.ignored.len()
            );
        }

        let status = match self.host.replace_text(&self.source, &new_text) {
            Ok(ReplaceOutcome::Replaced) => {
                self.source = new_text;
                // They are gone from the text now; the session warning stays.
                self.ignored.clear();
                SyncStatus::Written
            }
            Ok(ReplaceOutcome::NotFound) => {
                log::warn!("Could not find matching block to update");
                SyncStatus::NotFound
            }
            Err(e) => {
                log::error!("Failed to write board: {:#}", e);
                SyncStatus::Failed(e.to_string())
            }
        };
        self.last_sync = Some(status.clone());
        status
    }
}
