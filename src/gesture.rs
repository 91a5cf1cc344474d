// File: ./src/gesture.rs
//! Drag and drop state machine on top of [`ItemStore`].
//!
//! The host feeds pointer events in (pick up, leave/enter drop regions,
//! release) and the controller turns them into store mutations:
//!
//! ```text
//!   Idle --pick_up--> Dragging --leave_regions--> DraggingOutside
//!                        ^                              |
//!                        +--------enter_region----------+
//!   Dragging / DraggingOutside --release--> Idle
//! ```
//!
//! Releasing over a region moves the item; releasing outside deletes it only
//! when the pointer stayed outside for at least the configured delay.
use crate::model::{Item, ItemId, Stage};
use crate::payload;
use crate::store::ItemStore;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        item: ItemId,
        picked_up_at: DateTime<Utc>,
    },
    DraggingOutside {
        item: ItemId,
        picked_up_at: DateTime<Utc>,
        left_at: DateTime<Utc>,
    },
}

impl DragState {
    pub fn item(&self) -> Option<&ItemId> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { item, .. } | DragState::DraggingOutside { item, .. } => {
                Some(item)
            }
        }
    }
}

/// Vertical extent of a rendered card, in the host's coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CardBounds {
    pub id: ItemId,
    pub top: f64,
    pub height: f64,
}

impl CardBounds {
    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// A column the pointer can drop into, with its cards top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct DropRegion {
    pub stage: Stage,
    pub cards: Vec<CardBounds>,
}

#[derive(Debug, Clone, Copy)]
pub enum ReleaseTarget<'a> {
    Region {
        region: &'a DropRegion,
        pointer_y: f64,
    },
    Outside,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Item moved; the sequence changed.
    Moved {
        item: ItemId,
        stage: Stage,
        before: Option<ItemId>,
    },
    /// Dragged out long enough; item removed.
    Deleted { item: ItemId },
    /// Released outside too early, or the item vanished mid-drag.
    Cancelled { item: ItemId },
    /// Release without a drag in progress.
    Ignored,
}

impl GestureOutcome {
    pub fn changed_sequence(&self) -> bool {
        matches!(
            self,
            GestureOutcome::Moved { .. } | GestureOutcome::Deleted { .. }
        )
    }
}

/// First card (top to bottom) whose midpoint lies below the pointer.
/// The dragged card itself is skipped. `None` means "append".
pub fn resolve_before(
    cards: &[CardBounds],
    pointer_y: f64,
    dragged: Option<&ItemId>,
) -> Option<ItemId> {
    cards
        .iter()
        .filter(|c| Some(&c.id) != dragged)
        .find(|c| pointer_y < c.midpoint())
        .map(|c| c.id.clone())
}

#[derive(Debug, Clone)]
pub struct GestureController {
    state: DragState,
    delete_delay: Duration,
}

impl GestureController {
    pub fn new(delete_delay: Duration) -> Self {
        Self {
            state: DragState::Idle,
            delete_delay,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn delete_delay(&self) -> Duration {
        self.delete_delay
    }

    pub fn set_delete_delay(&mut self, delay: Duration) {
        self.delete_delay = delay;
    }

    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Drops any drag in progress without touching the store.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }

    /// Idle -> Dragging. Returns false when a drag is already running.
    pub fn pick_up(&mut self, item: ItemId, now: DateTime<Utc>) -> bool {
        if self.is_dragging() {
            log::debug!("Ignoring pick up of {}: drag already in progress", item);
            return false;
        }
        self.state = DragState::Dragging {
            item,
            picked_up_at: now,
        };
        true
    }

    /// Dragging -> DraggingOutside. Repeated calls keep the first exit time.
    pub fn leave_regions(&mut self, now: DateTime<Utc>) {
        if let DragState::Dragging { item, picked_up_at } = &self.state {
            self.state = DragState::DraggingOutside {
                item: item.clone(),
                picked_up_at: *picked_up_at,
                left_at: now,
            };
        }
    }

    /// DraggingOutside -> Dragging; the outside timer is cleared.
    pub fn enter_region(&mut self) {
        if let DragState::DraggingOutside {
            item, picked_up_at, ..
        } = &self.state
        {
            self.state = DragState::Dragging {
                item: item.clone(),
                picked_up_at: *picked_up_at,
            };
        }
    }

    /// Whether releasing right now, outside, would delete the item.
    pub fn is_delete_armed(&self, now: DateTime<Utc>) -> bool {
        match &self.state {
            DragState::DraggingOutside { left_at, .. } => now - *left_at >= self.delete_delay,
            _ => false,
        }
    }

    /// Ends the drag and applies its effect to `store`. Always returns to Idle.
    pub fn release(
        &mut self,
        store: &mut ItemStore,
        target: ReleaseTarget<'_>,
        now: DateTime<Utc>,
    ) -> GestureOutcome {
        let armed = self.is_delete_armed(now);
        let Some(item) = std::mem::take(&mut self.state).item().cloned() else {
            return GestureOutcome::Ignored;
        };

        match target {
            ReleaseTarget::Region { region, pointer_y } => {
                let before = resolve_before(&region.cards, pointer_y, Some(&item));
                if store.move_item(&item, region.stage, before.as_ref()) {
                    log::debug!("Moved {} to {} (before {:?})", item, region.stage, before);
                    GestureOutcome::Moved {
                        item,
                        stage: region.stage,
                        before,
                    }
                } else {
                    log::warn!("Dragged item {} is no longer on the board", item);
                    GestureOutcome::Cancelled { item }
                }
            }
            ReleaseTarget::Outside if armed => match store.remove(&item) {
                Some(_) => {
                    log::info!("Deleted {} by dragging it off the board", item);
                    GestureOutcome::Deleted { item }
                }
                None => GestureOutcome::Cancelled { item },
            },
            ReleaseTarget::Outside => {
                log::debug!("Drag of {} released outside before the delete delay", item);
                GestureOutcome::Cancelled { item }
            }
        }
    }

    /// Inserts one new item per non-blank payload line, in payload order, at
    /// `stage` (before `before` when given). Returns the new ids.
    ///
    /// The caller commits once for the whole batch.
    pub fn drop_external(
        &mut self,
        store: &mut ItemStore,
        payload_text: &str,
        stage: Stage,
        before: Option<&ItemId>,
    ) -> Vec<ItemId> {
        let mut ids = Vec::new();
        for text in payload::drop_texts(payload_text) {
            let item = Item::new(text, stage);
            ids.push(item.id.clone());
            store.insert(item, stage, before);
        }
        log::debug!("External drop created {} item(s) in {}", ids.len(), stage);
        ids
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new(Duration::milliseconds(crate::config::DEFAULT_DELETE_DELAY_MS as i64))
    }
}
