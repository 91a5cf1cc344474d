// Tests for the drag state machine: moves, drag-out deletion and cancellation.
use chrono::{DateTime, Duration, TimeZone, Utc};
use kanblock::gesture::{
    CardBounds, DragState, DropRegion, GestureController, GestureOutcome, ReleaseTarget,
    resolve_before,
};
use kanblock::model::{ItemId, Stage, parse, serialize};
use kanblock::store::ItemStore;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

fn ms(n: i64) -> Duration {
    Duration::milliseconds(n)
}

fn setup() -> (ItemStore, Vec<ItemId>, GestureController) {
    let store = ItemStore::from(parse("- [ ] a\n- [ ] b\n- [x] c\n- [x] d"));
    let ids = store.items().iter().map(|i| i.id.clone()).collect();
    (store, ids, GestureController::new(ms(1000)))
}

fn column(stage: Stage, ids: &[&ItemId]) -> DropRegion {
    DropRegion {
        stage,
        cards: ids
            .iter()
            .enumerate()
            .map(|(n, id)| CardBounds {
                id: (*id).clone(),
                top: n as f64 * 40.0,
                height: 40.0,
            })
            .collect(),
    }
}

#[test]
fn test_drag_out_past_delay_deletes() {
    let (mut store, ids, mut gestures) = setup();
    assert!(gestures.pick_up(ids[0].clone(), t0()));
    gestures.leave_regions(t0());
    assert!(!gestures.is_delete_armed(t0() + ms(999)));
    assert!(gestures.is_delete_armed(t0() + ms(1000)));

    let outcome = gestures.release(&mut store, ReleaseTarget::Outside, t0() + ms(1500));
    assert_eq!(
        outcome,
        GestureOutcome::Deleted {
            item: ids[0].clone()
        }
    );
    assert!(outcome.changed_sequence());
    assert!(!store.contains(&ids[0]));
    assert_eq!(gestures.state(), &DragState::Idle);
}

#[test]
fn test_release_outside_exactly_at_delay_deletes() {
    let (mut store, ids, mut gestures) = setup();
    gestures.pick_up(ids[1].clone(), t0());
    gestures.leave_regions(t0());
    let outcome = gestures.release(&mut store, ReleaseTarget::Outside, t0() + ms(1000));
    assert!(matches!(outcome, GestureOutcome::Deleted { .. }));
    assert_eq!(store.len(), 3);
}

#[test]
fn test_early_release_outside_cancels() {
    let (mut store, ids, mut gestures) = setup();
    gestures.pick_up(ids[0].clone(), t0());
    gestures.leave_regions(t0());

    let outcome = gestures.release(&mut store, ReleaseTarget::Outside, t0() + ms(500));
    assert_eq!(
        outcome,
        GestureOutcome::Cancelled {
            item: ids[0].clone()
        }
    );
    assert!(!outcome.changed_sequence());
    assert_eq!(serialize(store.items()), "- [ ] a\n- [ ] b\n- [x] c\n- [x] d");
    assert!(!gestures.is_dragging());
}

#[test]
fn test_reentering_resets_outside_timer() {
    let (mut store, ids, mut gestures) = setup();
    gestures.pick_up(ids[0].clone(), t0());
    gestures.leave_regions(t0());
    gestures.enter_region();
    assert!(matches!(gestures.state(), DragState::Dragging { .. }));

    gestures.leave_regions(t0() + ms(900));
    // A second leave while outside keeps the first exit time
    gestures.leave_regions(t0() + ms(1400));

    let outcome = gestures.release(&mut store, ReleaseTarget::Outside, t0() + ms(1500));
    assert!(matches!(outcome, GestureOutcome::Cancelled { .. }));
    assert_eq!(store.len(), 4);
}

#[test]
fn test_drop_between_cards_moves_before_next() {
    let (mut store, ids, mut gestures) = setup();
    let done = column(Stage::Done, &[&ids[2], &ids[3]]);

    gestures.pick_up(ids[0].clone(), t0());
    // Midpoints are 20 and 60; 50 is below c's and above d's
    let outcome = gestures.release(
        &mut store,
        ReleaseTarget::Region {
            region: &done,
            pointer_y: 50.0,
        },
        t0() + ms(200),
    );
    assert_eq!(
        outcome,
        GestureOutcome::Moved {
            item: ids[0].clone(),
            stage: Stage::Done,
            before: Some(ids[3].clone()),
        }
    );
    assert_eq!(serialize(store.items()), "- [ ] b\n- [x] c\n- [x] a\n- [x] d");
}

#[test]
fn test_drop_below_all_cards_appends() {
    let (mut store, ids, mut gestures) = setup();
    let todo = column(Stage::Todo, &[&ids[0], &ids[1]]);

    gestures.pick_up(ids[3].clone(), t0());
    gestures.release(
        &mut store,
        ReleaseTarget::Region {
            region: &todo,
            pointer_y: 500.0,
        },
        t0(),
    );
    assert_eq!(serialize(store.items()), "- [ ] a\n- [ ] b\n- [ ] d\n- [x] c");
}

#[test]
fn test_release_in_region_ignores_outside_timer() {
    let (mut store, ids, mut gestures) = setup();
    let todo = column(Stage::Todo, &[&ids[0], &ids[1]]);

    gestures.pick_up(ids[2].clone(), t0());
    gestures.leave_regions(t0());
    let outcome = gestures.release(
        &mut store,
        ReleaseTarget::Region {
            region: &todo,
            pointer_y: 0.0,
        },
        t0() + ms(5000),
    );
    assert!(matches!(outcome, GestureOutcome::Moved { .. }));
    assert_eq!(store.items()[0].id, ids[2]);
}

#[test]
fn test_resolve_before_skips_dragged_card() {
    let (_, ids, _) = setup();
    let col = column(Stage::Todo, &[&ids[0], &ids[1]]);
    assert_eq!(
        resolve_before(&col.cards, 10.0, Some(&ids[0])),
        Some(ids[1].clone())
    );
    assert_eq!(resolve_before(&col.cards, 10.0, None), Some(ids[0].clone()));
    assert_eq!(resolve_before(&col.cards, 80.0, None), None);
    assert_eq!(resolve_before(&[], 0.0, None), None);
}

#[test]
fn test_release_without_drag_is_ignored() {
    let (mut store, _, mut gestures) = setup();
    let outcome = gestures.release(&mut store, ReleaseTarget::Outside, t0());
    assert_eq!(outcome, GestureOutcome::Ignored);
    assert_eq!(store.len(), 4);
}

#[test]
fn test_second_pick_up_is_refused() {
    let (_, ids, mut gestures) = setup();
    assert!(gestures.pick_up(ids[0].clone(), t0()));
    assert!(!gestures.pick_up(ids[1].clone(), t0()));
    assert_eq!(gestures.state().item(), Some(&ids[0]));
}

#[test]
fn test_item_removed_mid_drag_cancels() {
    let (mut store, ids, mut gestures) = setup();
    let todo = column(Stage::Todo, &[&ids[1]]);
    gestures.pick_up(ids[0].clone(), t0());
    store.remove(&ids[0]);

    let outcome = gestures.release(
        &mut store,
        ReleaseTarget::Region {
            region: &todo,
            pointer_y: 0.0,
        },
        t0(),
    );
    assert!(matches!(outcome, GestureOutcome::Cancelled { .. }));
    assert_eq!(store.len(), 3);
}
