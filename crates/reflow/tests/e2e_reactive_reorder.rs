//! Cross-crate scenario: a controller mirroring its arrangement into a
//! store, with watchers and computed values tracking the drops.

use reflow::prelude::*;
use reflow_reorder::RecordingUi;
use reflow_sync::MockSyncClient;

use std::cell::RefCell;
use std::rc::Rc;

fn drop_to(id: &str, to: ContainerKey, to_index: usize) -> DropEvent {
    DropEvent {
        id: id.into(),
        to,
        to_index,
    }
}

#[tokio::test]
async fn watchers_see_committed_drops() {
    let store = Store::default();
    let seen: Rc<RefCell<Vec<serde_json::Value>>> = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = Rc::clone(&seen);
    let _sub = store.watch("board", move |value, _| {
        if let Some(value) = value {
            seen_clone.borrow_mut().push(value.clone());
        }
    });

    let mut controller = Controller::new(
        ContainerConfig::grouped("/sort", "position", "status"),
        Layout::new()
            .with_container(ContainerKey::group("todo"), ["1", "2"])
            .with_container(ContainerKey::group("done"), Vec::<String>::new()),
        MockSyncClient::accepting(),
        RecordingUi::new(),
    )
    .with_state_mirror(store.clone(), "board");

    let outcome = controller
        .handle_drop(drop_to("2", ContainerKey::group("done"), 0))
        .await;
    assert_eq!(outcome, Outcome::Committed);

    // Initial mirror plus the committed drop.
    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1]["group:todo"], serde_json::json!(["1"]));
    assert_eq!(seen[1]["group:done"], serde_json::json!(["2"]));
}

#[tokio::test]
async fn rolled_back_drop_restores_the_mirror() {
    let store = Store::default();
    let mut controller = Controller::new(
        ContainerConfig::flat("/sort", "position"),
        Layout::new().with_container(ContainerKey::Root, ["a", "b", "c"]),
        MockSyncClient::scripted([Err(SyncError::Status(503))]),
        RecordingUi::new(),
    )
    .with_state_mirror(store.clone(), "rows");

    let before = store.get("rows").unwrap();
    let outcome = controller.handle_drop(drop_to("c", ContainerKey::Root, 0)).await;
    assert_eq!(outcome, Outcome::RolledBack(SyncError::Status(503)));

    // The mirror write after rollback equals the original snapshot, so the
    // equality short-circuit keeps watchers quiet about the non-change.
    assert_eq!(store.get("rows").unwrap(), before);
}

#[tokio::test]
async fn computed_counts_follow_the_board() {
    let store = Store::default();
    let mut controller = Controller::new(
        ContainerConfig::grouped("/sort", "position", "status"),
        Layout::new()
            .with_container(ContainerKey::group("todo"), ["1", "2", "3"])
            .with_container(ContainerKey::group("done"), Vec::<String>::new()),
        MockSyncClient::accepting(),
        RecordingUi::new(),
    )
    .with_state_mirror(store.clone(), "board");

    let done_count = Computed::new(&store, ["board"], |store| {
        store
            .get("board.group:done")
            .and_then(|value| value.as_array().map(Vec::len))
            .unwrap_or(0)
    });
    assert_eq!(done_count.get(), 0);

    controller
        .handle_drop(drop_to("3", ContainerKey::group("done"), 0))
        .await;
    assert!(done_count.is_dirty());
    assert_eq!(done_count.get(), 1);
}
