// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for scan (driver state machine, auto-removal, review)

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::fixtures::{displayed, person, record, store_with};
use dupcards_core::card::field::{DISPLAY_NAME, FIRST_NAME, PRIMARY_EMAIL};
use dupcards_core::{
    CallbackHandler, EventHandler, FieldMap, MatchReason, MemoryStore, Preferences, Record,
    ScanDriver, ScanError, ScanEvent, ScanOptions, ScanState, Side, StoreError, ValueSet,
};

const BOOK: &str = "main";

fn auto_remove(preserve_first: bool) -> Preferences {
    Preferences {
        auto_remove_duplicates: true,
        preserve_first_on_auto_remove: preserve_first,
        ..Preferences::default()
    }
}

/// Collects every event the driver emits.
fn recorder() -> (Arc<Mutex<Vec<ScanEvent>>>, Arc<dyn EventHandler>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let handler = CallbackHandler::new(move |event| sink.lock().unwrap().push(event));
    (events, Arc::new(handler))
}

fn jane_pair() -> Vec<Record> {
    vec![
        displayed("1", "Jane Doe"),
        person("2", "Jane", "Doe", "jane@example.com"),
    ]
}

fn ids(store: &MemoryStore, book: &str) -> Vec<String> {
    store
        .records(book)
        .unwrap()
        .iter()
        .map(|r| r.id().to_string())
        .collect()
}

// ============================================================
// Scanning
// ============================================================

#[tokio::test]
async fn test_duplicates_are_queued_for_review() {
    let store = store_with(
        BOOK,
        vec![
            displayed("1", "Jane Doe"),
            displayed("2", "John Roe"),
            person("3", "Jane", "Doe", ""),
        ],
    );
    let mut driver = ScanDriver::new(&store, Preferences::default());
    assert_eq!(driver.state(), ScanState::Idle);

    let state = driver.run(BOOK, None).await.unwrap();

    assert_eq!(state, ScanState::AwaitingReview);
    assert_eq!(driver.queued().len(), 1);
    let pair = driver.current().unwrap();
    assert_eq!((pair.first, pair.second), (0, 2));
    assert_eq!(pair.reason, MatchReason::Names);
    assert_eq!(driver.position(), Some(0));

    let (a, b) = driver.current_pair().unwrap();
    assert_eq!((a.id(), b.id()), ("1", "3"));
}

#[tokio::test]
async fn test_no_duplicates_ends_scan() {
    let store = store_with(BOOK, vec![displayed("1", "Jane Doe"), displayed("2", "John Roe")]);
    let mut driver = ScanDriver::new(&store, Preferences::default());
    assert_eq!(driver.run(BOOK, None).await.unwrap(), ScanState::Done);
    assert!(driver.current().is_none());
    assert_eq!(driver.summary().before, 2);
    assert_eq!(driver.summary().after, 2);
}

#[tokio::test]
async fn test_same_book_twice_is_scanned_once() {
    let store = store_with(BOOK, vec![displayed("1", "Jane Doe"), displayed("2", "Jane Doe")]);
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, Some(BOOK)).await.unwrap();
    assert_eq!(driver.queued().len(), 1);
    assert_eq!(driver.summary().before, 2);
}

#[tokio::test]
async fn test_two_books_only_pair_across() {
    let store = store_with("a", vec![displayed("a1", "Jane Doe"), displayed("a2", "Jane Doe")]);
    store.insert("b", displayed("b1", "John Roe")).unwrap();

    let mut driver = ScanDriver::new(&store, Preferences::default());
    assert_eq!(driver.run("a", Some("b")).await.unwrap(), ScanState::Done);

    store.insert("b", displayed("b2", "Jane Doe")).unwrap();
    driver.run("a", Some("b")).await.unwrap();
    let pairs: Vec<(usize, usize)> = driver
        .queued()
        .iter()
        .map(|pair| (pair.first, pair.second))
        .collect();
    assert_eq!(pairs, vec![(0, 1), (1, 1)]);
    assert_eq!(driver.summary().before, 4);
}

#[tokio::test]
async fn test_malformed_record_is_skipped() {
    let emails: ValueSet = ["a@x.com", "b@x.com"].into_iter().collect();
    let store = store_with(
        BOOK,
        vec![
            Record::new("bad", "").with_field(PRIMARY_EMAIL, emails),
            displayed("1", "Jane Doe"),
            displayed("2", "Jane Doe"),
        ],
    );
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();
    assert_eq!(driver.queued().len(), 1);
    assert_eq!(driver.queued()[0].first, 1);
    assert_eq!(driver.queued()[0].second, 2);
}

#[tokio::test]
async fn test_missing_book_is_reported() {
    let store = MemoryStore::new();
    let mut driver = ScanDriver::new(&store, Preferences::default());
    let result = driver.run("nowhere", None).await;
    assert!(matches!(
        result,
        Err(ScanError::StoreUnavailable(StoreError::NotFound(_)))
    ));
    assert_eq!(driver.state(), ScanState::Done);
}

#[tokio::test]
async fn test_stop_takes_effect_at_yield() {
    let store = store_with(
        BOOK,
        vec![displayed("1", "Jane Doe"), displayed("2", "Jane Doe"), displayed("3", "Jane Doe")],
    );
    let mut driver = ScanDriver::new(&store, Preferences::default())
        .with_options(ScanOptions::default().with_time_slice(Duration::ZERO));
    let stop = driver.stop_handle();
    driver.add_handler(Arc::new(CallbackHandler::new(move |event| {
        if let ScanEvent::Progress { .. } = event {
            stop.stop();
        }
    })));

    assert_eq!(driver.run(BOOK, None).await.unwrap(), ScanState::Done);
    assert!(driver.queued().is_empty());
    assert_eq!(ids(&store, BOOK).len(), 3);
}

#[tokio::test]
async fn test_events_follow_the_scan() {
    let store = store_with(BOOK, jane_pair());
    let (events, handler) = recorder();
    let mut driver = ScanDriver::new(&store, Preferences::default()).with_handler(handler);
    driver.run(BOOK, None).await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(
        events.first(),
        Some(&ScanEvent::StateChanged {
            state: ScanState::Scanning
        })
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, ScanEvent::DuplicateFound { pair } if pair.second == 1)));
    assert!(events
        .iter()
        .any(|e| *e == ScanEvent::Progress { checked: 1, total: 1 }));
    assert_eq!(
        events.last(),
        Some(&ScanEvent::StateChanged {
            state: ScanState::AwaitingReview
        })
    );
}

// ============================================================
// Automatic removal
// ============================================================

#[tokio::test]
async fn test_less_complete_record_is_removed() {
    let store = store_with(
        BOOK,
        vec![
            displayed("1", "Jane Doe"),
            record("2", &[(DISPLAY_NAME, "Jane Doe"), ("Company", "Acme")]),
        ],
    );
    let (events, handler) = recorder();
    let mut driver = ScanDriver::new(&store, auto_remove(false)).with_handler(handler);

    assert_eq!(driver.run(BOOK, None).await.unwrap(), ScanState::Done);
    assert_eq!(ids(&store, BOOK), vec!["2"]);
    assert_eq!(driver.summary().removed_automatically, 1);
    assert_eq!(driver.summary().after, 1);
    assert!(events.lock().unwrap().contains(&ScanEvent::AutoRemoved {
        side: Side::First,
        record_id: "1".into()
    }));
}

#[tokio::test]
async fn test_preserve_first_queues_instead() {
    let store = store_with(
        BOOK,
        vec![
            displayed("1", "Jane Doe"),
            record("2", &[(DISPLAY_NAME, "Jane Doe"), ("Company", "Acme")]),
        ],
    );
    let mut driver = ScanDriver::new(&store, auto_remove(true));
    assert_eq!(driver.run(BOOK, None).await.unwrap(), ScanState::AwaitingReview);
    assert_eq!(ids(&store, BOOK).len(), 2);
}

#[tokio::test]
async fn test_preserve_first_still_removes_second() {
    let store = store_with(
        BOOK,
        vec![
            record("1", &[(DISPLAY_NAME, "Jane Doe"), ("Company", "Acme")]),
            displayed("2", "Jane Doe"),
        ],
    );
    let mut driver = ScanDriver::new(&store, auto_remove(true));
    assert_eq!(driver.run(BOOK, None).await.unwrap(), ScanState::Done);
    assert_eq!(ids(&store, BOOK), vec!["1"]);
}

#[tokio::test]
async fn test_incomparable_pair_is_queued() {
    let store = store_with(
        BOOK,
        vec![
            record("1", &[(DISPLAY_NAME, "Jane Doe"), ("Company", "Acme")]),
            record("2", &[(DISPLAY_NAME, "Jane Doe"), ("Company", "Globex")]),
        ],
    );
    let mut driver = ScanDriver::new(&store, auto_remove(false));
    assert_eq!(driver.run(BOOK, None).await.unwrap(), ScanState::AwaitingReview);
    assert_eq!(driver.summary().removed_automatically, 0);
}

#[tokio::test]
async fn test_failed_auto_removal_is_queued() {
    let store = store_with(
        BOOK,
        vec![
            displayed("1", "Jane Doe"),
            record("2", &[(DISPLAY_NAME, "Jane Doe"), ("Company", "Acme")]),
        ],
    );
    store.fail_deletes_of("1").unwrap();
    let mut driver = ScanDriver::new(&store, auto_remove(false));
    assert_eq!(driver.run(BOOK, None).await.unwrap(), ScanState::AwaitingReview);
    assert_eq!(ids(&store, BOOK).len(), 2);
}

#[tokio::test]
async fn test_removed_record_is_not_paired_again() {
    let store = store_with(
        BOOK,
        vec![
            displayed("1", "Jane Doe"),
            record("2", &[(DISPLAY_NAME, "Jane Doe"), ("Company", "Acme")]),
            record("3", &[(DISPLAY_NAME, "Jane Doe"), ("Company", "Globex")]),
        ],
    );
    let mut driver = ScanDriver::new(&store, auto_remove(false));
    driver.run(BOOK, None).await.unwrap();

    // Record 1 is removed by the first pair, so its pair with record 3 is never checked
    assert_eq!(ids(&store, BOOK), vec!["2", "3"]);
    let pairs: Vec<(usize, usize)> = driver
        .queued()
        .iter()
        .map(|pair| (pair.first, pair.second))
        .collect();
    assert_eq!(pairs, vec![(1, 2)]);
}

// ============================================================
// Review
// ============================================================

#[tokio::test]
async fn test_apply_merges_and_deletes() {
    let store = store_with(BOOK, jane_pair());
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();

    let preview = driver.preview_merge(Side::First).unwrap();
    assert_eq!(preview.get(PRIMARY_EMAIL), Some("jane@example.com"));

    assert_eq!(driver.apply(Side::First).await.unwrap(), ScanState::Done);
    assert_eq!(ids(&store, BOOK), vec!["1"]);
    let kept = store.record("1").unwrap().unwrap();
    assert_eq!(kept.property(PRIMARY_EMAIL), "jane@example.com");
    assert_eq!(kept.property(FIRST_NAME), "Jane");
    assert_eq!(kept.property(DISPLAY_NAME), "Jane Doe");

    let summary = driver.summary();
    assert_eq!(summary.removed_manually, 1);
    assert_eq!(summary.changed, 1);
    assert_eq!(summary.before, 2);
    assert_eq!(summary.after, 1);
}

#[tokio::test]
async fn test_apply_explicit_fields_to_second() {
    let store = store_with(BOOK, jane_pair());
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();

    let fields = FieldMap::from([
        (DISPLAY_NAME.to_string(), "Jane Q. Doe".to_string()),
        ("__Names".to_string(), "ignored".to_string()),
    ]);
    driver.apply_fields(Side::Second, fields).await.unwrap();

    assert_eq!(ids(&store, BOOK), vec!["2"]);
    let kept = store.record("2").unwrap().unwrap();
    assert_eq!(kept.property(DISPLAY_NAME), "Jane Q. Doe");
    assert!(kept.get("__Names").is_none());
}

#[tokio::test]
async fn test_apply_without_changes_only_deletes() {
    let store = store_with(BOOK, vec![displayed("1", "Jane Doe"), displayed("2", "Jane Doe")]);
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();
    driver.apply(Side::Second).await.unwrap();
    assert_eq!(ids(&store, BOOK), vec!["2"]);
    assert_eq!(driver.summary().changed, 0);
    assert_eq!(driver.summary().removed_manually, 1);
}

#[tokio::test]
async fn test_failed_update_keeps_pair() {
    let store = store_with(BOOK, jane_pair());
    store.fail_updates_of("1").unwrap();
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();

    let result = driver.apply(Side::First).await;
    assert!(matches!(
        result,
        Err(ScanError::Apply(StoreError::UpdateFailed { .. }))
    ));
    assert_eq!(driver.state(), ScanState::AwaitingReview);
    assert!(driver.current().is_some());
    assert_eq!(ids(&store, BOOK).len(), 2);

    store.clear_failures().unwrap();
    assert_eq!(driver.apply(Side::First).await.unwrap(), ScanState::Done);
}

#[tokio::test]
async fn test_failed_delete_counts_change_once_on_retry() {
    let store = store_with(BOOK, jane_pair());
    store.fail_deletes_of("2").unwrap();
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();

    let result = driver.apply(Side::First).await;
    assert!(matches!(
        result,
        Err(ScanError::Apply(StoreError::DeleteFailed { .. }))
    ));
    assert_eq!(driver.state(), ScanState::AwaitingReview);
    assert_eq!(driver.summary().changed, 0);
    assert_eq!(driver.summary().removed_manually, 0);

    store.clear_failures().unwrap();
    assert_eq!(driver.apply(Side::First).await.unwrap(), ScanState::Done);
    let summary = driver.summary();
    assert_eq!(summary.changed, 1);
    assert_eq!(summary.removed_manually, 1);
    assert_eq!(ids(&store, BOOK), vec!["1"]);
}

#[tokio::test]
async fn test_pairs_with_deleted_records_are_skipped() {
    let store = store_with(
        BOOK,
        vec![displayed("1", "Jane Doe"), displayed("2", "Jane Doe"), displayed("3", "Jane Doe")],
    );
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();
    assert_eq!(driver.queued().len(), 3);

    driver.apply(Side::First).await.unwrap();
    let pair = driver.current().unwrap();
    assert_eq!((pair.first, pair.second), (0, 2));

    // (1,2) refers to the deleted record 2
    assert_eq!(driver.apply(Side::First).await.unwrap(), ScanState::Done);
    assert_eq!(ids(&store, BOOK), vec!["1"]);
    assert_eq!(driver.summary().after, 1);
}

#[tokio::test]
async fn test_advance_and_retreat() {
    let store = store_with(
        BOOK,
        vec![displayed("1", "Jane Doe"), displayed("2", "Jane Doe"), displayed("3", "Jane Doe")],
    );
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();

    assert!(!driver.retreat().unwrap());
    driver.advance().unwrap();
    assert_eq!(driver.position(), Some(1));
    assert!(driver.retreat().unwrap());
    assert_eq!(driver.position(), Some(0));

    driver.advance().unwrap();
    driver.advance().unwrap();
    assert_eq!(driver.advance().unwrap(), ScanState::Done);
    assert_eq!(driver.summary().skipped, 4);
    assert_eq!(ids(&store, BOOK).len(), 3);
}

#[tokio::test]
async fn test_stop_discards_queue() {
    let store = store_with(
        BOOK,
        vec![displayed("1", "Jane Doe"), displayed("2", "Jane Doe"), displayed("3", "Jane Doe")],
    );
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();
    driver.apply(Side::First).await.unwrap();

    driver.stop();
    assert_eq!(driver.state(), ScanState::Done);
    assert!(driver.queued().is_empty());
    assert_eq!(ids(&store, BOOK), vec!["1", "3"]);
}

#[tokio::test]
async fn test_review_commands_need_review_state() {
    let store = store_with(BOOK, vec![displayed("1", "Jane Doe")]);
    let mut driver = ScanDriver::new(&store, Preferences::default());
    assert!(matches!(
        driver.advance(),
        Err(ScanError::InvalidState {
            expected: ScanState::AwaitingReview,
            actual: ScanState::Idle
        })
    ));

    driver.run(BOOK, None).await.unwrap();
    assert!(matches!(
        driver.apply(Side::First).await,
        Err(ScanError::InvalidState { .. })
    ));
    assert!(driver.compare_current().is_err());
}

#[tokio::test]
async fn test_compare_current() {
    let store = store_with(
        BOOK,
        vec![
            displayed("1", "Jane Doe"),
            record("2", &[(DISPLAY_NAME, "Jane Doe"), ("Company", "Acme")]),
        ],
    );
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();
    assert!(driver.compare_current().unwrap().prefers_removing_first());
}

#[tokio::test]
async fn test_scan_can_run_again() {
    let store = store_with(BOOK, jane_pair());
    let mut driver = ScanDriver::new(&store, Preferences::default());
    driver.run(BOOK, None).await.unwrap();
    assert!(matches!(
        driver.run(BOOK, None).await,
        Err(ScanError::InvalidState { .. })
    ));
    driver.stop();
    assert_eq!(driver.run(BOOK, None).await.unwrap(), ScanState::AwaitingReview);
    assert_eq!(driver.summary().removed_manually, 0);
}
