use std::sync::atomic::AtomicUsize;

use super::*;
use crate::codec;

fn recorder(tab: &TabStorage) -> Arc<Mutex<Vec<StorageChange>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    tab.on_remote_change(move |change| sink.lock().unwrap().push(change.clone()));
    seen
}

fn start() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_772_366_400).unwrap()
}

// =============================================================
// SharedStorage / TabStorage
// =============================================================

#[test]
fn writes_are_visible_to_every_tab() {
    let shared = SharedStorage::new();
    let a = shared.open_tab();
    let b = shared.open_tab();

    a.set_item("k", "v").unwrap();
    assert_eq!(b.get_item("k").unwrap(), Some("v".to_owned()));
    assert_eq!(shared.get("k"), Some("v".to_owned()));
}

#[test]
fn notifications_skip_the_writing_tab_and_wait_for_delivery() {
    let shared = SharedStorage::new();
    let a = shared.open_tab();
    let b = shared.open_tab();
    let seen_a = recorder(&a);
    let seen_b = recorder(&b);

    a.set_item("k", "v").unwrap();
    assert!(seen_b.lock().unwrap().is_empty());

    assert_eq!(shared.deliver_pending(), 1);
    assert!(seen_a.lock().unwrap().is_empty());
    assert_eq!(
        *seen_b.lock().unwrap(),
        vec![StorageChange { key: Some("k".to_owned()), new_value: Some("v".to_owned()) }]
    );
}

#[test]
fn unchanged_writes_and_missing_removes_are_silent() {
    let shared = SharedStorage::new();
    let a = shared.open_tab();
    let b = shared.open_tab();
    let seen_b = recorder(&b);

    a.set_item("k", "v").unwrap();
    a.set_item("k", "v").unwrap();
    a.remove_item("other").unwrap();
    shared.deliver_pending();
    assert_eq!(seen_b.lock().unwrap().len(), 1);
}

#[test]
fn clear_all_broadcasts_keyless_change() {
    let shared = SharedStorage::new();
    let a = shared.open_tab();
    let b = shared.open_tab();
    let seen_b = recorder(&b);

    a.set_item("k", "v").unwrap();
    a.clear_all();
    shared.deliver_pending();
    assert_eq!(seen_b.lock().unwrap().last(), Some(&StorageChange { key: None, new_value: None }));
    assert_eq!(shared.get("k"), None);
}

#[test]
fn closed_tab_drops_pending_notifications() {
    let shared = SharedStorage::new();
    let a = shared.open_tab();
    let b = shared.open_tab();
    let seen_b = recorder(&b);

    a.set_item("k", "v").unwrap();
    b.close();
    assert_eq!(shared.deliver_pending(), 0);
    assert!(seen_b.lock().unwrap().is_empty());
}

#[test]
fn failing_writes_report_storage_unavailable() {
    let shared = SharedStorage::new();
    let a = shared.open_tab();
    a.set_fail_writes(true);
    assert!(matches!(a.set_item("k", "v"), Err(SessionError::StorageUnavailable(_))));
    assert_eq!(shared.get("k"), None);
}

// =============================================================
// ManualScheduler / ManualClock
// =============================================================

#[test]
fn manual_scheduler_runs_tasks_in_due_order() {
    let scheduler = ManualScheduler::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let late = Arc::clone(&order);
    let _late = scheduler.after(Duration::from_secs(5), Box::new(move || late.lock().unwrap().push("late")));
    let early = Arc::clone(&order);
    let _early = scheduler.after(Duration::from_secs(1), Box::new(move || early.lock().unwrap().push("early")));

    scheduler.advance(Duration::from_secs(4));
    assert_eq!(*order.lock().unwrap(), vec!["early"]);
    scheduler.advance(Duration::from_secs(1));
    assert_eq!(*order.lock().unwrap(), vec!["early", "late"]);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn manual_scheduler_repeats_until_cancelled() {
    let scheduler = ManualScheduler::new();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let handle = scheduler.every(
        Duration::from_secs(60),
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    scheduler.advance(Duration::from_secs(180));
    assert_eq!(count.load(Ordering::SeqCst), 3);

    handle.cancel();
    scheduler.advance(Duration::from_secs(600));
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn manual_scheduler_moves_clock_to_each_due_time() {
    let clock = Arc::new(ManualClock::new(start()));
    let scheduler = ManualScheduler::with_clock(Arc::clone(&clock));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let observed = Arc::clone(&clock);
    let _handle = scheduler.every(
        Duration::from_secs(60),
        Box::new(move || sink.lock().unwrap().push(observed.now())),
    );

    scheduler.advance(Duration::from_secs(150));
    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![start() + Duration::from_secs(60), start() + Duration::from_secs(120)]);
    assert_eq!(clock.now(), start() + Duration::from_secs(150));
}

#[test]
fn tasks_scheduled_while_firing_run_in_the_same_advance() {
    let scheduler = Arc::new(ManualScheduler::new());
    let fired = Arc::new(AtomicBool::new(false));

    let inner_scheduler = Arc::clone(&scheduler);
    let flag = Arc::clone(&fired);
    let _outer = scheduler.after(
        Duration::from_secs(1),
        Box::new(move || {
            let flag = Arc::clone(&flag);
            let _inner = inner_scheduler.after(Duration::from_secs(1), Box::new(move || flag.store(true, Ordering::SeqCst)));
        }),
    );

    scheduler.advance(Duration::from_secs(2));
    assert!(fired.load(Ordering::SeqCst));
}

// =============================================================
// issue_unsigned
// =============================================================

#[test]
fn issued_credentials_decode() {
    let expires_at = start() + Duration::from_secs(900);
    let token = issue_unsigned("u1", "a@b.com", expires_at);
    assert_eq!(token.split('.').count(), 3);

    let claims = codec::decode(&token).unwrap();
    assert_eq!(claims.subject_id, "u1");
    assert_eq!(claims.display_name, "a@b.com");
    assert_eq!(claims.expires_at, expires_at);
}
