use super::*;

#[test]
fn from_epoch_millis_keeps_millisecond_precision() {
    let at = from_epoch_millis(1_772_366_400_250.0);
    assert_eq!(at.unix_timestamp(), 1_772_366_400);
    assert_eq!(at.millisecond(), 250);
}

#[test]
fn from_epoch_millis_clamps_nonsense_to_epoch() {
    assert_eq!(from_epoch_millis(f64::MAX), OffsetDateTime::UNIX_EPOCH);
}

#[test]
fn handles_start_active_and_cancel() {
    let handle = GlooScheduler.after(Duration::from_millis(10), Box::new(|| {}));
    assert!(handle.is_active());
    handle.cancel();
    assert!(!handle.is_active());
}
