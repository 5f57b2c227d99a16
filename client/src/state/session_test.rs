use paytrack_session::sim::{ManualClock, ManualScheduler, SharedStorage, issue_unsigned};
use time::OffsetDateTime;

use super::*;

fn sim_monitor() -> Arc<SessionMonitor> {
    let start = OffsetDateTime::from_unix_timestamp(1_772_366_400).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let scheduler = Arc::new(ManualScheduler::with_clock(Arc::clone(&clock)));
    let config = SessionConfig::default();
    let store = CredentialStore::new(SharedStorage::new().open_tab(), &config);
    SessionMonitor::new(store, SessionEventBus::new(), clock, scheduler, config)
}

#[test]
fn should_redirect_unauth_only_after_a_failed_check() {
    let unauth = AuthState { session: SessionState::Unauthenticated, identity: None };
    assert!(should_redirect_unauth(&unauth));
}

#[test]
fn should_not_redirect_while_loading() {
    let state = AuthState::default();
    assert!(state.loading());
    assert!(!should_redirect_unauth(&state));
}

#[test]
fn should_not_redirect_when_authenticated() {
    let state = AuthState {
        session: SessionState::Authenticated,
        identity: Some(Identity { subject_id: "u1".to_owned(), display_name: "Alice".to_owned() }),
    };
    assert!(!should_redirect_unauth(&state));
}

#[test]
fn auth_signal_mirrors_monitor() {
    let monitor = sim_monitor();
    let ctx = SessionContext::with_monitor(Arc::clone(&monitor));
    assert!(ctx.auth.get_untracked().loading());

    let expires = OffsetDateTime::from_unix_timestamp(1_772_366_400 + 900).unwrap();
    monitor.login(&issue_unsigned("u1", "a@b.com", expires));
    let state = ctx.auth.get_untracked();
    assert_eq!(state.session, SessionState::Authenticated);
    assert_eq!(state.identity.map(|i| i.display_name), Some("a@b.com".to_owned()));

    monitor.logout();
    assert_eq!(ctx.auth.get_untracked(), AuthState { session: SessionState::Unauthenticated, identity: None });
}

#[test]
fn unknown_build_time_keys_are_absent() {
    assert_eq!(build_time_value("SESSION_SOMETHING_ELSE"), None);
}
