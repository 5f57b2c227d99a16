//! End-to-end session flows across tabs, time and navigation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use paytrack_session::navigation::{self, HOME_PATH};
use paytrack_session::sim::{ManualClock, ManualScheduler, SharedStorage, TabStorage, issue_unsigned};
use paytrack_session::{
    CredentialStore, GuardDecision, LogoutFlow, RedirectIntent, RouteGuard, SessionConfig, SessionEventBus,
    SessionMonitor, SessionSignal, SessionState,
};
use time::OffsetDateTime;

fn start_time() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_772_366_400).unwrap()
}

fn token(expires_in_secs: i64) -> String {
    issue_unsigned("u1", "a@b.com", start_time() + time::Duration::seconds(expires_in_secs))
}

struct Tab {
    storage: Arc<TabStorage>,
    monitor: Arc<SessionMonitor>,
}

/// One browser tab: its own bus, monitor and storage listener, sharing
/// `shared` with every other tab and `clock` with the test.
fn open_tab(shared: &SharedStorage, clock: &Arc<ManualClock>, scheduler: &Arc<ManualScheduler>) -> Tab {
    let config = SessionConfig::default();
    let storage = shared.open_tab();
    let bus = SessionEventBus::new();
    let store = CredentialStore::new(storage.clone(), &config);

    let listener_bus = bus.clone();
    let key = config.credential_key.clone();
    storage.on_remote_change(move |change| {
        listener_bus.ingest_storage_change(change, &key);
    });

    let monitor = SessionMonitor::new(store, bus, clock.clone(), scheduler.clone(), config);
    monitor.start();
    Tab { storage, monitor }
}

fn world() -> (SharedStorage, Arc<ManualClock>, Arc<ManualScheduler>) {
    // Several tests share the process; only the first install wins.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let clock = Arc::new(ManualClock::new(start_time()));
    let scheduler = Arc::new(ManualScheduler::with_clock(Arc::clone(&clock)));
    (SharedStorage::new(), clock, scheduler)
}

#[test]
fn credential_expires_after_its_lifetime() {
    let (shared, clock, scheduler) = world();
    let tab = open_tab(&shared, &clock, &scheduler);

    tab.monitor.store().save(&token(900)).unwrap();
    assert!(tab.monitor.check_now());

    clock.advance(Duration::from_secs(901));
    assert!(!tab.monitor.check_now());
    assert_eq!(tab.monitor.store().read(), None);
    assert_eq!(shared.get("paytrack_token"), None);
}

#[test]
fn idle_tab_notices_expiry_on_its_own() {
    let (shared, clock, scheduler) = world();
    let tab = open_tab(&shared, &clock, &scheduler);
    tab.monitor.login(&token(900));

    scheduler.advance(Duration::from_secs(840));
    assert!(tab.monitor.is_authenticated());
    scheduler.advance(Duration::from_secs(60));
    assert_eq!(tab.monitor.state(), SessionState::Unauthenticated);
}

#[test]
fn login_in_one_tab_authenticates_the_other() {
    let (shared, clock, scheduler) = world();
    let a = open_tab(&shared, &clock, &scheduler);
    let b = open_tab(&shared, &clock, &scheduler);
    assert!(!b.monitor.is_authenticated());

    assert!(a.monitor.login(&token(900)));
    assert!(!b.monitor.is_authenticated());

    shared.deliver_pending();
    assert!(b.monitor.is_authenticated());
}

#[test]
fn logout_in_one_tab_releases_the_other() {
    let (shared, clock, scheduler) = world();
    let a = open_tab(&shared, &clock, &scheduler);
    let b = open_tab(&shared, &clock, &scheduler);
    a.monitor.login(&token(900));
    shared.deliver_pending();

    let released = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&released);
    let _sub = b.monitor.bus().subscribe(move |signal| {
        if signal == SessionSignal::Released {
            *counter.lock().unwrap() += 1;
        }
    });

    a.monitor.logout();
    shared.deliver_pending();
    assert!(!b.monitor.is_authenticated());
    assert!(*released.lock().unwrap() >= 1);
}

#[test]
fn clearing_storage_elsewhere_logs_out() {
    let (shared, clock, scheduler) = world();
    let a = open_tab(&shared, &clock, &scheduler);
    let b = open_tab(&shared, &clock, &scheduler);
    a.monitor.login(&token(900));
    shared.deliver_pending();

    b.storage.clear_all();
    shared.deliver_pending();
    assert!(!a.monitor.is_authenticated());
}

#[test]
fn closed_tab_is_never_notified() {
    let (shared, clock, scheduler) = world();
    let a = open_tab(&shared, &clock, &scheduler);
    let b = open_tab(&shared, &clock, &scheduler);

    a.monitor.login(&token(900));
    b.storage.close();
    assert_eq!(shared.deliver_pending(), 0);
    // The periodic check still converges the closed tab's monitor.
    scheduler.advance(Duration::from_secs(60));
    assert!(b.monitor.is_authenticated());
}

#[test]
fn guarded_page_redirects_then_restores_after_login() {
    let (shared, clock, scheduler) = world();
    let tab = open_tab(&shared, &clock, &scheduler);

    let guard = RouteGuard::new();
    let ticket = guard.enter("/paycheck");
    let Some(GuardDecision::Redirect(intent)) = guard.verify(&ticket, &tab.monitor) else {
        panic!("unauthenticated visit must redirect");
    };
    assert_eq!(intent.from_path.as_deref(), Some("/paycheck"));

    // The intent crosses a full page load as a query string.
    let location = intent.to_location();
    assert_eq!(location, "/login?from=%2Fpaycheck");
    let restored = RedirectIntent::from_query(Some("/paycheck".to_owned()), None, None);

    assert!(tab.monitor.login(&token(900)));
    assert_eq!(navigation::after_login(restored, HOME_PATH), "/paycheck");

    let ticket = guard.enter("/paycheck");
    assert_eq!(guard.verify(&ticket, &tab.monitor), Some(GuardDecision::Render));
}

#[test]
fn api_unauthorized_and_user_logout_race_navigates_once() {
    let (shared, clock, scheduler) = world();
    let tab = open_tab(&shared, &clock, &scheduler);
    tab.monitor.login(&token(900));

    let hops = Arc::new(Mutex::new(Vec::new()));
    let flow = LogoutFlow::new();
    let delay = tab.monitor.config().logout_redirect_delay;

    for _ in 0..2 {
        tab.monitor.logout();
        let sink = Arc::clone(&hops);
        flow.after_logout(&*scheduler, delay, move |path| sink.lock().unwrap().push(path.to_owned()));
    }
    let redirect = tab.monitor.handle_unauthorized("/logout");
    assert_eq!(redirect, None);

    scheduler.advance(Duration::from_secs(2));
    assert_eq!(*hops.lock().unwrap(), vec!["/login"]);
    assert_eq!(tab.monitor.store().read(), None);
}
