//! Tests for ServerStat record behavior.

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::SmoothingConfig;

use super::{ServerKey, ServerStat, ServerStatus};

fn cfg() -> SmoothingConfig {
    SmoothingConfig::default()
}

fn t(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn new_record_has_defaults() {
    let stat = ServerStat::new("mirror.example.org", "http");
    assert_eq!(stat.hostname(), "mirror.example.org");
    assert_eq!(stat.protocol(), "http");
    assert_eq!(stat.download_speed(), 0);
    assert_eq!(stat.single_connection_avg_speed(), 0);
    assert_eq!(stat.multi_connection_avg_speed(), 0);
    assert_eq!(stat.counter(), 0);
    assert_eq!(stat.status(), ServerStatus::Ok);
    assert!(stat.last_updated().is_none());
}

#[test]
fn average_updates_are_noops_without_samples() {
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.update_single_connection_avg_speed(5000, &cfg());
    stat.update_multi_connection_avg_speed(5000, &cfg());
    assert_eq!(stat.single_connection_avg_speed(), 0);
    assert_eq!(stat.multi_connection_avg_speed(), 0);
    assert_eq!(stat.counter(), 0);
    assert!(stat.last_updated().is_none());
}

#[test]
fn single_connection_warmup_then_ema() {
    let cfg = cfg();
    let mut stat = ServerStat::new("mirror.example.org", "http");

    stat.increase_counter();
    stat.update_single_connection_avg_speed(1000, &cfg);
    assert_eq!(stat.single_connection_avg_speed(), 1000);

    // Steady input holds the average through warmup and into the EMA.
    for _ in 0..4 {
        stat.increase_counter();
        stat.update_single_connection_avg_speed(1000, &cfg);
        assert_eq!(stat.single_connection_avg_speed(), 1000);
    }
    assert_eq!(stat.counter(), 5);

    // EMA: 0.8*1000 + 0.2*100 = 820, above the 800 threshold, no reset.
    stat.increase_counter();
    stat.update_single_connection_avg_speed(100, &cfg);
    assert_eq!(stat.single_connection_avg_speed(), 820);
    assert_eq!(stat.counter(), 6);

    // 0.8*820 + 0.2*0 = 656, which is exactly 80% of 820, not below it,
    // so the counter survives.
    stat.update_single_connection_avg_speed(0, &cfg);
    assert_eq!(stat.single_connection_avg_speed(), 656);
    assert_eq!(stat.counter(), 6);
}

#[test]
fn sharp_single_connection_drop_resets_counter() {
    let cfg = cfg();
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.increase_counter();
    stat.update_single_connection_avg_speed(1000, &cfg);
    stat.increase_counter();

    // (1*1000 + 0)/2 = 500 < 800: reset.
    stat.update_single_connection_avg_speed(0, &cfg);
    assert_eq!(stat.single_connection_avg_speed(), 500);
    assert_eq!(stat.counter(), 0);

    // Back at counter 0 the next update is a no-op again.
    stat.update_single_connection_avg_speed(9999, &cfg);
    assert_eq!(stat.single_connection_avg_speed(), 500);
}

#[test]
fn reset_fires_strictly_below_the_threshold() {
    let cfg = cfg();

    // (3*1000 + 196)/4 = 799 < 800: reset.
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.set_single_connection_avg_speed(1000);
    stat.set_counter(4);
    stat.update_single_connection_avg_speed(196, &cfg);
    assert_eq!(stat.single_connection_avg_speed(), 799);
    assert_eq!(stat.counter(), 0);

    // (3*1000 + 200)/4 = 800, not below 800: counter survives.
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.set_single_connection_avg_speed(1000);
    stat.set_counter(4);
    stat.update_single_connection_avg_speed(200, &cfg);
    assert_eq!(stat.single_connection_avg_speed(), 800);
    assert_eq!(stat.counter(), 4);
}

#[test]
fn multi_connection_drop_never_resets_counter() {
    let cfg = cfg();
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.set_multi_connection_avg_speed(1000);
    stat.set_counter(2);

    stat.update_multi_connection_avg_speed(0, &cfg);
    assert_eq!(stat.multi_connection_avg_speed(), 500);
    assert_eq!(stat.counter(), 2);
}

#[test]
fn positive_download_speed_forces_ok() {
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.set_error(t(100));
    assert_eq!(stat.status(), ServerStatus::Error);

    stat.update_download_speed(500, t(200));
    assert_eq!(stat.status(), ServerStatus::Ok);
    assert_eq!(stat.download_speed(), 500);
    assert_eq!(stat.last_updated(), Some(t(200)));
}

#[test]
fn zero_download_speed_leaves_status_alone() {
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.set_error(t(100));

    stat.update_download_speed(0, t(200));
    assert_eq!(stat.status(), ServerStatus::Error);
    assert_eq!(stat.download_speed(), 0);
    // The timestamp is still refreshed.
    assert_eq!(stat.last_updated(), Some(t(200)));
}

#[test]
fn status_transitions_refresh_last_updated() {
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.set_ok(t(10));
    assert_eq!(stat.last_updated(), Some(t(10)));
    stat.set_error(t(20));
    assert_eq!(stat.status(), ServerStatus::Error);
    assert_eq!(stat.last_updated(), Some(t(20)));
}

#[test]
fn average_updates_never_touch_last_updated() {
    let cfg = cfg();
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.set_ok(t(10));
    stat.increase_counter();
    stat.update_single_connection_avg_speed(1000, &cfg);
    stat.update_multi_connection_avg_speed(1000, &cfg);
    assert_eq!(stat.last_updated(), Some(t(10)));
}

#[test]
fn equality_and_ordering_use_identity_only() {
    let cfg = cfg();
    let mut a = ServerStat::new("mirror.example.org", "http");
    let b = ServerStat::new("mirror.example.org", "http");

    a.set_error(t(1));
    a.increase_counter();
    a.update_single_connection_avg_speed(4000, &cfg);
    assert_eq!(a, b);
    assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);

    let ftp = ServerStat::new("mirror.example.org", "ftp");
    let other = ServerStat::new("zz.example.org", "http");
    assert!(ftp < a);
    assert!(a < other);

    // A sorted set keyed by identity keeps one record per server.
    let mut set = BTreeSet::new();
    set.insert(a);
    set.insert(b);
    set.insert(ftp);
    assert_eq!(set.len(), 2);
}

#[test]
fn restoration_setters_bypass_policy() {
    let mut stat = ServerStat::from_key(ServerKey::new("mirror.example.org", "http"));
    stat.set_download_speed(1234);
    stat.set_single_connection_avg_speed(1000);
    stat.set_multi_connection_avg_speed(2000);
    stat.set_counter(3);
    stat.set_last_updated(t(500));
    stat.set_status(ServerStatus::Error);

    assert_eq!(stat.download_speed(), 1234);
    assert_eq!(stat.single_connection_avg_speed(), 1000);
    assert_eq!(stat.multi_connection_avg_speed(), 2000);
    assert_eq!(stat.counter(), 3);
    assert_eq!(stat.last_updated(), Some(t(500)));
    assert_eq!(stat.status(), ServerStatus::Error);
}

#[test]
fn status_string_restoration_ignores_unrecognized_input() {
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.set_status_str("ERROR");
    assert_eq!(stat.status(), ServerStatus::Error);
    assert_eq!(stat.status().as_str(), "ERROR");

    stat.set_status_str("bogus");
    assert_eq!(stat.status(), ServerStatus::Error);

    stat.set_status_str("OK");
    assert_eq!(stat.status(), ServerStatus::Ok);
}

#[test]
fn display_lists_all_fields() {
    let mut stat = ServerStat::new("mirror.example.org", "http");
    stat.set_download_speed(1234);
    stat.set_single_connection_avg_speed(1000);
    stat.set_multi_connection_avg_speed(2000);
    stat.set_counter(3);
    stat.set_last_updated(t(1_700_000_000));

    assert_eq!(
        stat.to_string(),
        "host=mirror.example.org, protocol=http, dl_speed=1234, \
         sc_avg_speed=1000, mc_avg_speed=2000, last_updated=1700000000, \
         counter=3, status=OK"
    );
}

#[test]
fn display_marks_unset_last_updated() {
    let stat = ServerStat::new("mirror.example.org", "http");
    assert!(stat.to_string().contains("last_updated=never"));
}

#[test]
fn staleness_against_a_caller_threshold() {
    let max_age = Duration::from_secs(60);
    let mut stat = ServerStat::new("mirror.example.org", "http");

    // Never updated: always stale.
    assert!(stat.is_stale(t(1000), max_age));

    stat.set_ok(t(1000));
    assert!(!stat.is_stale(t(1030), max_age));
    assert!(!stat.is_stale(t(1060), max_age));
    assert!(stat.is_stale(t(1061), max_age));

    // A timestamp from the future (clock skew) is not treated as stale.
    assert!(!stat.is_stale(t(900), max_age));
}
