use std::cmp::Ordering;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::SmoothingConfig;

use super::key::ServerKey;
use super::smoothing::{drop_threshold, smoothed_average};
use super::status::ServerStatus;

/// Performance record for one `(hostname, protocol)` pair.
///
/// Mutated in place by the download client as transfers complete; queried by
/// the mirror-selection policy. Equality and ordering depend on the identity
/// key only, so records stay put in a sorted collection while their
/// statistics change underneath.
///
/// Every operation that refreshes the last-updated timestamp takes `now`
/// explicitly; the owner supplies the clock.
#[derive(Debug, Clone)]
pub struct ServerStat {
    key: ServerKey,
    /// Most recent instantaneous speed, bytes/sec. Not smoothed.
    download_speed: u64,
    /// Smoothed estimate for a single connection, bytes/sec.
    single_connection_avg_speed: u64,
    /// Smoothed estimate for multiple concurrent connections, bytes/sec.
    multi_connection_avg_speed: u64,
    /// Samples folded into the averages since the last reset.
    counter: u32,
    status: ServerStatus,
    /// Unset until the first update or status transition.
    last_updated: Option<SystemTime>,
}

impl ServerStat {
    pub fn new(hostname: &str, protocol: &str) -> Self {
        Self::from_key(ServerKey::new(hostname, protocol))
    }

    pub fn from_key(key: ServerKey) -> Self {
        Self {
            key,
            download_speed: 0,
            single_connection_avg_speed: 0,
            multi_connection_avg_speed: 0,
            counter: 0,
            status: ServerStatus::Ok,
            last_updated: None,
        }
    }

    pub fn key(&self) -> &ServerKey {
        &self.key
    }

    pub fn hostname(&self) -> &str {
        self.key.hostname()
    }

    pub fn protocol(&self) -> &str {
        self.key.protocol()
    }

    pub fn download_speed(&self) -> u64 {
        self.download_speed
    }

    pub fn single_connection_avg_speed(&self) -> u64 {
        self.single_connection_avg_speed
    }

    pub fn multi_connection_avg_speed(&self) -> u64 {
        self.multi_connection_avg_speed
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    pub fn last_updated(&self) -> Option<SystemTime> {
        self.last_updated
    }

    /// True when the record has never been updated, or its last update is
    /// older than `max_age`. The threshold is the caller's policy.
    pub fn is_stale(&self, now: SystemTime, max_age: Duration) -> bool {
        match self.last_updated {
            Some(t) => now.duration_since(t).is_ok_and(|age| age > max_age),
            None => true,
        }
    }

    /// Record the latest instantaneous speed. A positive speed is evidence
    /// the server is reachable and forces the status back to OK. Always
    /// refreshes the last-updated timestamp.
    pub fn update_download_speed(&mut self, speed: u64, now: SystemTime) {
        self.download_speed = speed;
        if speed > 0 {
            self.status = ServerStatus::Ok;
        }
        self.last_updated = Some(now);
    }

    /// Count one more completed connection/transfer sample. Call before the
    /// average updates below so the smoothing formula sees the new total.
    pub fn increase_counter(&mut self) {
        self.counter = self.counter.saturating_add(1);
    }

    /// Fold a single-connection speed sample into the smoothed average.
    ///
    /// No-op while the counter is 0 (no sample to anchor the average). A new
    /// average below the configured fraction of the previous one is treated
    /// as a sharp, sustained drop (the server started throttling, say) and
    /// resets the counter, so the next non-trivial update re-anchors from the
    /// cumulative-mean regime instead of dragging a stale EMA.
    pub fn update_single_connection_avg_speed(&mut self, speed: u64, cfg: &SmoothingConfig) {
        if self.counter == 0 {
            return;
        }
        let old = self.single_connection_avg_speed;
        let new = smoothed_average(old, speed, self.counter, cfg);
        if new < drop_threshold(old, cfg) {
            tracing::debug!(
                "ServerStat {}: resetting counter since single connection speed dropped",
                self.hostname()
            );
            self.counter = 0;
        }
        tracing::debug!(
            "ServerStat {}: single_connection_avg_speed old:{:.2}KB/s new:{:.2}KB/s last:{:.2}KB/s",
            self.hostname(),
            old as f64 / 1024.0,
            new as f64 / 1024.0,
            speed as f64 / 1024.0
        );
        self.single_connection_avg_speed = new;
    }

    /// Fold a multi-connection speed sample into the smoothed average.
    ///
    /// Same smoothing as the single-connection variant but no counter reset:
    /// aggregate throughput is noisier and a drop is not read as a regime
    /// change. No-op while the counter is 0.
    pub fn update_multi_connection_avg_speed(&mut self, speed: u64, cfg: &SmoothingConfig) {
        if self.counter == 0 {
            return;
        }
        let old = self.multi_connection_avg_speed;
        let new = smoothed_average(old, speed, self.counter, cfg);
        tracing::debug!(
            "ServerStat {}: multi_connection_avg_speed old:{:.2}KB/s new:{:.2}KB/s last:{:.2}KB/s",
            self.hostname(),
            old as f64 / 1024.0,
            new as f64 / 1024.0,
            speed as f64 / 1024.0
        );
        self.multi_connection_avg_speed = new;
    }

    /// Mark the server usable and refresh the last-updated timestamp.
    pub fn set_ok(&mut self, now: SystemTime) {
        self.transition_status(ServerStatus::Ok, now);
    }

    /// Mark the server unusable (e.g. after connection failures) and refresh
    /// the last-updated timestamp.
    pub fn set_error(&mut self, now: SystemTime) {
        self.transition_status(ServerStatus::Error, now);
    }

    fn transition_status(&mut self, status: ServerStatus, now: SystemTime) {
        tracing::debug!(
            "ServerStat: set status {} for {} ({})",
            status,
            self.hostname(),
            self.protocol()
        );
        self.status = status;
        self.last_updated = Some(now);
    }

    // Direct setters for bulk restoration (e.g. reloading persisted stats).
    // They bypass the smoothing and status policy above.

    pub fn set_download_speed(&mut self, speed: u64) {
        self.download_speed = speed;
    }

    pub fn set_single_connection_avg_speed(&mut self, speed: u64) {
        self.single_connection_avg_speed = speed;
    }

    pub fn set_multi_connection_avg_speed(&mut self, speed: u64) {
        self.multi_connection_avg_speed = speed;
    }

    pub fn set_counter(&mut self, counter: u32) {
        self.counter = counter;
    }

    pub fn set_last_updated(&mut self, time: SystemTime) {
        self.last_updated = Some(time);
    }

    pub fn set_status(&mut self, status: ServerStatus) {
        self.status = status;
    }

    /// Set the status from its canonical string form. Unrecognized strings
    /// leave the current status unchanged (best-effort restoration).
    pub fn set_status_str(&mut self, status: &str) {
        if let Ok(parsed) = status.parse::<ServerStatus>() {
            self.status = parsed;
        }
    }
}

impl PartialEq for ServerStat {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ServerStat {}

impl PartialOrd for ServerStat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServerStat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for ServerStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={}, protocol={}, dl_speed={}, sc_avg_speed={}, mc_avg_speed={}, ",
            self.hostname(),
            self.protocol(),
            self.download_speed,
            self.single_connection_avg_speed,
            self.multi_connection_avg_speed
        )?;
        match self.last_updated.and_then(|t| t.duration_since(UNIX_EPOCH).ok()) {
            Some(epoch) => write!(f, "last_updated={}, ", epoch.as_secs())?,
            None => write!(f, "last_updated=never, ")?,
        }
        write!(f, "counter={}, status={}", self.counter, self.status)
    }
}
