//! Per-server transfer statistics.
//!
//! This module tracks, per `(hostname, protocol)`:
//! - the most recent instantaneous download speed
//! - smoothed average speeds for single- and multi-connection transfers
//! - a binary health status (OK / ERROR) with a last-updated timestamp
//!
//! Records are plain values mutated in place by the caller after each
//! connection attempt or completed transfer. The mirror-selection policy that
//! owns them ranks candidate servers by these numbers (typically the highest
//! multi-connection average among OK servers with a recent update) and is
//! responsible for any locking, eviction, and persistence.

mod key;
mod smoothing;
mod stat;
mod status;

pub use key::ServerKey;
pub use stat::ServerStat;
pub use status::{ParseStatusError, ServerStatus};

#[cfg(test)]
mod tests;
