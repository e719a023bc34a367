//! Per-server transfer statistics for mirror selection.
//!
//! The download client records observed speeds and health per
//! `(hostname, protocol)`; a best-mirror policy ranks candidates with them.

pub mod config;
pub mod logging;
pub mod server_stat;
