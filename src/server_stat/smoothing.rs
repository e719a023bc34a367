//! Two-regime speed smoothing.

use crate::config::SmoothingConfig;

/// Fold `sample` into `avg`, given that `counter` samples (including this
/// one) have been observed since the last counter reset.
///
/// Below the warmup threshold this is the running mean of the samples so far,
/// so early samples carry full proportional weight. From the threshold on it
/// is a fixed-weight EMA, so the estimate keeps adapting when network
/// conditions change instead of being dominated by stale history. The result
/// is truncated to whole bytes/sec.
pub(super) fn smoothed_average(avg: u64, sample: u64, counter: u32, cfg: &SmoothingConfig) -> u64 {
    debug_assert!(counter > 0, "caller must guard counter == 0");
    let next = if counter < cfg.warmup() {
        // Running mean in the rearranged form; the spread form
        // ((c-1)/c)*avg + (1/c)*sample loses a whole byte/sec to rounding
        // before truncation (e.g. steady 1000 B/s at the third sample).
        let c = f64::from(counter);
        ((c - 1.0) * avg as f64 + sample as f64) / c
    } else {
        let retained = cfg.retained();
        retained * avg as f64 + (1.0 - retained) * sample as f64
    };
    next as u64
}

/// Threshold below which a new single-connection average counts as a sharp
/// drop. Truncated to whole bytes/sec before the comparison.
pub(super) fn drop_threshold(avg: u64, cfg: &SmoothingConfig) -> u64 {
    (cfg.drop_ratio() * avg as f64) as u64
}
