use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Base seed for scenario runs; main sets it to the iteration index
pub static RAND_SEED: AtomicU64 = AtomicU64::new(0);

/// Enables one CSV log line per auction
pub static VERBOSE_AUCTION: AtomicBool = AtomicBool::new(false);

/// Number of campaigns run since the last reset, across all scenarios
pub static TOTAL_CAMPAIGN_RUNS: AtomicU64 = AtomicU64::new(0);

/// Derive a seed for one random stream from the current base seed
/// Different offsets give independent streams for the same base seed
pub fn get_seed(offset: u64) -> u64 {
    RAND_SEED
        .load(Ordering::Relaxed)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(offset)
}

/// Ratio that is 0 when the denominator is 0
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(3.0, 4.0), 0.75);
        assert_eq!(safe_ratio(3.0, 0.0), 0.0);
    }

    #[test]
    fn test_seed_offsets_differ() {
        assert_ne!(get_seed(1991), get_seed(2992));
    }
}
