//! Final statistics summary.

use log::info;
use std::time::Instant;

use crate::error_handling::GateStats;

/// Prints every non-zero gate counter and a one-line summary.
pub fn print_final_statistics(stats: &GateStats, start_time: Instant) {
    let snapshot = stats.snapshot();
    if snapshot.iter().any(|(_, count)| *count > 0) {
        info!("Gate counters:");
        for (outcome, count) in snapshot {
            if count > 0 {
                info!("   {}: {}", outcome.name(), count);
            }
        }
    }

    print_simple_summary(
        stats.total_requests(),
        stats.total_denied(),
        start_time.elapsed().as_secs_f64(),
    );
}

/// Works with both plain and JSON log formats (log::info! handles formatting).
fn print_simple_summary(total: usize, denied: usize, elapsed_seconds: f64) {
    info!(
        "✅ Evaluated {} request{} ({} forwarded, {} denied) in {:.1}s",
        total,
        if total == 1 { "" } else { "s" },
        total.saturating_sub(denied),
        denied,
        elapsed_seconds
    );
}
