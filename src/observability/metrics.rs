//! Metrics collection.
//!
//! # Metrics
//! - `custody_submissions_total` (counter): submissions by outcome
//! - `custody_submission_duration_seconds` (histogram): end-to-end latency by outcome

use std::time::Instant;

/// Outcome label for a successful submission.
pub const OUTCOME_SIGNED: &str = "signed";

/// Record one finished submission attempt.
pub fn record_submission(outcome: &'static str, start: Instant) {
    metrics::counter!("custody_submissions_total", "outcome" => outcome).increment(1);
    metrics::histogram!("custody_submission_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}
