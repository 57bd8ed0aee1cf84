//! Backoff policy shared by the workers and the reconciler.

use std::time::Duration;

use crate::error::job::ErrorClass;
use crate::types::params::RetryParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Put the job back on its queue once the duration elapsed
    RetryAfter(Duration),
    GiveUp,
}

/// Decides what happens after attempt number `attempt` (1-based) failed with `error_class`.
///
/// Permanent errors give up right away. Transient errors back off exponentially from
/// `backoff_base`, capped at `backoff_cap`, until `max_attempts` attempts were made.
pub fn next_action(params: &RetryParams, attempt: u32, error_class: ErrorClass) -> RetryAction {
    if error_class == ErrorClass::Permanent || attempt >= params.max_attempts {
        return RetryAction::GiveUp;
    }
    let exponent = attempt.saturating_sub(1);
    let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
    let delay = params.backoff_base.checked_mul(factor).unwrap_or(params.backoff_cap);
    RetryAction::RetryAfter(delay.min(params.backoff_cap))
}
