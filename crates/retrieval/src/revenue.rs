//! Revenue aggregation over candidate lists.
//!
//! A zero amount counts as a real zero. Callers that need to tell genuine
//! zero-dollar codes from variable pricing check `is_variable_pricing`.

use crate::types::{RevenueBreakdown, RevenueSummary, ScoredCandidate};

/// Sum, count and average amount of `candidates`.
pub fn summarize(candidates: &[ScoredCandidate]) -> RevenueSummary {
    let count = candidates.len();
    let sum: f64 = candidates.iter().map(|c| c.numeric_amount).sum();
    let average = if count == 0 { 0.0 } else { sum / count as f64 };

    RevenueSummary {
        sum,
        count,
        average,
    }
}

/// Primary and add-on summaries plus the grand total.
pub fn breakdown(primary: &[ScoredCandidate], add_on: &[ScoredCandidate]) -> RevenueBreakdown {
    let variable_pricing = variable_pricing_count(primary) + variable_pricing_count(add_on);
    let primary = summarize(primary);
    let add_on = summarize(add_on);

    RevenueBreakdown {
        total: primary.sum + add_on.sum,
        primary,
        add_on,
        variable_pricing,
    }
}

/// Number of candidates whose amount needs manual interpretation.
pub fn variable_pricing_count(candidates: &[ScoredCandidate]) -> usize {
    candidates.iter().filter(|c| c.is_variable_pricing).count()
}
