use serde::Serialize;

/// What the table's filter box should do after a reset button event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ResetOutcome {
    /// The button was never pressed; leave the presentation untouched.
    Suppressed,
    /// Replace the filter query with the empty string.
    ClearFilters,
}

/// `clicks` is the button's monotonic press counter.
pub fn reset_filters(clicks: u64) -> ResetOutcome {
    if clicks == 0 {
        ResetOutcome::Suppressed
    } else {
        ResetOutcome::ClearFilters
    }
}
