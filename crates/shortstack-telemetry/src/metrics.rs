//! Dispatch metrics.
//!
//! Counters go through the `metrics` facade. Without an installed recorder
//! they are no-ops.

use metrics::{counter, describe_counter};

/// Counter of finished dispatches, labelled by `outcome`.
pub const DISPATCH_TOTAL: &str = "shortstack_dispatch_total";

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
    /// The handler returned a value.
    Completed,
    /// The handler halted.
    Halted,
    /// An error was normalized into a response.
    Failed,
    /// An error left the stack with interception disabled.
    Propagated,
}

impl DispatchOutcome {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Halted => "halted",
            Self::Failed => "failed",
            Self::Propagated => "propagated",
        }
    }
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registers metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Dispatches processed, by outcome");
}

/// Counts one finished dispatch.
pub fn record_dispatch(outcome: DispatchOutcome) {
    counter!(DISPATCH_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(DispatchOutcome::Completed.as_str(), "completed");
        assert_eq!(DispatchOutcome::Halted.to_string(), "halted");
        assert_eq!(DispatchOutcome::Failed.as_str(), "failed");
        assert_eq!(DispatchOutcome::Propagated.as_str(), "propagated");
    }

    #[test]
    fn test_recording_without_recorder() {
        describe_metrics();
        record_dispatch(DispatchOutcome::Completed);
    }
}
