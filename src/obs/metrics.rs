// self
use crate::obs::{Outcome, Stage};

const STAGE_COUNTER: &str = "authed_fetch_stage_total";

/// Bumps the stage counter; a no-op unless `metrics` is enabled and a recorder is installed.
pub fn record_outcome(stage: Stage, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(STAGE_COUNTER, "stage" => stage.label(), "outcome" => outcome.label())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (STAGE_COUNTER, stage, outcome);
}
