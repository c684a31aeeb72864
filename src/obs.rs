//! Spans, events, and counters for the request, lifecycle, and liveness stages.
//!
//! Both backends are opt-in. With `tracing`, every stage runs inside an `authed_fetch.stage`
//! span carrying `stage` and `op` fields, and notable transitions (token failure, discarded
//! settlement, forced logout) emit events. With `metrics`, each transition bumps
//! `authed_fetch_stage_total{stage, outcome}`. Disabled backends compile to nothing.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Where in the pipeline an observation was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// [`FetchClient::request`](crate::client::FetchClient::request).
	Request,
	/// A [`FetchTask`](crate::fetch::FetchTask) from start to settlement.
	Lifecycle,
	/// One [`LivenessMonitor`](crate::monitor::LivenessMonitor) tick.
	Liveness,
}
impl Stage {
	/// Field value used for the `stage` label.
	pub const fn label(self) -> &'static str {
		match self {
			Self::Request => "request",
			Self::Lifecycle => "lifecycle",
			Self::Liveness => "liveness",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.label())
	}
}

/// How a stage ended, or that it began.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// The stage started.
	Attempt,
	/// The stage completed and its result was used.
	Success,
	/// The stage completed with an error.
	Failure,
	/// The stage completed but nobody was left to observe the result.
	Discarded,
}
impl Outcome {
	/// Field value used for the `outcome` label.
	pub const fn label(self) -> &'static str {
		match self {
			Self::Attempt => "attempt",
			Self::Success => "success",
			Self::Failure => "failure",
			Self::Discarded => "discarded",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.label())
	}
}
