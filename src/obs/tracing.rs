// self
use crate::{_prelude::*, auth::TokenAcquisitionError, obs::Stage};

/// Future returned by [`StageSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`StageSpan::instrument`]; the input future itself without `tracing`.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// `authed_fetch.stage` span for one stage invocation.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Opens the span for `op` within `stage`.
	pub fn new(stage: Stage, op: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("authed_fetch.stage", stage = stage.label(), op);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, op);

			Self {}
		}
	}

	/// Runs `fut` inside the span; the span is entered on every poll.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the diagnostic event for a failed token acquisition inside the fetch client.
pub fn token_failure(err: &TokenAcquisitionError) {
	#[cfg(feature = "tracing")]
	tracing::error!(kind = err.kind.as_str(), error = %err, "Error getting access token.");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}

/// Emits the event for a settlement dropped after its consumer went away.
pub fn settlement_discarded(url: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(url, "Discarded stale fetch settlement.");
	#[cfg(not(feature = "tracing"))]
	let _ = url;
}

/// Emits the event for a healthy liveness tick.
pub fn liveness_ok(tick: u64) {
	#[cfg(feature = "tracing")]
	tracing::trace!(tick, "Session is still live.");
	#[cfg(not(feature = "tracing"))]
	let _ = tick;
}

/// Emits the event for a liveness failure that forces logout.
pub fn forced_logout(tick: u64, err: &TokenAcquisitionError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		tick,
		kind = err.kind.as_str(),
		error = %err,
		"Session check failed; logging out."
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (tick, err);
}
