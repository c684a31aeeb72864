//! Session liveness monitor.
//!
//! A [`LivenessMonitor`] owns exactly one interval task per armed session. Every tick it
//! asks the [`AuthTokenProvider`] for a token; the first rejection forces a logout through
//! [`SessionControl::logout`] and ends the task, since the session it was watching is gone.
//! The task is aborted when the monitor is shut down, re-armed with a different token
//! accessor, or dropped.

// crates.io
use tokio::{
	runtime::Handle,
	task::JoinHandle,
	time::{self, Instant, MissedTickBehavior},
};
// self
use crate::{
	_prelude::*,
	auth::{AuthTokenProvider, LogoutOptions, SessionControl},
	config::MonitorConfig,
	error::ConfigError,
	obs::{self, Outcome, Stage, StageSpan},
};

/// Lifecycle-scoped periodic session check.
pub struct LivenessMonitor {
	tokens: AuthTokenProvider,
	control: Arc<dyn SessionControl>,
	config: MonitorConfig,
	task: Option<JoinHandle<()>>,
}
impl LivenessMonitor {
	/// Arms a monitor on the current Tokio runtime.
	///
	/// The first check runs one full interval after arming.
	pub fn start(
		tokens: AuthTokenProvider,
		control: Arc<dyn SessionControl>,
		config: MonitorConfig,
	) -> Result<Self> {
		config.validate()?;

		let task = spawn(&tokens, &control, &config)?;

		Ok(Self { tokens, control, config, task: Some(task) })
	}

	/// Rebinds the monitor to a new session, restarting the interval if the accessor changed
	/// or the previous interval already ended.
	///
	/// Returns `true` when the interval was restarted. On error the current binding and its
	/// interval are left untouched.
	pub fn rearm(
		&mut self,
		tokens: AuthTokenProvider,
		control: Arc<dyn SessionControl>,
	) -> Result<bool> {
		if self.tokens.same_source(&tokens) && self.is_active() {
			return Ok(false);
		}

		let task = spawn(&tokens, &control, &self.config)?;

		self.shutdown();
		self.tokens = tokens;
		self.control = control;
		self.task = Some(task);

		Ok(true)
	}

	/// Returns `true` while the interval task is alive.
	pub fn is_active(&self) -> bool {
		self.task.as_ref().is_some_and(|task| !task.is_finished())
	}

	/// Token accessor the monitor is currently bound to.
	pub fn tokens(&self) -> &AuthTokenProvider {
		&self.tokens
	}

	/// Cancels the interval task. Idempotent.
	pub fn shutdown(&mut self) {
		if let Some(task) = self.task.take() {
			task.abort();
		}
	}
}
impl Drop for LivenessMonitor {
	fn drop(&mut self) {
		self.shutdown();
	}
}
impl Debug for LivenessMonitor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LivenessMonitor")
			.field("interval", &self.config.interval)
			.field("active", &self.is_active())
			.finish()
	}
}

fn spawn(
	tokens: &AuthTokenProvider,
	control: &Arc<dyn SessionControl>,
	config: &MonitorConfig,
) -> Result<JoinHandle<()>> {
	let handle = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

	Ok(handle.spawn(watch(
		tokens.clone(),
		Arc::clone(control),
		config.interval,
		config.logout_options(),
	)))
}

async fn watch(
	tokens: AuthTokenProvider,
	control: Arc<dyn SessionControl>,
	period: Duration,
	logout: LogoutOptions,
) {
	const STAGE: Stage = Stage::Liveness;

	let mut ticker = time::interval_at(Instant::now() + period, period);
	let mut tick = 0_u64;

	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		ticker.tick().await;

		tick += 1;

		obs::record_outcome(STAGE, Outcome::Attempt);

		let span = StageSpan::new(STAGE, "check");

		match span.instrument(tokens.get_token()).await {
			Ok(_) => {
				obs::liveness_ok(tick);
				obs::record_outcome(STAGE, Outcome::Success);
			},
			Err(err) => {
				obs::forced_logout(tick, &err);
				obs::record_outcome(STAGE, Outcome::Failure);
				control.logout(logout);

				return;
			},
		}
	}
}
