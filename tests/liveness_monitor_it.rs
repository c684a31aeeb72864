// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use parking_lot::Mutex;
use tokio::time::{self, Instant};
use url::Url;
// self
use authed_fetch::{
	auth::{
		AccessToken, AuthTokenProvider, LogoutOptions, SessionControl, TokenAcquisitionError,
		TokenFuture, TokenSource,
	},
	config::MonitorConfig,
	error::{ConfigError, Error},
	monitor::LivenessMonitor,
};

const PERIOD: Duration = Duration::from_secs(60);
const HALF: Duration = Duration::from_secs(30);

/// Token source that starts rejecting from the configured call onwards.
#[derive(Default)]
struct FlakySource {
	calls: AtomicUsize,
	fail_from: Option<usize>,
}
impl FlakySource {
	fn failing_from(call: usize) -> Self {
		Self { calls: AtomicUsize::new(0), fail_from: Some(call) }
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl TokenSource for FlakySource {
	fn get_access_token_silently(&self) -> TokenFuture<'_> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		let fail = self.fail_from.is_some_and(|from| call >= from);

		Box::pin(async move {
			if fail {
				Err(TokenAcquisitionError::session_expired("Refresh token expired"))
			} else {
				Ok(AccessToken::new(format!("token-{call}")))
			}
		})
	}
}

#[derive(Default)]
struct RecordingControl {
	logouts: Mutex<Vec<(LogoutOptions, Instant)>>,
}
impl RecordingControl {
	fn logouts(&self) -> Vec<(LogoutOptions, Instant)> {
		self.logouts.lock().clone()
	}
}
impl SessionControl for RecordingControl {
	fn login_with_redirect(&self) {}

	fn logout(&self, options: LogoutOptions) {
		self.logouts.lock().push((options, Instant::now()));
	}
}

fn start(source: &Arc<FlakySource>, control: &Arc<RecordingControl>) -> LivenessMonitor {
	LivenessMonitor::start(
		AuthTokenProvider::new(source.clone()),
		control.clone(),
		MonitorConfig::default(),
	)
	.expect("Monitor should arm inside a Tokio runtime.")
}

#[tokio::test(start_paused = true)]
async fn rejection_on_nth_tick_logs_out_exactly_once_at_that_tick() {
	const N: u32 = 3;

	let source = Arc::new(FlakySource::failing_from(N as usize));
	let control = Arc::new(RecordingControl::default());
	let started = Instant::now();
	let monitor = start(&source, &control);

	time::sleep(PERIOD * (N - 1) + HALF).await;

	assert!(control.logouts().is_empty(), "No logout may happen before tick {N}.");
	assert_eq!(source.calls(), (N - 1) as usize);

	time::sleep(PERIOD).await;

	let logouts = control.logouts();

	assert_eq!(logouts.len(), 1);
	assert_eq!(logouts[0].1, started + PERIOD * N);

	time::sleep(PERIOD * 5).await;

	assert_eq!(control.logouts().len(), 1, "Logout must be forced exactly once.");
	assert_eq!(source.calls(), N as usize, "Checks stop once the session is gone.");
	assert!(!monitor.is_active());
}

#[tokio::test(start_paused = true)]
async fn healthy_sessions_are_checked_every_interval_without_logout() {
	let source = Arc::new(FlakySource::default());
	let control = Arc::new(RecordingControl::default());
	let monitor = start(&source, &control);

	time::sleep(HALF).await;

	assert_eq!(source.calls(), 0, "The first check waits one full interval.");

	time::sleep(PERIOD * 10).await;

	assert_eq!(source.calls(), 10);
	assert!(control.logouts().is_empty());
	assert!(monitor.is_active());
}

#[tokio::test(start_paused = true)]
async fn interval_is_configurable_and_logout_options_are_forwarded() {
	let source = Arc::new(FlakySource::failing_from(1));
	let control = Arc::new(RecordingControl::default());
	let return_to = Url::parse("https://app.example.com/").expect("Fixture URL should parse.");
	let config = MonitorConfig::default()
		.with_interval(Duration::from_secs(5))
		.with_return_to(return_to.clone());
	let _monitor =
		LivenessMonitor::start(AuthTokenProvider::new(source.clone()), control.clone(), config)
			.expect("Monitor should arm inside a Tokio runtime.");

	time::sleep(Duration::from_secs(6)).await;

	let logouts = control.logouts();

	assert_eq!(logouts.len(), 1);
	assert_eq!(logouts[0].0.return_to, Some(return_to));
}

#[tokio::test(start_paused = true)]
async fn rearm_restarts_only_when_the_accessor_changes() {
	let old_source = Arc::new(FlakySource::default());
	let new_source = Arc::new(FlakySource::default());
	let control = Arc::new(RecordingControl::default());
	let mut monitor = start(&old_source, &control);

	time::sleep(PERIOD + HALF).await;

	let same = monitor.tokens().clone();

	assert!(!monitor.rearm(same, control.clone()).expect("Re-arming should succeed."));
	assert!(
		monitor
			.rearm(AuthTokenProvider::new(new_source.clone()), control.clone())
			.expect("Re-arming should succeed.")
	);

	time::sleep(PERIOD * 3 + HALF).await;

	assert_eq!(old_source.calls(), 1, "The old interval must be torn down.");
	assert_eq!(new_source.calls(), 3);
	assert!(monitor.is_active());
}

#[tokio::test(start_paused = true)]
async fn rearmed_monitor_logs_out_through_the_new_session() {
	let old_source = Arc::new(FlakySource::default());
	let new_source = Arc::new(FlakySource::failing_from(1));
	let old_control = Arc::new(RecordingControl::default());
	let new_control = Arc::new(RecordingControl::default());
	let mut monitor = start(&old_source, &old_control);

	monitor
		.rearm(AuthTokenProvider::new(new_source.clone()), new_control.clone())
		.expect("Re-arming should succeed.");
	time::sleep(PERIOD + HALF).await;

	assert!(old_control.logouts().is_empty());
	assert_eq!(new_control.logouts().len(), 1);
	assert!(!monitor.is_active());

	// A stopped monitor re-arms even for the same accessor.
	assert!(
		monitor
			.rearm(monitor.tokens().clone(), new_control.clone())
			.expect("Re-arming a stopped monitor should succeed.")
	);
}

#[test]
fn failed_rearm_keeps_the_running_interval() {
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_time()
		.start_paused(true)
		.build()
		.expect("Test runtime should build.");
	let old_source = Arc::new(FlakySource::default());
	let new_source = Arc::new(FlakySource::default());
	let control = Arc::new(RecordingControl::default());
	let mut monitor = runtime.block_on(async { start(&old_source, &control) });
	let err = monitor
		.rearm(AuthTokenProvider::new(new_source.clone()), control.clone())
		.expect_err("Re-arming outside a runtime should fail.");

	assert!(matches!(err, Error::Config(ConfigError::NoRuntime)));
	assert!(monitor.is_active());
	assert!(monitor.tokens().same_source(&AuthTokenProvider::new(old_source.clone())));

	runtime.block_on(async { time::sleep(PERIOD + HALF).await });

	assert_eq!(old_source.calls(), 1, "The original interval keeps running.");
	assert_eq!(new_source.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_and_drop_cancel_the_interval() {
	let first = Arc::new(FlakySource::default());
	let second = Arc::new(FlakySource::default());
	let control = Arc::new(RecordingControl::default());
	let mut stopped = start(&first, &control);
	let dropped = start(&second, &control);

	stopped.shutdown();
	stopped.shutdown();
	drop(dropped);
	time::sleep(PERIOD * 3).await;

	assert!(!stopped.is_active());
	assert_eq!(first.calls(), 0);
	assert_eq!(second.calls(), 0);
}

#[test]
fn arming_requires_a_runtime_and_a_positive_interval() {
	let source = Arc::new(FlakySource::default());
	let control = Arc::new(RecordingControl::default());
	let err = LivenessMonitor::start(
		AuthTokenProvider::new(source.clone()),
		control.clone(),
		MonitorConfig::default(),
	)
	.expect_err("Arming outside a runtime should fail.");

	assert!(matches!(err, Error::Config(ConfigError::NoRuntime)));

	let err = LivenessMonitor::start(
		AuthTokenProvider::new(source),
		control,
		MonitorConfig::default().with_interval(Duration::ZERO),
	)
	.expect_err("Zero interval should be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::InvalidInterval)));
}
