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
use tokio::time;
use url::Url;
// self
use authed_fetch::{
	auth::{
		AccessToken, IdentityProvider, IdentityUser, LogoutOptions, SessionControl,
		SessionSnapshot, TokenAcquisitionError, TokenFuture, TokenSource,
	},
	config::{IdentityConfig, MonitorConfig, SessionConfig},
	http::{HttpRequest, HttpTransport, RawResponse, RequestOptions, TransportFuture},
	session::{Session, SessionStatus},
};

const URL: &str = "https://api.example.com/user";

/// Identity provider double with a mutable snapshot and a fixed token.
struct FakeIdentity {
	token: &'static str,
	snapshot: Mutex<SessionSnapshot>,
	expired: Mutex<bool>,
	token_calls: AtomicUsize,
	logins: AtomicUsize,
	logouts: Mutex<Vec<LogoutOptions>>,
}
impl FakeIdentity {
	fn new(token: &'static str) -> Arc<Self> {
		Arc::new(Self {
			token,
			snapshot: Mutex::new(SessionSnapshot::default()),
			expired: Mutex::new(false),
			token_calls: AtomicUsize::new(0),
			logins: AtomicUsize::new(0),
			logouts: Mutex::new(Vec::new()),
		})
	}

	fn set(&self, snapshot: SessionSnapshot) {
		*self.snapshot.lock() = snapshot;
	}

	fn expire(&self) {
		*self.expired.lock() = true;
	}

	fn token_calls(&self) -> usize {
		self.token_calls.load(Ordering::SeqCst)
	}

	fn logouts(&self) -> Vec<LogoutOptions> {
		self.logouts.lock().clone()
	}
}
impl TokenSource for FakeIdentity {
	fn get_access_token_silently(&self) -> TokenFuture<'_> {
		self.token_calls.fetch_add(1, Ordering::SeqCst);

		let result = if *self.expired.lock() {
			Err(TokenAcquisitionError::session_expired("Session expired"))
		} else {
			Ok(AccessToken::new(self.token))
		};

		Box::pin(async move { result })
	}
}
impl SessionControl for FakeIdentity {
	fn login_with_redirect(&self) {
		self.logins.fetch_add(1, Ordering::SeqCst);
	}

	fn logout(&self, options: LogoutOptions) {
		self.logouts.lock().push(options);
	}
}
impl IdentityProvider for FakeIdentity {
	fn snapshot(&self) -> SessionSnapshot {
		self.snapshot.lock().clone()
	}
}

#[derive(Default)]
struct RecordingTransport {
	requests: Mutex<Vec<HttpRequest>>,
}
impl HttpTransport for RecordingTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			self.requests.lock().push(request);

			Ok(RawResponse::new(200, "{}"))
		})
	}
}

fn config() -> SessionConfig {
	let identity = IdentityConfig::builder()
		.domain("tenant.example.com")
		.client_id("client-123")
		.redirect_uri(
			Url::parse("https://app.example.com/callback").expect("Fixture URL should parse."),
		)
		.build()
		.expect("Fixture configuration should validate.");

	SessionConfig::new(identity)
}

fn origin() -> Url {
	Url::parse("https://app.example.com/").expect("Fixture URL should parse.")
}

fn start(
	identity: &Arc<FakeIdentity>,
	transport: &Arc<RecordingTransport>,
) -> Session<FakeIdentity, RecordingTransport> {
	Session::start(Arc::clone(identity), Arc::clone(transport), config())
		.expect("Session should start inside a Tokio runtime.")
}

#[tokio::test(start_paused = true)]
async fn status_follows_the_provider_snapshot() {
	let identity = FakeIdentity::new("token-a");
	let transport = Arc::new(RecordingTransport::default());
	let session = start(&identity, &transport);
	let user = IdentityUser {
		name: Some("John Maverick".into()),
		email: Some("john.maverick@example.com".into()),
		sub: Some("auth0|1".into()),
	};

	assert_eq!(session.status(), SessionStatus::Anonymous);

	identity.set(SessionSnapshot {
		is_loading: true,
		error: Some("ignored".into()),
		..Default::default()
	});

	assert_eq!(session.status(), SessionStatus::Loading);

	identity.set(SessionSnapshot { error: Some("Popup closed".into()), ..Default::default() });

	assert_eq!(session.status(), SessionStatus::Failed("Popup closed".into()));

	identity.set(SessionSnapshot {
		is_authenticated: true,
		user: Some(user.clone()),
		..Default::default()
	});

	assert_eq!(session.status(), SessionStatus::Authenticated(user));
}

#[tokio::test(start_paused = true)]
async fn login_and_logout_are_forwarded_with_the_origin_as_return_target() {
	let identity = FakeIdentity::new("token-a");
	let transport = Arc::new(RecordingTransport::default());
	let session = start(&identity, &transport);

	session.login();
	session.logout();

	assert_eq!(identity.logins.load(Ordering::SeqCst), 1);
	assert_eq!(identity.logouts(), vec![LogoutOptions::default().with_return_to(origin())]);
	assert_eq!(session.config().monitor.interval, MonitorConfig::DEFAULT_INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn shared_client_attaches_the_provider_token() {
	let identity = FakeIdentity::new("token-a");
	let transport = Arc::new(RecordingTransport::default());
	let session = start(&identity, &transport);

	session
		.client()
		.request(URL, RequestOptions::default())
		.await
		.expect("Authenticated request should succeed.");

	let requests = transport.requests.lock();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].header("Authorization"), Some("Bearer token-a"));
}

#[tokio::test(start_paused = true)]
async fn expired_session_is_logged_out_by_the_monitor() {
	let identity = FakeIdentity::new("token-a");
	let transport = Arc::new(RecordingTransport::default());
	let session = start(&identity, &transport);

	time::sleep(Duration::from_secs(90)).await;

	assert!(identity.logouts().is_empty());

	identity.expire();
	time::sleep(Duration::from_secs(60)).await;

	assert_eq!(identity.logouts(), vec![LogoutOptions::default().with_return_to(origin())]);
	assert!(!session.monitor().is_active());
}

#[tokio::test(start_paused = true)]
async fn rebind_rearms_monitor_and_rebuilds_the_client() {
	let first = FakeIdentity::new("token-a");
	let second = FakeIdentity::new("token-b");
	let transport = Arc::new(RecordingTransport::default());
	let mut session = start(&first, &transport);

	session.rebind(Arc::clone(&first)).expect("Rebinding the same provider is a no-op.");
	time::sleep(Duration::from_secs(90)).await;

	assert_eq!(first.token_calls(), 1);

	session.rebind(Arc::clone(&second)).expect("Rebinding should re-arm the monitor.");
	session
		.client()
		.request(URL, RequestOptions::default())
		.await
		.expect("Request through the rebound client should succeed.");
	time::sleep(Duration::from_secs(150)).await;

	assert_eq!(first.token_calls(), 1, "The old provider must no longer be polled.");
	assert_eq!(second.token_calls(), 3, "One request plus two liveness checks.");
	assert_eq!(
		transport.requests.lock().last().and_then(|request| request.header("Authorization")),
		Some("Bearer token-b")
	);
	assert!(session.monitor().is_active());
}

#[test]
fn failed_rebind_keeps_the_current_provider_and_interval() {
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_time()
		.start_paused(true)
		.build()
		.expect("Test runtime should build.");
	let first = FakeIdentity::new("token-a");
	let second = FakeIdentity::new("token-b");
	let transport = Arc::new(RecordingTransport::default());
	let mut session = runtime.block_on(async { start(&first, &transport) });

	session.rebind(Arc::clone(&second)).expect_err("Rebinding outside a runtime should fail.");

	assert!(session.monitor().is_active());

	runtime.block_on(async {
		time::sleep(Duration::from_secs(90)).await;
		session
			.client()
			.request(URL, RequestOptions::default())
			.await
			.expect("Request through the original client should succeed.");
	});

	assert_eq!(first.token_calls(), 2, "One liveness check plus one request.");
	assert_eq!(second.token_calls(), 0);
	assert_eq!(
		transport.requests.lock().last().and_then(|request| request.header("Authorization")),
		Some("Bearer token-a")
	);
}

#[tokio::test(start_paused = true)]
async fn close_stops_background_checks_without_logging_out() {
	let identity = FakeIdentity::new("token-a");
	let transport = Arc::new(RecordingTransport::default());
	let session = start(&identity, &transport);

	session.close();
	time::sleep(Duration::from_secs(300)).await;

	assert_eq!(identity.token_calls(), 0);
	assert!(identity.logouts().is_empty());
}
