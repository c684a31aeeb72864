//! Application-shell wiring for one signed-in session.
//!
//! A [`Session`] is constructed once per identity provider instance and passed by reference
//! to whatever needs it. It builds the shared [`FetchClient`], owns the single
//! [`LivenessMonitor`] for the session, and forwards login/logout to the provider.

// self
use crate::{
	_prelude::*,
	auth::{AuthTokenProvider, IdentityProvider, IdentityUser, SessionControl, TokenSource},
	client::FetchClient,
	config::SessionConfig,
	http::HttpTransport,
	monitor::LivenessMonitor,
};

/// Rendering-level view of the identity provider's session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
	/// Provider is still resolving the session.
	Loading,
	/// Provider reported a failure.
	Failed(String),
	/// A user is signed in.
	Authenticated(IdentityUser),
	/// Nobody is signed in.
	Anonymous,
}

/// One signed-in session bound to an identity provider.
pub struct Session<P, C>
where
	P: 'static + IdentityProvider,
	C: ?Sized + HttpTransport,
{
	identity: Arc<P>,
	client: FetchClient<C>,
	monitor: LivenessMonitor,
	config: SessionConfig,
}
impl<P, C> Session<P, C>
where
	P: 'static + IdentityProvider,
	C: ?Sized + HttpTransport,
{
	/// Builds the fetch client and arms the liveness monitor on the current Tokio runtime.
	pub fn start(
		identity: Arc<P>,
		transport: Arc<C>,
		config: SessionConfig,
	) -> Result<Self> {
		let tokens = token_provider(&identity);
		let control: Arc<dyn SessionControl> = identity.clone();
		let monitor = LivenessMonitor::start(tokens.clone(), control, config.monitor.clone())?;
		let client = FetchClient::with_transport(tokens, transport);

		Ok(Self { identity, client, monitor, config })
	}

	/// Shared fetch client for this session.
	pub fn client(&self) -> &FetchClient<C> {
		&self.client
	}

	/// Liveness monitor owned by this session.
	pub fn monitor(&self) -> &LivenessMonitor {
		&self.monitor
	}

	/// Configuration the session was started with.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Maps the provider snapshot to a rendering status.
	pub fn status(&self) -> SessionStatus {
		let snapshot = self.identity.snapshot();

		if snapshot.is_loading {
			return SessionStatus::Loading;
		}
		if let Some(message) = snapshot.error {
			return SessionStatus::Failed(message);
		}

		match snapshot.user {
			Some(user) if snapshot.is_authenticated => SessionStatus::Authenticated(user),
			_ => SessionStatus::Anonymous,
		}
	}

	/// Starts an interactive login.
	pub fn login(&self) {
		self.identity.login_with_redirect();
	}

	/// Logs out, returning to the configured destination.
	pub fn logout(&self) {
		self.identity.logout(self.config.logout_options());
	}

	/// Swaps in a new identity provider instance, rebuilding the client's token accessor
	/// and re-arming the monitor.
	///
	/// On error the session stays bound to the current provider with its interval running.
	pub fn rebind(&mut self, identity: Arc<P>) -> Result<()> {
		if Arc::ptr_eq(&self.identity, &identity) {
			return Ok(());
		}

		let tokens = token_provider(&identity);
		let control: Arc<dyn SessionControl> = identity.clone();

		self.monitor.rearm(tokens.clone(), control)?;
		self.client = FetchClient::with_transport(tokens, Arc::clone(&self.client.transport));
		self.identity = identity;

		Ok(())
	}

	/// Ends the session's background work without logging out.
	pub fn close(mut self) {
		self.monitor.shutdown();
	}
}
impl<P, C> Debug for Session<P, C>
where
	P: 'static + IdentityProvider,
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("monitor", &self.monitor)
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

fn token_provider<P>(identity: &Arc<P>) -> AuthTokenProvider
where
	P: 'static + IdentityProvider,
{
	let source: Arc<dyn TokenSource> = identity.clone();

	AuthTokenProvider::new(source)
}
