//! Identity provider wiring and monitor settings.

// std
use std::net::IpAddr;
// self
use crate::{_prelude::*, auth::LogoutOptions, error::ConfigError};

/// Identity provider settings consumed by the application shell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityConfig {
	/// Tenant domain, e.g. `tenant.us.auth0.com`.
	pub domain: String,
	/// Public client identifier.
	pub client_id: String,
	/// Where the provider redirects after login.
	pub redirect_uri: Url,
}
impl IdentityConfig {
	/// Environment key holding the tenant domain.
	pub const DOMAIN_KEY: &'static str = "AUTH_DOMAIN";
	/// Environment key holding the client identifier.
	pub const CLIENT_ID_KEY: &'static str = "AUTH_CLIENT_ID";
	/// Environment key holding the redirect URI.
	pub const REDIRECT_URI_KEY: &'static str = "AUTH_REDIRECT_URI";

	/// Starts a validating builder.
	pub fn builder() -> IdentityConfigBuilder {
		IdentityConfigBuilder::default()
	}

	/// Loads the configuration from process environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads the configuration through an arbitrary key lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let required = |key: &'static str| {
			lookup(key)
				.filter(|value| !value.trim().is_empty())
				.ok_or(ConfigError::MissingValue { key })
		};
		let redirect_raw = required(Self::REDIRECT_URI_KEY)?;
		let redirect_uri =
			Url::parse(redirect_raw.trim()).map_err(|err| ConfigError::InvalidValue {
				key: Self::REDIRECT_URI_KEY,
				reason: err.to_string(),
			})?;

		Self::builder()
			.domain(required(Self::DOMAIN_KEY)?)
			.client_id(required(Self::CLIENT_ID_KEY)?)
			.redirect_uri(redirect_uri)
			.build()
	}

	/// Origin of the redirect URI, used as the default post-logout destination.
	pub fn origin(&self) -> Option<Url> {
		let origin = self.redirect_uri.origin();

		origin.is_tuple().then(|| Url::parse(&origin.ascii_serialization()).ok()).flatten()
	}
}

/// Builder for [`IdentityConfig`].
#[derive(Clone, Debug, Default)]
pub struct IdentityConfigBuilder {
	domain: Option<String>,
	client_id: Option<String>,
	redirect_uri: Option<Url>,
}
impl IdentityConfigBuilder {
	/// Sets the tenant domain.
	pub fn domain(mut self, domain: impl Into<String>) -> Self {
		self.domain = Some(domain.into());

		self
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the redirect URI.
	pub fn redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Validates and builds the configuration.
	pub fn build(self) -> Result<IdentityConfig, ConfigError> {
		let domain = self
			.domain
			.map(|value| value.trim().to_owned())
			.filter(|value| !value.is_empty())
			.ok_or(ConfigError::MissingValue { key: IdentityConfig::DOMAIN_KEY })?;

		if domain.contains("://") || domain.contains('/') {
			return Err(ConfigError::InvalidValue {
				key: IdentityConfig::DOMAIN_KEY,
				reason: "expected a bare host without scheme or path".into(),
			});
		}

		let client_id = self
			.client_id
			.map(|value| value.trim().to_owned())
			.filter(|value| !value.is_empty())
			.ok_or(ConfigError::MissingValue { key: IdentityConfig::CLIENT_ID_KEY })?;
		let redirect_uri = self
			.redirect_uri
			.ok_or(ConfigError::MissingValue { key: IdentityConfig::REDIRECT_URI_KEY })?;

		ensure_secure_redirect(&redirect_uri)?;

		Ok(IdentityConfig { domain, client_id, redirect_uri })
	}
}

/// Liveness monitor settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
	/// Time between session checks.
	pub interval: Duration,
	/// Post-logout destination passed to the identity provider.
	pub return_to: Option<Url>,
}
impl MonitorConfig {
	/// Default time between session checks.
	pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

	/// Overrides the check interval.
	pub fn with_interval(mut self, interval: Duration) -> Self {
		self.interval = interval;

		self
	}

	/// Overrides the post-logout destination.
	pub fn with_return_to(mut self, url: Url) -> Self {
		self.return_to = Some(url);

		self
	}

	/// Rejects a zero interval.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.interval.is_zero() {
			return Err(ConfigError::InvalidInterval);
		}

		Ok(())
	}

	/// Logout options derived from this configuration.
	pub fn logout_options(&self) -> LogoutOptions {
		LogoutOptions { return_to: self.return_to.clone() }
	}
}
impl Default for MonitorConfig {
	fn default() -> Self {
		Self { interval: Self::DEFAULT_INTERVAL, return_to: None }
	}
}

/// Complete settings for a [`Session`](crate::session::Session).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
	/// Identity provider settings.
	pub identity: IdentityConfig,
	/// Liveness monitor settings.
	pub monitor: MonitorConfig,
}
impl SessionConfig {
	/// Combines identity settings with the default monitor settings.
	///
	/// The monitor's post-logout destination defaults to the redirect URI's origin.
	pub fn new(identity: IdentityConfig) -> Self {
		let mut monitor = MonitorConfig::default();

		monitor.return_to = identity.origin();

		Self { identity, monitor }
	}

	/// Replaces the monitor settings.
	pub fn with_monitor(mut self, monitor: MonitorConfig) -> Self {
		self.monitor = monitor;

		self
	}

	/// Logout options used for user-initiated and forced logouts.
	pub fn logout_options(&self) -> LogoutOptions {
		self.monitor.logout_options()
	}
}

fn ensure_secure_redirect(url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		scheme => Err(ConfigError::InvalidValue {
			key: IdentityConfig::REDIRECT_URI_KEY,
			reason: format!("scheme `{scheme}` is not allowed outside localhost"),
		}),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.is_ok_and(|ip| ip.is_loopback()),
		None => false,
	}
}
