//! Identity provider contracts and the [`AuthTokenProvider`] accessor shared by the fetch
//! client and the liveness monitor.
//!
//! The crate never talks to an identity provider directly. Applications implement
//! [`TokenSource`] (silent token access) and, where the session shell needs it,
//! [`SessionControl`] (interactive login, logout) on top of whichever SDK they use, then
//! hand the implementation to the crate behind an `Arc`.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenAcquisitionError},
};

/// Boxed future returned by [`TokenSource::get_access_token_silently`].
pub type TokenFuture<'a> =
	Pin<Box<dyn Future<Output = Result<AccessToken, TokenAcquisitionError>> + 'a + Send>>;

/// Silent token accessor exposed by an identity provider.
pub trait TokenSource
where
	Self: Send + Sync,
{
	/// Returns a currently valid access token without user interaction.
	///
	/// Implementations reject with [`TokenAcquisitionError`] when the session is invalid,
	/// the grant was revoked, or the provider cannot be reached. No retry is expected.
	fn get_access_token_silently(&self) -> TokenFuture<'_>;
}

/// Session lifecycle actions exposed by an identity provider.
pub trait SessionControl
where
	Self: Send + Sync,
{
	/// Starts an interactive login, typically by redirecting away from the app.
	fn login_with_redirect(&self);

	/// Ends the session, clearing local state and redirecting as configured.
	fn logout(&self, options: LogoutOptions);
}

/// Full identity provider surface consumed by [`Session`](crate::session::Session).
pub trait IdentityProvider
where
	Self: TokenSource + SessionControl,
{
	/// Returns the provider's current view of the session.
	fn snapshot(&self) -> SessionSnapshot;
}

/// Options forwarded to [`SessionControl::logout`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogoutOptions {
	/// Location the provider should return to after logging out.
	pub return_to: Option<Url>,
}
impl LogoutOptions {
	/// Sets the post-logout return location.
	pub fn with_return_to(mut self, url: Url) -> Self {
		self.return_to = Some(url);

		self
	}
}

/// Profile claims the identity provider knows about the signed-in user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
	/// Display name.
	pub name: Option<String>,
	/// Email address, when released by the provider.
	pub email: Option<String>,
	/// Subject identifier.
	pub sub: Option<String>,
}

/// Point-in-time view of the identity provider's session state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
	/// Provider is still resolving the session.
	pub is_loading: bool,
	/// A session is established.
	pub is_authenticated: bool,
	/// Signed-in user, when known.
	pub user: Option<IdentityUser>,
	/// Provider-level failure message, when the provider itself failed.
	pub error: Option<String>,
}

/// Stable handle over a [`TokenSource`], cheap to clone and share by reference.
///
/// Two handles are considered the same accessor when they wrap the same source
/// allocation; the liveness monitor uses that identity to decide when to re-arm.
#[derive(Clone)]
pub struct AuthTokenProvider {
	source: Arc<dyn TokenSource>,
}
impl AuthTokenProvider {
	/// Wraps an existing token source.
	pub fn new(source: Arc<dyn TokenSource>) -> Self {
		Self { source }
	}

	/// Builds a provider from an async closure.
	pub fn from_fn<F, Fut>(f: F) -> Self
	where
		F: 'static + Send + Sync + Fn() -> Fut,
		Fut: 'static + Send + Future<Output = Result<AccessToken, TokenAcquisitionError>>,
	{
		Self::new(Arc::new(FnTokenSource(f)))
	}

	/// Acquires a token from the underlying source, propagating its failure unchanged.
	pub async fn get_token(&self) -> Result<AccessToken, TokenAcquisitionError> {
		self.source.get_access_token_silently().await
	}

	/// Returns `true` when both handles wrap the same source allocation.
	pub fn same_source(&self, other: &Self) -> bool {
		std::ptr::addr_eq(Arc::as_ptr(&self.source), Arc::as_ptr(&other.source))
	}
}
impl Debug for AuthTokenProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("AuthTokenProvider(..)")
	}
}

struct FnTokenSource<F>(F);
impl<F, Fut> TokenSource for FnTokenSource<F>
where
	F: Send + Sync + Fn() -> Fut,
	Fut: 'static + Send + Future<Output = Result<AccessToken, TokenAcquisitionError>>,
{
	fn get_access_token_silently(&self) -> TokenFuture<'_> {
		Box::pin((self.0)())
	}
}
