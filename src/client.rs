//! Token-gated request decorator.
//!
//! [`FetchClient::request`] wraps one [`HttpTransport`] call. Unless the caller opts out
//! with [`RequestOptions::skip_auth`], it first acquires a token through the shared
//! [`AuthTokenProvider`] and merges `Authorization: Bearer <token>` into the caller's
//! headers. A token failure short-circuits before any HTTP traffic and is returned to the
//! caller unchanged.

// self
use crate::{
	_prelude::*,
	auth::AuthTokenProvider,
	error::ConfigError,
	fetch::FetchResource,
	http::{AUTHORIZATION, HttpRequest, HttpTransport, RawResponse, RequestOptions},
	obs::{self, Outcome, Stage, StageSpan},
	validate::ResponseDecoder,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Fetch client specialized for the crate's default reqwest transport.
pub type ReqwestFetchClient = FetchClient<ReqwestTransport>;

/// Stateless service that issues token-gated requests.
///
/// Clones share the same token provider and transport, so a single client can be handed
/// to any number of fetch lifecycles without coordination.
pub struct FetchClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Token accessor consulted before every authenticated request.
	pub tokens: AuthTokenProvider,
	/// Transport that performs the HTTP round trip.
	pub transport: Arc<C>,
}
impl<C> FetchClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client over an already shared transport.
	pub fn with_transport(tokens: AuthTokenProvider, transport: Arc<C>) -> Self {
		Self { tokens, transport }
	}

	/// Creates a client that takes ownership of `transport`.
	pub fn from_transport(tokens: AuthTokenProvider, transport: C) -> Self
	where
		C: Sized,
	{
		Self::with_transport(tokens, Arc::new(transport))
	}

	/// Issues a request to `url`, attaching a bearer token unless `options.skip_auth` is set.
	///
	/// Caller headers are preserved; a caller-supplied `Authorization` header (any case) is
	/// replaced by the derived one. Token failures are returned as [`Error::Token`] carrying
	/// the provider's original error, and no request is sent.
	pub async fn request(&self, url: &str, options: RequestOptions) -> Result<RawResponse> {
		const STAGE: Stage = Stage::Request;

		let span = StageSpan::new(STAGE, "request");

		obs::record_outcome(STAGE, Outcome::Attempt);

		let result = span
			.instrument(async move {
				let url = Url::parse(url)
					.map_err(|source| ConfigError::InvalidUrl { url: url.to_owned(), source })?;
				let RequestOptions { method, mut headers, body, skip_auth } = options;

				if !skip_auth {
					let token = self.tokens.get_token().await.inspect_err(obs::token_failure)?;

					headers.retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION));
					headers.insert(AUTHORIZATION.into(), token.bearer());
				}

				let response =
					self.transport.send(HttpRequest { url, method, headers, body }).await?;

				Ok::<_, Error>(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_outcome(STAGE, Outcome::Success),
			Err(_) => obs::record_outcome(STAGE, Outcome::Failure),
		}

		result
	}

	/// Creates a fetch lifecycle owner bound to this client.
	pub fn resource<T, D>(&self, decoder: D) -> FetchResource<T, C>
	where
		D: 'static + ResponseDecoder<T>,
	{
		FetchResource::new(self.clone(), decoder)
	}
}
#[cfg(feature = "reqwest")]
impl FetchClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(tokens: AuthTokenProvider) -> Self {
		Self::from_transport(tokens, ReqwestTransport::default())
	}
}
impl<C> Clone for FetchClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { tokens: self.tokens.clone(), transport: Arc::clone(&self.transport) }
	}
}
impl<C> Debug for FetchClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FetchClient").field("tokens", &self.tokens).finish_non_exhaustive()
	}
}
