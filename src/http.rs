//! Transport primitives for token-gated requests.
//!
//! The module exposes [`HttpTransport`] alongside the request and response shapes it
//! consumes, so applications can plug in any HTTP stack (or an in-process fake) without
//! touching the fetch client. [`ReqwestTransport`] is the default implementation.

// self
use crate::{_prelude::*, error::TransportError, validate::ValidationError};

/// Header name carrying the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a single request.
///
/// Implementations must not retry or cache; the fetch client relies on exactly one
/// round trip per call.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and resolves once the full response body is available.
	fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// HTTP verbs supported by [`RequestOptions`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	#[default]
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `HEAD`
	Head,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
			Self::Head => "HEAD",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Caller-supplied request options.
///
/// Options take part in the identity of a fetch lifecycle, so they compare by value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
	/// HTTP verb; defaults to `GET`.
	pub method: Method,
	/// Header name to value mapping sent as-is, plus the derived `Authorization` header.
	pub headers: BTreeMap<String, String>,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	/// Skips token acquisition and leaves the headers untouched.
	pub skip_auth: bool,
}
impl RequestOptions {
	/// Creates default options (`GET`, no headers, authenticated).
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the HTTP verb.
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;

		self
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Sets the request body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `value` as the JSON body and sets `Content-Type` accordingly.
	pub fn json<T>(self, value: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(value)?;

		Ok(self.header("Content-Type", "application/json").body(body))
	}

	/// Overrides the skip-auth flag.
	pub fn skip_auth(mut self, skip: bool) -> Self {
		self.skip_auth = skip;

		self
	}
}

/// Fully prepared request handed to an [`HttpTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
	/// Target URL.
	pub url: Url,
	/// HTTP verb.
	pub method: Method,
	/// Final header set.
	pub headers: BTreeMap<String, String>,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl HttpRequest {
	/// Looks a header up by name, ignoring ASCII case.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Response surface consumed by the fetch state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers (lower-cased names).
	pub headers: BTreeMap<String, String>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Creates a response with the provided status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Creates a JSON response by serializing `value`.
	pub fn json_body(status: u16, value: &Value) -> Self {
		let mut response = Self::new(status, value.to_string());

		response.headers.insert("content-type".into(), "application/json".into());

		response
	}

	/// Returns `true` when the status is within `200..=299`.
	pub fn ok(&self) -> bool {
		(200..=299).contains(&self.status)
	}

	/// Parses the body as JSON.
	pub fn json(&self) -> Result<Value, ValidationError> {
		serde_json::from_slice(&self.body).map_err(ValidationError::malformed_json)
	}
}

/// Thin wrapper around [`ReqwestClient`] implementing [`HttpTransport`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Patch => reqwest::Method::PATCH,
				Method::Delete => reqwest::Method::DELETE,
				Method::Head => reqwest::Method::HEAD,
			};
			let mut builder = client.request(method, request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(RawResponse { status, headers, body })
		})
	}
}
