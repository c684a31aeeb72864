//! In-process mock backend for development and tests.
//!
//! [`MockUserBackend`] answers `GET <base>/user` by reading the `email` claim from the
//! bearer token's (unsigned) JWT payload and returning the matching seeded
//! [`ApplicationUser`]. Signatures are not checked.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	http::{HttpRequest, HttpTransport, Method, RawResponse, TransportFuture},
	user::ApplicationUser,
};

const EMAIL_CLAIM: &str = "email";

/// Builds an unsigned JWT (`alg: none`) carrying `claims`.
pub fn unsigned_jwt(claims: &Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

	format!("{header}.{payload}.")
}

/// Decodes the payload segment of a JWT without verifying it.
pub fn decode_claims(token: &str) -> Option<Value> {
	let payload = token.split('.').nth(1)?;
	let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;

	serde_json::from_slice(&bytes).ok()
}

/// Users seeded into a default [`MockUserBackend`].
pub fn seeded_users() -> Vec<ApplicationUser> {
	vec![
		ApplicationUser {
			id: "c7b3d8e0-5e0b-4b0f-8b3a-3b9f4b303b3d".into(),
			name: "John Maverick".into(),
			email: "john.maverick@example.com".into(),
			first_name: "John".into(),
			last_name: "Maverick".into(),
		},
		ApplicationUser {
			id: "c7b3d8e0-5e0b-4b0f-8b3a-3b9f4b3d3b31".into(),
			name: "Jane Doe".into(),
			email: "jane.doe@example.com".into(),
			first_name: "Jane".into(),
			last_name: "Doe".into(),
		},
	]
}

/// Mock transport serving the `/user` endpoint.
#[derive(Clone, Debug)]
pub struct MockUserBackend {
	base: Url,
	users: Arc<Vec<ApplicationUser>>,
	requests: Arc<Mutex<Vec<HttpRequest>>>,
}
impl MockUserBackend {
	/// Creates a backend rooted at `base` with the default seed users.
	pub fn new(base: Url) -> Self {
		Self::with_users(base, seeded_users())
	}

	/// Creates a backend rooted at `base` serving `users`.
	pub fn with_users(base: Url, users: Vec<ApplicationUser>) -> Self {
		Self { base, users: Arc::new(users), requests: Default::default() }
	}

	/// Absolute URL of the user endpoint.
	pub fn user_endpoint(&self) -> Url {
		let mut url = self.base.clone();

		url.set_path("/user");

		url
	}

	/// Requests observed so far.
	pub fn requests(&self) -> Vec<HttpRequest> {
		self.requests.lock().clone()
	}

	fn respond(&self, request: &HttpRequest) -> RawResponse {
		if request.method != Method::Get
			|| request.url.origin() != self.base.origin()
			|| request.url.path() != "/user"
		{
			return RawResponse::json_body(404, &json!({ "error": "Not Found" }));
		}

		let user = request
			.header("Authorization")
			.and_then(|value| value.strip_prefix("Bearer "))
			.and_then(decode_claims)
			.and_then(|claims| claims.get(EMAIL_CLAIM).and_then(Value::as_str).map(str::to_owned))
			.and_then(|email| self.users.iter().find(|user| user.email == email));

		match user.map(serde_json::to_value) {
			Some(Ok(body)) => RawResponse::json_body(200, &body),
			_ => RawResponse::json_body(401, &json!({ "error": "Unauthorized" })),
		}
	}
}
impl HttpTransport for MockUserBackend {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let response = self.respond(&request);

			self.requests.lock().push(request);

			Ok(response)
		})
	}
}
