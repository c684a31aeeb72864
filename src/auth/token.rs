//! Access token wrapper and the token acquisition failure raised by identity providers.

// self
use crate::_prelude::*;

/// Redacted bearer token keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);
impl AccessToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the token as an `Authorization` header value.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl AsRef<str> for AccessToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<&str> for AccessToken {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for AccessToken {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
impl Display for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Coarse reason reported by the identity provider when it refuses a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenErrorKind {
	/// The user must sign in interactively.
	LoginRequired,
	/// The user must grant consent interactively.
	ConsentRequired,
	/// The session or refresh grant expired or was revoked.
	SessionExpired,
	/// The provider could not be reached.
	Network,
	/// Any other provider-side failure.
	Other,
}
impl TokenErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::LoginRequired => "login_required",
			Self::ConsentRequired => "consent_required",
			Self::SessionExpired => "session_expired",
			Self::Network => "network",
			Self::Other => "other",
		}
	}
}
impl Display for TokenErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Raised when the identity provider rejects a silent token request.
///
/// The value travels unchanged from the provider to the fetch caller, so equality
/// checks can confirm a failure was propagated rather than rewrapped.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct TokenAcquisitionError {
	/// Provider-reported reason.
	pub kind: TokenErrorKind,
	/// Provider-supplied message, surfaced verbatim to the UI.
	pub message: String,
}
impl TokenAcquisitionError {
	/// Creates a new error with the provided kind and message.
	pub fn new(kind: TokenErrorKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into() }
	}

	/// Shorthand for a [`TokenErrorKind::LoginRequired`] failure.
	pub fn login_required(message: impl Into<String>) -> Self {
		Self::new(TokenErrorKind::LoginRequired, message)
	}

	/// Shorthand for a [`TokenErrorKind::SessionExpired`] failure.
	pub fn session_expired(message: impl Into<String>) -> Self {
		Self::new(TokenErrorKind::SessionExpired, message)
	}
}
