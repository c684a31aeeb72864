//! Crate-level error types shared by the fetch client, state machine, and monitor.

// self
use crate::{_prelude::*, auth::TokenAcquisitionError, validate::ValidationError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every runtime failure of a fetch lifecycle lands in the same [`Error`] slot of a
/// [`FetchState`](crate::fetch::FetchState); callers that need the cause can match on the
/// variant, while UI code only needs the display message.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The identity provider refused to issue a token.
	#[error(transparent)]
	Token(#[from] TokenAcquisitionError),
	/// Response status fell outside `200..=299`.
	#[error("HTTP error! status: {status}")]
	HttpStatus {
		/// Numeric status code returned by the server.
		status: u16,
	},
	/// Response payload failed JSON parsing or schema validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Underlying transport failed before a response was produced.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns the HTTP status code when the error came from a non-success response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::HttpStatus { status } => Some(*status),
			_ => None,
		}
	}

	/// Returns the token acquisition failure when the error originated there.
	pub fn as_token_error(&self) -> Option<&TokenAcquisitionError> {
		match self {
			Self::Token(err) => Some(err),
			_ => None,
		}
	}
}

/// Configuration and precondition failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Request URL could not be parsed.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// Raw URL supplied by the caller.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A required configuration value was absent.
	#[error("Configuration value `{key}` is missing.")]
	MissingValue {
		/// Configuration key that was not supplied.
		key: &'static str,
	},
	/// A configuration value was present but malformed.
	#[error("Configuration value `{key}` is invalid: {reason}.")]
	InvalidValue {
		/// Configuration key that failed validation.
		key: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// Monitor interval must be strictly positive.
	#[error("Liveness monitor interval must be greater than zero.")]
	InvalidInterval,
	/// No Tokio runtime is available to drive the liveness monitor.
	#[error("Liveness monitor requires a running Tokio runtime.")]
	NoRuntime,
	/// User context was requested without an enclosing user provider.
	#[error("use_user must be called within a UserProvider")]
	OutsideUserProvider,
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported an error value; its message is kept verbatim.
	#[error("{source}")]
	Network {
		/// Transport-specific error.
		source: BoxError,
	},
	/// The transport failed without producing an error value.
	#[error("An error occurred")]
	Opaque,
}
impl TransportError {
	/// Wraps a transport-specific error, preserving its message.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a bare message as a transport error.
	pub fn message(message: impl Into<String>) -> Self {
		let message: String = message.into();

		Self::Network { source: message.into() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
