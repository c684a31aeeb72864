//! Application user lookup built on the schema-validating fetch path.
//!
//! [`UserProvider`] fetches the signed-in user's application record once per mount and
//! exposes a [`UserView`] for rendering. Consumers below the provider receive a
//! [`UserContext`] explicitly; asking for one without a provider is a wiring bug and
//! fails fast through [`use_user`].

// self
use crate::{
	_prelude::*,
	client::FetchClient,
	error::ConfigError,
	fetch::{FetchResource, FetchStatus, FetchTask},
	http::{HttpTransport, RequestOptions},
	validate::{Primitive, Schema, SchemaDecoder, Validated},
};

/// Application-side user record. Independent of the identity provider's profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationUser {
	/// Stable user identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Email address.
	pub email: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
}
impl ApplicationUser {
	/// `"<first> <last>"`.
	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}
impl Validated for ApplicationUser {
	fn schema() -> Schema {
		Schema::object()
			.field("id", Primitive::String)
			.field("name", Primitive::String)
			.field("email", Primitive::String)
			.field("firstName", Primitive::String)
			.field("lastName", Primitive::String)
	}
}

/// Value handed to consumers rendered under a [`UserProvider`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserContext {
	/// Validated application user, once loaded.
	pub application_user: Option<ApplicationUser>,
}
impl UserContext {
	/// Resolves the enclosing provider's context, or reports that there is none.
	pub fn from_scope(scope: Option<&Self>) -> Result<&Self, ConfigError> {
		scope.ok_or(ConfigError::OutsideUserProvider)
	}
}

/// Resolves the enclosing provider's context.
///
/// # Panics
///
/// Panics when `scope` is [`None`], i.e. the caller is not rendered under a
/// [`UserProvider`]. That is a wiring error, not a runtime condition.
#[track_caller]
pub fn use_user(scope: Option<&UserContext>) -> &UserContext {
	match UserContext::from_scope(scope) {
		Ok(context) => context,
		Err(err) => panic!("{err}"),
	}
}

/// What a [`UserProvider`] renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserView {
	/// The user record is being fetched.
	Loading,
	/// Fetching or validation failed.
	Failed {
		/// Error message, verbatim.
		message: String,
	},
	/// Children can render with this context.
	Ready(UserContext),
}
impl Display for UserView {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Loading => f.write_str("Loading user data..."),
			Self::Failed { message } => write!(f, "Error: {message}"),
			Self::Ready(context) => match &context.application_user {
				Some(user) => f.write_str(&user.full_name()),
				None => Ok(()),
			},
		}
	}
}

/// Fetches and exposes the application user for one mounted subtree.
pub struct UserProvider<C>
where
	C: ?Sized + HttpTransport,
{
	resource: FetchResource<ApplicationUser, C>,
	endpoint: Url,
}
impl<C> UserProvider<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates an unmounted provider reading the user from `endpoint`.
	pub fn new(client: &FetchClient<C>, endpoint: Url) -> Self {
		Self { resource: client.resource(SchemaDecoder::of::<ApplicationUser>()), endpoint }
	}

	/// Endpoint the provider reads from.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Starts the user fetch; returns [`None`] if it is already running or settled.
	#[must_use = "the view stays loading until the returned task is driven"]
	pub fn mount(&mut self) -> Option<FetchTask> {
		self.resource.fetch(self.endpoint.as_str(), RequestOptions::default())
	}

	/// Mounts and waits for the fetch to settle.
	pub async fn load(&mut self) {
		if let Some(task) = self.mount() {
			task.await;
		}
	}

	/// Current rendering decision.
	pub fn view(&self) -> UserView {
		self.resource.with_state(|state| match state.status() {
			FetchStatus::Loading => UserView::Loading,
			FetchStatus::Error =>
				UserView::Failed { message: state.error_message().unwrap_or_default() },
			FetchStatus::Idle | FetchStatus::Success =>
				UserView::Ready(UserContext { application_user: state.data.clone() }),
		})
	}

	/// Detaches the provider; an in-flight fetch will no longer update it.
	pub fn unmount(&mut self) {
		self.resource.teardown();
	}
}
impl<C> Debug for UserProvider<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserProvider")
			.field("endpoint", &self.endpoint.as_str())
			.field("resource", &self.resource)
			.finish()
	}
}
