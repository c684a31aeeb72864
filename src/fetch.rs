//! Per-consumer fetch state machine.
//!
//! A [`FetchResource`] is owned by one UI unit for its whole lifetime. Each call to
//! [`FetchResource::fetch`] with a new `(url, options)` identity starts a lifecycle:
//!
//! 1. state becomes [`FetchStatus::Loading`] (data and error cleared);
//! 2. the returned [`FetchTask`] issues the request through the [`FetchClient`];
//! 3. the task settles the state with the decoded payload or the error.
//!
//! Every lifecycle carries a liveness flag. Starting a newer lifecycle, calling
//! [`FetchResource::teardown`], or dropping the resource clears it, and a settlement whose
//! flag is cleared is discarded without touching the state. The in-flight request itself
//! is not aborted.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	client::FetchClient,
	http::{HttpTransport, RequestOptions},
	obs::{self, Outcome, Stage, StageSpan},
	validate::ResponseDecoder,
};

/// Boxed future driving one fetch lifecycle; spawn it on the executor of your choice.
pub type FetchTask = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Callback invoked after every committed state change, while the new state is borrowed.
///
/// Listeners must not call back into the owning [`FetchResource`].
pub type StateListener<T> = Arc<dyn Fn(&FetchState<T>) + Send + Sync>;

/// Observable state of a fetch lifecycle.
#[derive(Clone, Debug)]
pub struct FetchState<T> {
	/// Decoded payload after a successful settlement.
	pub data: Option<T>,
	/// A lifecycle is in flight.
	pub is_loading: bool,
	/// Failure captured by the last settlement.
	pub error: Option<Arc<Error>>,
}
impl<T> FetchState<T> {
	/// State before any lifecycle started.
	pub const fn idle() -> Self {
		Self { data: None, is_loading: false, error: None }
	}

	/// State while a lifecycle is in flight.
	pub const fn loading() -> Self {
		Self { data: None, is_loading: true, error: None }
	}

	/// Settled state carrying a payload.
	pub const fn success(data: T) -> Self {
		Self { data: Some(data), is_loading: false, error: None }
	}

	/// Settled state carrying an error.
	pub fn failure(error: Error) -> Self {
		Self { data: None, is_loading: false, error: Some(Arc::new(error)) }
	}

	/// Classifies the state.
	pub fn status(&self) -> FetchStatus {
		if self.is_loading {
			FetchStatus::Loading
		} else if self.error.is_some() {
			FetchStatus::Error
		} else if self.data.is_some() {
			FetchStatus::Success
		} else {
			FetchStatus::Idle
		}
	}

	/// Message of the captured error, verbatim.
	pub fn error_message(&self) -> Option<String> {
		self.error.as_ref().map(|err| err.to_string())
	}
}
impl<T> Default for FetchState<T> {
	fn default() -> Self {
		Self::idle()
	}
}

/// Coarse lifecycle phase derived from a [`FetchState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchStatus {
	/// No lifecycle started yet.
	Idle,
	/// A lifecycle is in flight.
	Loading,
	/// Settled with a payload.
	Success,
	/// Settled with an error.
	Error,
}

struct Lifecycle {
	url: String,
	options: RequestOptions,
	live: Arc<AtomicBool>,
	abandoned: Arc<AtomicBool>,
}
impl Lifecycle {
	fn is_running(&self, url: &str, options: &RequestOptions) -> bool {
		self.url == url && &self.options == options && !self.abandoned.load(Ordering::Acquire)
	}
}

/// Flags its lifecycle as abandoned when the task is dropped before settling.
struct PendingTask {
	abandoned: Arc<AtomicBool>,
	settled: bool,
}
impl PendingTask {
	fn settle(mut self) {
		self.settled = true;
	}
}
impl Drop for PendingTask {
	fn drop(&mut self) {
		if !self.settled {
			self.abandoned.store(true, Ordering::Release);
		}
	}
}

/// Owner of one consumer's [`FetchState`] and its active lifecycle.
pub struct FetchResource<T, C>
where
	C: ?Sized + HttpTransport,
{
	client: FetchClient<C>,
	decoder: Arc<dyn ResponseDecoder<T>>,
	state: Arc<RwLock<FetchState<T>>>,
	listener: Option<StateListener<T>>,
	active: Option<Lifecycle>,
}
impl<T, C> FetchResource<T, C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates an idle resource that fetches through `client` and decodes with `decoder`.
	pub fn new<D>(client: FetchClient<C>, decoder: D) -> Self
	where
		D: 'static + ResponseDecoder<T>,
	{
		Self {
			client,
			decoder: Arc::new(decoder),
			state: Default::default(),
			listener: None,
			active: None,
		}
	}

	/// Registers a listener notified after every committed state change.
	pub fn with_listener<F>(mut self, listener: F) -> Self
	where
		F: 'static + Send + Sync + Fn(&FetchState<T>),
	{
		self.listener = Some(Arc::new(listener));

		self
	}

	/// Returns a copy of the current state.
	pub fn state(&self) -> FetchState<T>
	where
		T: Clone,
	{
		self.state.read().clone()
	}

	/// Classifies the current state without cloning the payload.
	pub fn status(&self) -> FetchStatus {
		self.state.read().status()
	}

	/// Runs `f` against the current state.
	pub fn with_state<R>(&self, f: impl FnOnce(&FetchState<T>) -> R) -> R {
		f(&self.state.read())
	}

	/// Returns `true` while a lifecycle is bound to this resource.
	pub fn is_active(&self) -> bool {
		self.active.is_some()
	}

	/// Starts a lifecycle for `(url, options)` unless the same identity is already active.
	///
	/// The state switches to loading before this returns. The returned task performs the
	/// request and settles the state; it must be driven to completion by the caller.
	/// Returns [`None`] when the identity is unchanged and its task is still held.
	///
	/// Dropping the task before it settles abandons the lifecycle, so a later call with the
	/// same identity starts over instead of leaving the state loading.
	#[must_use = "the state stays loading until the returned task is driven"]
	pub fn fetch(&mut self, url: impl Into<String>, options: RequestOptions) -> Option<FetchTask>
	where
		T: 'static + Send + Sync,
	{
		let url = url.into();

		if self.active.as_ref().is_some_and(|active| active.is_running(&url, &options)) {
			return None;
		}

		self.teardown();

		let live = Arc::new(AtomicBool::new(true));
		let abandoned = Arc::new(AtomicBool::new(false));

		commit(&self.state, self.listener.as_ref(), &live, FetchState::loading());

		self.active = Some(Lifecycle {
			url: url.clone(),
			options: options.clone(),
			live: Arc::clone(&live),
			abandoned: Arc::clone(&abandoned),
		});

		let pending = PendingTask { abandoned, settled: false };

		let client = self.client.clone();
		let decoder = Arc::clone(&self.decoder);
		let state = Arc::clone(&self.state);
		let listener = self.listener.clone();

		Some(Box::pin(async move {
			const STAGE: Stage = Stage::Lifecycle;

			let span = StageSpan::new(STAGE, "fetch");

			obs::record_outcome(STAGE, Outcome::Attempt);

			let next = match span.instrument(settle(&client, decoder.as_ref(), &url, options)).await
			{
				Ok(data) => FetchState::success(data),
				Err(err) => FetchState::failure(err),
			};
			let outcome = if next.error.is_some() { Outcome::Failure } else { Outcome::Success };

			if commit(&state, listener.as_ref(), &live, next) {
				obs::record_outcome(STAGE, outcome);
			} else {
				obs::settlement_discarded(&url);
				obs::record_outcome(STAGE, Outcome::Discarded);
			}

			pending.settle();
		}))
	}

	/// Starts a lifecycle and drives it to settlement on the current task.
	pub async fn load(&mut self, url: impl Into<String>, options: RequestOptions)
	where
		T: 'static + Send + Sync,
	{
		if let Some(task) = self.fetch(url, options) {
			task.await;
		}
	}

	/// Detaches the active lifecycle; its pending settlement will be discarded.
	pub fn teardown(&mut self) {
		if let Some(lifecycle) = self.active.take() {
			// Flip under the state lock so an in-progress commit either lands first or not at all.
			let _guard = self.state.write();

			lifecycle.live.store(false, Ordering::Release);
		}
	}
}
impl<T, C> Drop for FetchResource<T, C>
where
	C: ?Sized + HttpTransport,
{
	fn drop(&mut self) {
		self.teardown();
	}
}
impl<T, C> Debug for FetchResource<T, C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FetchResource")
			.field("status", &self.status())
			.field("active_url", &self.active.as_ref().map(|active| active.url.as_str()))
			.finish()
	}
}

async fn settle<T, C>(
	client: &FetchClient<C>,
	decoder: &dyn ResponseDecoder<T>,
	url: &str,
	options: RequestOptions,
) -> Result<T>
where
	C: ?Sized + HttpTransport,
{
	let response = client.request(url, options).await?;

	if !response.ok() {
		return Err(Error::HttpStatus { status: response.status });
	}

	let value = response.json()?;

	Ok(decoder.decode(value)?)
}

fn commit<T>(
	state: &RwLock<FetchState<T>>,
	listener: Option<&StateListener<T>>,
	live: &AtomicBool,
	next: FetchState<T>,
) -> bool {
	let mut guard = state.write();

	if !live.load(Ordering::Acquire) {
		return false;
	}

	*guard = next;

	if let Some(listener) = listener {
		listener(&*guard);
	}

	true
}
