//! Tower service wrapper around the dispatcher.
//!
//! Bus skeletons hold a [`ShellService`] per exported object and drive each
//! decoded call through [`Service::call`], so transport glue never touches the
//! facade directly.

use std::future::{Ready, ready};
use std::sync::Arc;
use std::task::{Context, Poll};

use shellface_proto::{CallError, CallRequest, CallerId, Reply};
use tower_service::Service;

use crate::core::ShellFacade;
use crate::dispatch::Dispatcher;

/// A call together with the identity of the caller that made it.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
	/// Transport identity of the caller.
	pub caller: CallerId,
	/// Decoded request.
	pub request: CallRequest,
}

impl Call {
	/// Builds a call.
	#[must_use]
	pub fn new(caller: CallerId, request: CallRequest) -> Self {
		Self { caller, request }
	}
}

/// Shell control service.
///
/// Cheap to clone; every clone routes to the same facade. Dispatch never
/// awaits, so the service is always ready and its futures resolve immediately.
#[derive(Debug, Clone)]
pub struct ShellService {
	dispatcher: Dispatcher,
}

impl ShellService {
	/// Creates a service over `facade`.
	#[must_use]
	pub fn new(facade: Arc<ShellFacade>) -> Self {
		Self {
			dispatcher: Dispatcher::new(facade),
		}
	}

	/// The facade behind the service.
	#[must_use]
	pub fn facade(&self) -> &Arc<ShellFacade> {
		self.dispatcher.facade()
	}

	/// Dispatches `call` synchronously.
	///
	/// # Errors
	///
	/// See [`Dispatcher::handle`].
	pub fn dispatch(&self, call: Call) -> Result<Reply, CallError> {
		self.dispatcher.handle(&call.caller, call.request)
	}
}

impl Service<Call> for ShellService {
	type Response = Reply;
	type Error = CallError;
	type Future = Ready<Result<Reply, CallError>>;

	fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, call: Call) -> Self::Future {
		ready(self.dispatch(call))
	}
}
