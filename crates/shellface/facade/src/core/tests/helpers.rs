//! Common test utilities and helpers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use shellface_proto::{Accelerator, CallRequest, CallResult, CallerId, GrabToken, Value};

use crate::adapters::{
	AcceleratorAdapter, AdapterError, Adapters, KeyboardAdapter, OsdAdapter, OsdRequest, OverviewAdapter,
};
use crate::core::{ExtensionRecord, ShellFacade, ShellIdentity, ShellState};
use crate::dispatch::Dispatcher;
use crate::signals::{ShellSignal, SignalEmitter, SignalReceiver};

/// Observable side of the mock adapters.
#[derive(Debug, Default)]
pub struct Probe {
	pub overview_visible: AtomicBool,
	pub overview_calls: AtomicUsize,
	pub fail_overview: AtomicBool,
	pub osk_calls: AtomicUsize,
	pub fail_osk: AtomicBool,
	pub reject_grabs: AtomicBool,
	pub grabbed: Mutex<Vec<(GrabToken, Accelerator)>>,
	pub released: Mutex<Vec<GrabToken>>,
	pub osd: Mutex<Vec<OsdRequest>>,
}

impl Probe {
	fn unavailable(subsystem: &'static str) -> AdapterError {
		AdapterError::Unavailable {
			subsystem,
			reason: "injected failure".to_string(),
		}
	}
}

struct MockOverview(Arc<Probe>);

impl OverviewAdapter for MockOverview {
	fn show(&self) -> Result<(), AdapterError> {
		self.0.overview_calls.fetch_add(1, Ordering::SeqCst);
		if self.0.fail_overview.load(Ordering::SeqCst) {
			return Err(Probe::unavailable("overview"));
		}
		self.0.overview_visible.store(true, Ordering::SeqCst);
		Ok(())
	}

	fn hide(&self) -> Result<(), AdapterError> {
		self.0.overview_calls.fetch_add(1, Ordering::SeqCst);
		if self.0.fail_overview.load(Ordering::SeqCst) {
			return Err(Probe::unavailable("overview"));
		}
		self.0.overview_visible.store(false, Ordering::SeqCst);
		Ok(())
	}

	fn is_visible(&self) -> bool {
		self.0.overview_visible.load(Ordering::SeqCst)
	}
}

struct MockKeyboard(Arc<Probe>);

impl KeyboardAdapter for MockKeyboard {
	fn set_visible(&self, _visible: bool) -> Result<(), AdapterError> {
		self.0.osk_calls.fetch_add(1, Ordering::SeqCst);
		if self.0.fail_osk.load(Ordering::SeqCst) {
			return Err(Probe::unavailable("keyboard"));
		}
		Ok(())
	}
}

struct MockAccelerators(Arc<Probe>);

impl AcceleratorAdapter for MockAccelerators {
	fn grab(&self, accelerator: &Accelerator, token: GrabToken) -> Result<(), AdapterError> {
		if self.0.reject_grabs.load(Ordering::SeqCst) {
			return Err(AdapterError::InvalidBinding(accelerator.to_string()));
		}
		self.0.grabbed.lock().push((token, accelerator.clone()));
		Ok(())
	}

	fn ungrab(&self, token: GrabToken) -> Result<(), AdapterError> {
		self.0.released.lock().push(token);
		Ok(())
	}
}

struct MockOsd(Arc<Probe>);

impl OsdAdapter for MockOsd {
	fn show(&self, request: &OsdRequest) -> Result<(), AdapterError> {
		self.0.osd.lock().push(request.clone());
		Ok(())
	}
}

/// A facade wired to mock adapters, with its signal queue exposed.
pub struct Harness {
	pub facade: Arc<ShellFacade>,
	pub dispatcher: Dispatcher,
	pub probe: Arc<Probe>,
	pub signals: SignalReceiver,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_extensions(Vec::new())
	}

	pub fn with_extensions(extensions: Vec<ExtensionRecord>) -> Self {
		let probe = Arc::new(Probe::default());
		let adapters = Adapters {
			overview: Box::new(MockOverview(probe.clone())),
			keyboard: Box::new(MockKeyboard(probe.clone())),
			accelerators: Box::new(MockAccelerators(probe.clone())),
			osd: Box::new(MockOsd(probe.clone())),
		};
		let (emitter, signals) = SignalEmitter::channel();
		let identity = ShellIdentity {
			shell_version: "46.0".to_string(),
			mode: "user".to_string(),
			keyboard_name: "shellface".to_string(),
		};
		let facade = Arc::new(ShellFacade::new(
			ShellState::new(extensions, true),
			adapters,
			emitter,
			identity,
		));
		Self {
			dispatcher: Dispatcher::new(facade.clone()),
			facade,
			probe,
			signals,
		}
	}

	/// Dispatches a call from `caller`.
	pub fn call(&self, caller: &str, interface: &str, method: &str, args: Vec<Value>) -> CallResult {
		self.dispatcher
			.handle(&CallerId::new(caller), CallRequest::new(interface, method, args))
	}

	/// Takes every queued signal.
	pub fn drain(&mut self) -> Vec<ShellSignal> {
		std::iter::from_fn(|| self.signals.try_recv().ok()).collect()
	}
}

pub fn extension(uuid: &str, enabled: bool) -> ExtensionRecord {
	ExtensionRecord {
		uuid: uuid.to_string(),
		name: uuid.split('@').next().unwrap_or(uuid).to_string(),
		description: String::new(),
		enabled,
	}
}

pub fn grab_args(binding: &str, mode_flags: u32) -> Vec<Value> {
	vec![Value::from(binding), Value::U32(mode_flags), Value::U32(0)]
}

/// Token carried by a successful grab reply.
pub fn token_of(result: CallResult) -> u32 {
	result
		.expect("grab should succeed")
		.first()
		.and_then(Value::as_u32)
		.expect("grab reply carries a u32")
}
