//! Shared facade state and the effects that mutate it.
//!
//! # Purpose
//!
//! - Own the single [`ShellState`] of the process and the capability adapters that act on the real shell.
//! - Provide the atomic "call adapter, then record outcome" operations the [`Dispatcher`] routes to.
//! - Exclude decoding, routing and reply shaping; see [`crate::dispatch`].
//!
//! # Mental model
//!
//! - [`ShellFacade`] is built once at startup and shared as `Arc<ShellFacade>`; nothing reaches it through globals.
//! - Every read or write of shell state takes one `parking_lot::Mutex`. Adapter calls happen under that lock so the
//!   recorded state always matches the adapter's reported outcome. Adapters are non-blocking by contract.
//! - Operations return transitions (`Some(new)` / `None`) instead of emitting signals; the dispatcher queues signals
//!   after it has built the reply.
//! - Caller disconnects arrive from the bus watcher and release all grabs of that caller under the same lock.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints | Constructed / mutated in |
//! |---|---|---|---|
//! | [`ShellFacade`] | Process-wide facade handle | MUST be the only owner of [`ShellState`] | `ShellFacade::new` |
//! | [`ShellState`] | Overview/OSK flags, grabs, extensions | MUST only be touched under the facade lock | `ShellFacade::*` |
//! | [`AcceleratorGrab`] | One active grab | MUST be unique per normalized binding | `ShellFacade::grab`, `ShellFacade::ungrab` |
//! | [`GrabToken`] | Action id of a grab | MUST never be reused within the process | `ShellFacade::allocate_token` |
//!
//! # Invariants
//!
//! 1. At most one grab exists per normalized binding.
//!    - Enforced in: `ShellState::insert_grab`, `ShellFacade::grab`
//!    - Tested by: `core::tests::grabs::second_grab_of_same_binding_is_rejected`
//!    - Failure symptom: two clients receive activations for one key press.
//!
//! 2. Grab tokens are never reused and never zero.
//!    - Enforced in: `ShellFacade::allocate_token`
//!    - Tested by: `core::tests::grabs::tokens_are_not_reused_after_ungrab`
//!    - Failure symptom: a stale client ungrabs another client's binding.
//!
//! 3. A disconnected caller holds no grabs, including grabs that raced its disconnect.
//!    - Enforced in: `ShellFacade::caller_disconnected`, `ShellFacade::grab`
//!    - Tested by: `core::tests::grabs::disconnect_releases_grabs`, `core::tests::grabs::grab_after_disconnect_is_refused`
//!    - Failure symptom: a key stays swallowed after its client exits.
//!
//! 4. Shell state only changes after the adapter reports success.
//!    - Enforced in: `ShellFacade::set_overview`, `ShellFacade::set_osk`, `ShellFacade::grab`
//!    - Tested by: `core::tests::overview::adapter_failure_leaves_state_untouched`
//!    - Failure symptom: `OverviewActive` reports true while nothing is shown.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use shellface_proto::{Accelerator, ActionMode, CallError, CallerId, ErrorKind, GrabToken, Value};

use crate::adapters::{Adapters, CommandKeyboard, CommandOsd, CommandOverview, KeybindingTable, OsdRequest};
use crate::config::Config;
use crate::signals::SignalEmitter;

mod state;

pub use state::{AcceleratorGrab, ExtensionRecord, ShellState};

#[cfg(doc)]
use crate::dispatch::Dispatcher;

/// Extension state value for an enabled extension.
const EXTENSION_STATE_ENABLED: f64 = 1.0;
/// Extension state value for a disabled extension.
const EXTENSION_STATE_DISABLED: f64 = 2.0;
/// Extension type value for system-provided extensions.
const EXTENSION_TYPE_SYSTEM: f64 = 1.0;

/// Static identity reported through read-only properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellIdentity {
	/// `ShellVersion`
	pub shell_version: String,
	/// `Mode`
	pub mode: String,
	/// Caribou `Name`
	pub keyboard_name: String,
}

/// Input device context of an accelerator activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationContext {
	/// Source input device id.
	pub device_id: u32,
	/// Event timestamp in milliseconds.
	pub timestamp: u32,
}

/// Outcome of an ungrab request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UngrabOutcome {
	/// The grab was released.
	Released,
	/// No grab exists for the token.
	Absent,
	/// The grab belongs to another caller and was left in place.
	NotOwner,
}

/// Outcome of enabling or disabling an extension.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionToggle {
	/// No extension has the uuid.
	Unknown,
	/// The extension was already in the requested state.
	Unchanged,
	/// The state changed; carries the new info dictionary.
	Changed(BTreeMap<String, Value>),
}

/// Process-wide facade handle.
#[derive(Debug)]
pub struct ShellFacade {
	state: Mutex<ShellState>,
	adapters: Adapters,
	signals: SignalEmitter,
	identity: ShellIdentity,
	next_token: AtomicU32,
}

impl ShellFacade {
	/// Creates the facade.
	#[must_use]
	pub fn new(state: ShellState, adapters: Adapters, signals: SignalEmitter, identity: ShellIdentity) -> Self {
		Self {
			state: Mutex::new(state),
			adapters,
			signals,
			identity,
			next_token: AtomicU32::new(1),
		}
	}

	/// Creates a facade from configuration, using the command-backed adapters
	/// and the in-memory keybinding table.
	#[must_use]
	pub fn from_config(config: &Config, signals: SignalEmitter) -> Self {
		let adapters = Adapters {
			overview: Box::new(CommandOverview::new(
				config.overview.show.clone(),
				config.overview.hide.clone(),
			)),
			keyboard: Box::new(CommandKeyboard::new(
				config.keyboard.show.clone(),
				config.keyboard.hide.clone(),
			)),
			accelerators: Box::new(KeybindingTable::new()),
			osd: Box::new(CommandOsd::new(config.osd.command.clone())),
		};
		let extensions = config.extensions.iter().map(|ext| ExtensionRecord {
			uuid: ext.uuid.clone(),
			name: ext.name.clone().unwrap_or_else(|| ext.uuid.clone()),
			description: ext.description.clone(),
			enabled: ext.enabled,
		});
		let identity = ShellIdentity {
			shell_version: config.service.shell_version.clone(),
			mode: config.service.mode.clone(),
			keyboard_name: config.service.keyboard_name.clone(),
		};
		Self::new(
			ShellState::new(extensions, config.service.user_extensions_enabled),
			adapters,
			signals,
			identity,
		)
	}

	/// Signal queue used for transition notifications.
	#[must_use]
	pub fn signals(&self) -> &SignalEmitter {
		&self.signals
	}

	/// Bus-visible identity.
	#[must_use]
	pub fn identity(&self) -> &ShellIdentity {
		&self.identity
	}

	/// Whether the overview is visible.
	#[must_use]
	pub fn overview_visible(&self) -> bool {
		self.state.lock().overview_visible()
	}

	/// Whether the on-screen keyboard is visible.
	#[must_use]
	pub fn osk_visible(&self) -> bool {
		self.state.lock().osk_visible()
	}

	/// Whether user extensions are globally enabled.
	#[must_use]
	pub fn user_extensions_enabled(&self) -> bool {
		self.state.lock().user_extensions_enabled()
	}

	/// Number of active grabs.
	#[must_use]
	pub fn grab_count(&self) -> usize {
		self.state.lock().grab_count()
	}

	/// Shows or hides the overview.
	///
	/// Returns `Some(visible)` when the recorded state changed.
	///
	/// # Errors
	///
	/// Adapter failures, mapped through [`CallError::from`].
	pub fn set_overview(&self, visible: bool) -> Result<Option<bool>, CallError> {
		let mut state = self.state.lock();
		let overview = &self.adapters.overview;
		if visible {
			overview.show()?;
		} else {
			overview.hide()?;
		}
		let now = overview.is_visible();
		let before = state.set_overview_visible(now);
		Ok((before != now).then_some(now))
	}

	/// Shows or hides the on-screen keyboard.
	///
	/// Returns `Some(visible)` when the recorded state changed.
	///
	/// # Errors
	///
	/// Adapter failures, mapped through [`CallError::from`].
	pub fn set_osk(&self, visible: bool) -> Result<Option<bool>, CallError> {
		let mut state = self.state.lock();
		self.adapters.keyboard.set_visible(visible)?;
		let before = state.set_osk_visible(visible);
		Ok((before != visible).then_some(visible))
	}

	/// Shows an OSD popup.
	///
	/// # Errors
	///
	/// Adapter failures, mapped through [`CallError::from`].
	pub fn show_osd(&self, request: &OsdRequest) -> Result<(), CallError> {
		self.adapters.osd.show(request)?;
		Ok(())
	}

	fn allocate_token(&self) -> Result<GrabToken, CallError> {
		self.next_token
			.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
			.map(GrabToken)
			.map_err(|_| CallError::new(ErrorKind::SubsystemUnavailable, "grab token space exhausted"))
	}

	/// Grabs `binding` for `caller`.
	///
	/// # Errors
	///
	/// - `AlreadyGrabbed` if another grab holds the binding.
	/// - `SubsystemUnavailable` if `caller` already left the bus or the adapter fails.
	/// - `InvalidArgument` if the adapter rejects the binding.
	pub fn grab(
		&self,
		caller: &CallerId,
		binding: Accelerator,
		mode_flags: ActionMode,
		grab_flags: u32,
	) -> Result<GrabToken, CallError> {
		let mut state = self.state.lock();
		if state.has_departed(caller) {
			return Err(CallError::new(
				ErrorKind::SubsystemUnavailable,
				format!("caller {caller} has disconnected"),
			));
		}
		if let Some(holder) = state.grab_for(&binding) {
			tracing::debug!(%binding, owner = %holder.owner, %caller, "accelerator already grabbed");
			return Err(CallError::new(
				ErrorKind::AlreadyGrabbed,
				format!("{binding} is already grabbed"),
			));
		}

		let token = self.allocate_token()?;
		self.adapters.accelerators.grab(&binding, token)?;
		tracing::debug!(%binding, %caller, token = token.0, "accelerator grabbed");
		state.insert_grab(AcceleratorGrab {
			binding,
			owner: caller.clone(),
			token,
			mode_flags,
			grab_flags,
		});
		Ok(token)
	}

	/// Releases `token` on behalf of `caller`.
	pub fn ungrab(&self, caller: &CallerId, token: GrabToken) -> UngrabOutcome {
		let mut state = self.state.lock();
		match state.grab_by_token(token) {
			None => return UngrabOutcome::Absent,
			Some(grab) if &grab.owner != caller => {
				tracing::debug!(token = token.0, owner = %grab.owner, %caller, "ungrab by non-owner ignored");
				return UngrabOutcome::NotOwner;
			}
			Some(_) => {}
		}
		if let Some(grab) = state.remove_grab(token) {
			self.release_in_adapter(&grab);
		}
		UngrabOutcome::Released
	}

	fn release_in_adapter(&self, grab: &AcceleratorGrab) {
		if let Err(e) = self.adapters.accelerators.ungrab(grab.token) {
			tracing::warn!(binding = %grab.binding, token = grab.token.0, error = %e, "adapter failed to release grab");
		}
	}

	/// Releases every grab held by a caller that left the bus.
	///
	/// Returns the number of grabs released.
	pub fn caller_disconnected(&self, caller: &CallerId) -> usize {
		let mut state = self.state.lock();
		state.mark_departed(caller.clone());
		let released = state.remove_grabs_for(caller);
		for grab in &released {
			self.release_in_adapter(grab);
		}
		if !released.is_empty() {
			tracing::info!(%caller, count = released.len(), "released grabs of disconnected caller");
		}
		released.len()
	}

	/// Reports a key press matching `binding`.
	///
	/// Queues `AcceleratorActivated` when a grab holds the binding and its mode
	/// flags admit the current action mode. Returns whether a signal was queued.
	pub fn activate_accelerator(&self, binding: &Accelerator, context: ActivationContext) -> bool {
		let (token, mode) = {
			let state = self.state.lock();
			let Some(grab) = state.grab_for(binding) else {
				return false;
			};
			let mode = state.action_mode();
			if !grab.mode_flags.intersects(mode) {
				tracing::trace!(%binding, ?mode, flags = ?grab.mode_flags, "activation outside grab modes");
				return false;
			}
			(grab.token, mode)
		};

		let parameters = BTreeMap::from([
			("device-id".to_string(), Value::U32(context.device_id)),
			("timestamp".to_string(), Value::U32(context.timestamp)),
			("action-mode".to_string(), Value::U32(mode.bits())),
		]);
		self.signals
			.notify_accelerator_activated(binding.clone(), token, parameters);
		true
	}

	/// Info dictionaries of all extensions keyed by uuid.
	#[must_use]
	pub fn list_extensions(&self) -> BTreeMap<String, BTreeMap<String, Value>> {
		self.state
			.lock()
			.extensions()
			.map(|ext| (ext.uuid.clone(), extension_info(ext)))
			.collect()
	}

	/// Info dictionary of one extension, empty for an unknown uuid.
	#[must_use]
	pub fn extension_info(&self, uuid: &str) -> BTreeMap<String, Value> {
		self.state
			.lock()
			.extension(uuid)
			.map(extension_info)
			.unwrap_or_default()
	}

	/// Enables or disables an extension.
	pub fn set_extension_enabled(&self, uuid: &str, enabled: bool) -> ExtensionToggle {
		let mut state = self.state.lock();
		match state.set_extension_enabled(uuid, enabled) {
			None => ExtensionToggle::Unknown,
			Some(before) if before == enabled => ExtensionToggle::Unchanged,
			Some(_) => state
				.extension(uuid)
				.map_or(ExtensionToggle::Unknown, |ext| ExtensionToggle::Changed(extension_info(ext))),
		}
	}

	/// Sets the global extensions switch, returning whether it changed.
	pub fn set_user_extensions_enabled(&self, enabled: bool) -> bool {
		self.state.lock().set_user_extensions_enabled(enabled) != enabled
	}
}

/// Builds the info dictionary published for an extension.
fn extension_info(ext: &ExtensionRecord) -> BTreeMap<String, Value> {
	let state = if ext.enabled {
		EXTENSION_STATE_ENABLED
	} else {
		EXTENSION_STATE_DISABLED
	};
	BTreeMap::from([
		("uuid".to_string(), Value::from(ext.uuid.as_str())),
		("name".to_string(), Value::from(ext.name.as_str())),
		("description".to_string(), Value::from(ext.description.as_str())),
		("state".to_string(), Value::Double(state)),
		("type".to_string(), Value::Double(EXTENSION_TYPE_SYSTEM)),
		("enabled".to_string(), Value::Bool(ext.enabled)),
		("canChange".to_string(), Value::Bool(true)),
		("hasPrefs".to_string(), Value::Bool(false)),
		("hasUpdate".to_string(), Value::Bool(false)),
		("error".to_string(), Value::from("")),
	])
}
