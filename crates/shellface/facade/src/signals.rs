//! Outbound notifications raised by state transitions.
//!
//! The [`SignalEmitter`] is a non-blocking queue handle. The bus pump drains
//! the paired [`SignalReceiver`] and turns each [`ShellSignal`] into a D-Bus
//! signal; a full or closed queue is logged and never fails the call that
//! caused the transition.

use std::collections::BTreeMap;

use shellface_proto::{Accelerator, GrabToken, Value};
use tokio::sync::mpsc;

/// A state transition to announce on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellSignal {
	/// `OverviewActive` changed.
	OverviewChanged(bool),
	/// The on-screen keyboard was shown or hidden.
	OskChanged(bool),
	/// A grabbed accelerator was pressed.
	AcceleratorActivated {
		/// Action id returned to the grabbing client.
		token: GrabToken,
		/// The binding that fired.
		binding: Accelerator,
		/// `device-id`, `timestamp` and `action-mode` entries.
		parameters: BTreeMap<String, Value>,
	},
	/// An extension was enabled or disabled.
	ExtensionStateChanged {
		/// Extension uuid.
		uuid: String,
		/// Extension info dictionary after the change.
		info: BTreeMap<String, Value>,
	},
	/// `UserExtensionsEnabled` changed.
	UserExtensionsEnabledChanged(bool),
}

/// Receiving half drained by the bus pump.
pub type SignalReceiver = mpsc::UnboundedReceiver<ShellSignal>;

/// Fire-and-forget sender for [`ShellSignal`]s.
#[derive(Debug, Clone)]
pub struct SignalEmitter {
	tx: mpsc::UnboundedSender<ShellSignal>,
}

impl SignalEmitter {
	/// Creates an emitter and the receiver the pump drains.
	#[must_use]
	pub fn channel() -> (Self, SignalReceiver) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}

	/// Queues a signal. Delivery failures are logged.
	pub fn emit(&self, signal: ShellSignal) {
		if let Err(err) = self.tx.send(signal) {
			tracing::warn!(signal = ?err.0, "signal pump is gone, dropping notification");
		}
	}

	/// Announces an overview visibility change.
	pub fn notify_overview_changed(&self, visible: bool) {
		self.emit(ShellSignal::OverviewChanged(visible));
	}

	/// Announces an on-screen keyboard visibility change.
	pub fn notify_osk_changed(&self, visible: bool) {
		self.emit(ShellSignal::OskChanged(visible));
	}

	/// Announces an accelerator activation.
	pub fn notify_accelerator_activated(
		&self,
		binding: Accelerator,
		token: GrabToken,
		parameters: BTreeMap<String, Value>,
	) {
		self.emit(ShellSignal::AcceleratorActivated {
			token,
			binding,
			parameters,
		});
	}

	/// Announces an extension state change.
	pub fn notify_extension_state_changed(&self, uuid: String, info: BTreeMap<String, Value>) {
		self.emit(ShellSignal::ExtensionStateChanged { uuid, info });
	}

	/// Announces a `UserExtensionsEnabled` change.
	pub fn notify_user_extensions_enabled_changed(&self, enabled: bool) {
		self.emit(ShellSignal::UserExtensionsEnabledChanged(enabled));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn emit_after_receiver_drop_does_not_panic() {
		let (emitter, rx) = SignalEmitter::channel();
		drop(rx);
		emitter.notify_overview_changed(true);
	}

	#[test]
	fn signals_arrive_in_emission_order() {
		let (emitter, mut rx) = SignalEmitter::channel();
		emitter.notify_overview_changed(true);
		emitter.notify_osk_changed(false);

		assert_eq!(rx.try_recv().ok(), Some(ShellSignal::OverviewChanged(true)));
		assert_eq!(rx.try_recv().ok(), Some(ShellSignal::OskChanged(false)));
		assert!(rx.try_recv().is_err());
	}
}
