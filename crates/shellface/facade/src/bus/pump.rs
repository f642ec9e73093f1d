//! Drains the facade signal queue onto the bus.

use std::collections::HashMap;

use shellface_proto::members::{EXTENSIONS_INTERFACE, PROPERTIES_INTERFACE, SHELL_INTERFACE, SHELL_OBJECT_PATH};
use tokio_util::sync::CancellationToken;
use zbus::Connection;
use zbus::object_server::SignalEmitter;
use zbus::zvariant::Value as ZValue;

use super::convert;
use super::extensions::ExtensionsObject;
use super::shell::ShellObject;
use crate::signals::{ShellSignal, SignalReceiver};

/// Emits queued signals until `shutdown` fires or every sender is gone.
pub(crate) async fn run(conn: Connection, mut signals: SignalReceiver, shutdown: CancellationToken) {
	loop {
		let signal = tokio::select! {
			_ = shutdown.cancelled() => break,
			next = signals.recv() => match next {
				Some(signal) => signal,
				None => break,
			},
		};
		if let Err(e) = deliver(&conn, signal).await {
			tracing::warn!(error = %e, "failed to emit signal");
		}
	}
	tracing::debug!("signal pump stopped");
}

async fn deliver(conn: &Connection, signal: ShellSignal) -> zbus::Result<()> {
	match signal {
		ShellSignal::OverviewChanged(active) => {
			properties_changed(conn, SHELL_INTERFACE, "OverviewActive", ZValue::Bool(active)).await
		}
		ShellSignal::UserExtensionsEnabledChanged(enabled) => {
			properties_changed(conn, EXTENSIONS_INTERFACE, "UserExtensionsEnabled", ZValue::Bool(enabled)).await
		}
		ShellSignal::AcceleratorActivated {
			token,
			binding,
			parameters,
		} => {
			tracing::debug!(%binding, token = token.0, "accelerator activated");
			let emitter = SignalEmitter::new(conn, SHELL_OBJECT_PATH)?;
			ShellObject::accelerator_activated(&emitter, token.0, convert::dict_to_bus(&parameters)).await
		}
		ShellSignal::ExtensionStateChanged { uuid, info } => {
			let emitter = SignalEmitter::new(conn, SHELL_OBJECT_PATH)?;
			ExtensionsObject::extension_state_changed(&emitter, &uuid, convert::dict_to_bus(&info)).await
		}
		ShellSignal::OskChanged(visible) => {
			// Caribou has no visibility signal.
			tracing::debug!(visible, "on-screen keyboard visibility changed");
			Ok(())
		}
	}
}

/// Emits `PropertiesChanged` for one property of an object at `/org/gnome/Shell`.
async fn properties_changed(
	conn: &Connection,
	interface: &str,
	property: &str,
	value: ZValue<'_>,
) -> zbus::Result<()> {
	let changed = HashMap::from([(property, value)]);
	let invalidated: Vec<&str> = Vec::new();
	conn.emit_signal(
		None::<&str>,
		SHELL_OBJECT_PATH,
		PROPERTIES_INTERFACE,
		"PropertiesChanged",
		&(interface, changed, invalidated),
	)
	.await
}
