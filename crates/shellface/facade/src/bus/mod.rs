//! D-Bus transport.
//!
//! Exports the shell, extensions and on-screen keyboard skeletons on the
//! session bus, claims their well-known names, and runs the two background
//! loops the facade needs: the signal pump and the caller watch. Skeletons only
//! decode arguments and encode replies; every decision is made by the
//! [`crate::dispatch::Dispatcher`] behind the [`ShellService`].
//!
//! Members the skeletons do not declare are answered by zbus itself with
//! `org.freedesktop.DBus.Error.UnknownMethod` or `UnknownProperty`, which is
//! how `UnsupportedMethod` appears on the wire. Every other failure carries an
//! `org.gnome.Shell.Error.<Kind>` name.
//!
//! The key-event input at `/org/shellface/Accelerators` is exported on the
//! same connection.

use shellface_proto::members::{
	ACCELERATORS_OBJECT_PATH, CARIBOU_BUS_NAME, CARIBOU_OBJECT_PATH, PROPERTIES_INTERFACE, SHELL_BUS_NAME,
	SHELL_OBJECT_PATH,
};
use shellface_proto::{CallRequest, CallerId, Reply, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use zbus::fdo::{self, RequestNameFlags, RequestNameReply};
use zbus::message::Header;
use zbus::Connection;

use crate::service::{Call, ShellService};
use crate::signals::SignalReceiver;

mod activation;
mod convert;
mod error;
mod extensions;
mod keyboard;
mod pump;
mod shell;
mod watch;

#[cfg(test)]
mod tests;

use activation::ActivationObject;
use extensions::ExtensionsObject;
use keyboard::KeyboardObject;
use shell::ShellObject;

pub use error::ShellError;

/// Caller recorded for property access, which carries no grab ownership.
const PROPERTY_CALLER: &str = "org.freedesktop.DBus.Properties";

/// Errors that stop the bus service.
#[derive(Debug, Error)]
pub enum BusError {
	/// Connection or object server failure.
	#[error("D-Bus error: {0}")]
	ZBus(#[from] zbus::Error),
	/// A well-known name is owned by another process.
	#[error("{0} is owned by another process (use --replace to take it over)")]
	NameTaken(&'static str),
}

/// Options for [`serve`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ServeOptions {
	/// Take over names owned by a running shell that allows replacement.
	pub replace: bool,
}

/// Serves the facade on the session bus until `shutdown` fires.
///
/// # Errors
///
/// Returns [`BusError`] if the session bus is unreachable, an object cannot
/// be exported, or a well-known name is taken.
pub async fn serve(
	service: ShellService,
	signals: SignalReceiver,
	options: ServeOptions,
	shutdown: CancellationToken,
) -> Result<(), BusError> {
	let conn = zbus::connection::Builder::session()?
		.serve_at(SHELL_OBJECT_PATH, ShellObject::new(service.clone()))?
		.serve_at(SHELL_OBJECT_PATH, ExtensionsObject::new(service.clone()))?
		.serve_at(CARIBOU_OBJECT_PATH, KeyboardObject::new(service.clone()))?
		.serve_at(ACCELERATORS_OBJECT_PATH, ActivationObject::new(service.facade().clone()))?
		.build()
		.await?;

	request_name(&conn, SHELL_BUS_NAME, options.replace).await?;
	request_name(&conn, CARIBOU_BUS_NAME, options.replace).await?;
	tracing::info!(
		unique_name = ?conn.unique_name(),
		"serving {SHELL_BUS_NAME} and {CARIBOU_BUS_NAME}"
	);

	let pump = tokio::spawn(pump::run(conn.clone(), signals, shutdown.clone()));
	let watched = watch::run(conn.clone(), service.facade().clone(), shutdown.clone()).await;
	if watched.is_err() {
		// Without the watch, grabs of departed callers would leak.
		shutdown.cancel();
	}
	if let Err(e) = pump.await {
		tracing::error!(error = %e, "signal pump panicked");
	}
	watched?;

	tracing::info!("bus service shutting down");
	Ok(())
}

async fn request_name(conn: &Connection, name: &'static str, replace: bool) -> Result<(), BusError> {
	let mut flags = RequestNameFlags::AllowReplacement | RequestNameFlags::DoNotQueue;
	if replace {
		flags |= RequestNameFlags::ReplaceExisting;
	}
	match conn.request_name_with_flags(name, flags).await? {
		RequestNameReply::PrimaryOwner | RequestNameReply::AlreadyOwner => {
			tracing::debug!(name, "acquired bus name");
			Ok(())
		}
		RequestNameReply::InQueue | RequestNameReply::Exists => Err(BusError::NameTaken(name)),
	}
}

/// Identity of the sender of a method call.
fn caller_of(header: &Header<'_>) -> CallerId {
	header
		.sender()
		.map_or_else(|| CallerId::new(""), |sender| CallerId::new(sender.as_str()))
}

/// Runs one decoded method call through the service.
fn dispatch(
	service: &ShellService,
	caller: CallerId,
	interface: &str,
	method: &'static str,
	args: Vec<Value>,
) -> Result<Reply, ShellError> {
	let request = CallRequest::new(interface, method, args);
	Ok(service.dispatch(Call::new(caller, request))?)
}

/// Reads a property through the dispatcher.
fn get_property<T>(
	service: &ShellService,
	interface: &str,
	property: &str,
	extract: impl FnOnce(Value) -> Option<T>,
) -> fdo::Result<T> {
	let request = CallRequest::new(
		PROPERTIES_INTERFACE,
		"Get",
		vec![Value::from(interface), Value::from(property)],
	);
	let reply = service
		.dispatch(Call::new(CallerId::new(PROPERTY_CALLER), request))
		.map_err(error::property_error)?;
	reply
		.0
		.into_iter()
		.next()
		.and_then(extract)
		.ok_or_else(|| fdo::Error::Failed(format!("{interface}.{property} has an unexpected type")))
}

/// Writes a property through the dispatcher, which queues any change signal.
fn set_property(service: &ShellService, interface: &str, property: &str, value: Value) -> fdo::Result<()> {
	let request = CallRequest::new(
		PROPERTIES_INTERFACE,
		"Set",
		vec![Value::from(interface), Value::from(property), value],
	);
	service
		.dispatch(Call::new(CallerId::new(PROPERTY_CALLER), request))
		.map(drop)
		.map_err(error::property_error)
}
