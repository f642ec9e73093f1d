//! Bus error names.

use shellface_proto::{CallError, ErrorKind};
use zbus::fdo;

/// Errors returned to bus callers as `org.gnome.Shell.Error.<Kind>`.
#[derive(Debug, zbus::DBusError)]
#[zbus(prefix = "org.gnome.Shell.Error")]
pub enum ShellError {
	/// Transport-level failure.
	#[zbus(error)]
	ZBus(zbus::Error),
	/// Unknown interface, member or property.
	UnsupportedMethod(String),
	/// Wrong argument count, type or content.
	InvalidArgument(String),
	/// Member without an equivalent on this shell.
	NotImplemented(String),
	/// An adapter could not perform the effect.
	SubsystemUnavailable(String),
	/// The accelerator is held by another grab.
	AlreadyGrabbed(String),
}

impl From<CallError> for ShellError {
	fn from(err: CallError) -> Self {
		let CallError { kind, message } = err;
		match kind {
			ErrorKind::UnsupportedMethod => Self::UnsupportedMethod(message),
			ErrorKind::InvalidArgument => Self::InvalidArgument(message),
			ErrorKind::NotImplemented => Self::NotImplemented(message),
			ErrorKind::SubsystemUnavailable => Self::SubsystemUnavailable(message),
			ErrorKind::AlreadyGrabbed => Self::AlreadyGrabbed(message),
		}
	}
}

/// Maps a property failure onto the standard properties errors.
pub(crate) fn property_error(err: CallError) -> fdo::Error {
	match err.kind {
		ErrorKind::UnsupportedMethod => fdo::Error::UnknownProperty(err.message),
		ErrorKind::InvalidArgument => fdo::Error::InvalidArgs(err.message),
		_ => fdo::Error::Failed(err.to_string()),
	}
}
